//! Plain-text rendering of a grade ledger.

use crate::models::{GradeLedger, GradeRecord};

const NEEDS_GRADING: char = '!';
const GRADED: char = '✓';

fn status_symbol(record: &GradeRecord) -> char {
    if record.needs_manual_grade && record.manual_score.is_none() {
        NEEDS_GRADING
    } else {
        GRADED
    }
}

fn score(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{}", v),
        None => "-".to_string(),
    }
}

/// Render every notebook and cell of a ledger with its scores.
///
/// Example output:
/// ```text
/// hw1 (7.5)
/// ├── ✓ cell-abc123  manual 6  auto -  extra 1.5
/// └── ! tests-2  manual -  auto -  extra 0
/// total 7.5
/// ```
pub fn render_summary(ledger: &GradeLedger) -> String {
    let mut output = String::new();

    for notebook in ledger.notebooks() {
        let notebook_score = ledger.notebook_score(notebook).unwrap_or(0.0);
        output.push_str(&format!("{} ({})\n", notebook, notebook_score));

        let cell_ids = ledger.cell_ids(notebook).unwrap_or_default();
        for (i, cell_id) in cell_ids.iter().enumerate() {
            let Ok(record) = ledger.record(notebook, cell_id) else {
                continue;
            };
            let branch = if i == cell_ids.len() - 1 {
                "└── "
            } else {
                "├── "
            };
            output.push_str(&format!(
                "{}{} {}  manual {}  auto {}  extra {}\n",
                branch,
                status_symbol(&record),
                record.cell_id,
                score(record.manual_score),
                score(record.auto_score),
                record.extra_credit,
            ));
            if !record.comment.is_empty() {
                let continuation = if i == cell_ids.len() - 1 {
                    "    "
                } else {
                    "│   "
                };
                output.push_str(&format!("{}» {}\n", continuation, record.comment));
            }
        }
    }

    output.push_str(&format!("total {}\n", ledger.total_score()));
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_ledger() {
        assert_eq!(render_summary(&GradeLedger::new()), "total 0\n");
    }

    #[test]
    fn test_notebook_without_cells() {
        let ledger = GradeLedger::from_value(json!({
            "hw0": { "grades_dict": {}, "comments_dict": {} }
        }))
        .unwrap();
        assert_eq!(render_summary(&ledger), "hw0 (0)\ntotal 0\n");
    }

    #[test]
    fn test_notebook_with_cells() {
        let mut ledger = GradeLedger::from_value(json!({
            "hw1": {
                "grades_dict": {
                    "cell-abc123": {
                        "manual_score": 6, "auto_score": null,
                        "extra_credit": 1.5, "needs_manual_grade": true
                    },
                    "tests-2": {
                        "manual_score": null, "auto_score": null,
                        "extra_credit": 0, "needs_manual_grade": true
                    }
                },
                "comments_dict": {
                    "cell-abc123": { "manual_comment": null }
                }
            }
        }))
        .unwrap();
        ledger.set_comment("hw1", "cell-abc123", "Nice work").unwrap();

        let expected = "hw1 (7.5)\n\
            ├── ✓ cell-abc123  manual 6  auto -  extra 1.5\n\
            │   » Nice work\n\
            └── ! tests-2  manual -  auto -  extra 0\n\
            total 7.5\n";
        assert_eq!(render_summary(&ledger), expected);
    }
}
