use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use thiserror::Error;

use super::cell::{CellKind, ToolData};

/// Errors raised by ledger accessors.
#[derive(Debug, Error, PartialEq)]
pub enum LedgerError {
    #[error("no grading entry for notebook '{notebook}'{}", cell_suffix(.cell_id))]
    KeyNotFound {
        notebook: String,
        cell_id: Option<String>,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

fn cell_suffix(cell_id: &Option<String>) -> String {
    match cell_id {
        Some(id) => format!(", cell '{}'", id),
        None => String::new(),
    }
}

/// Caller-side score validation failures.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("score {score} is outside the range 0..={max}")]
    ScoreOutOfRange { score: f64, max: f64 },

    #[error("extra credit must not be negative (got {0})")]
    NegativeExtraCredit(f64),

    #[error("score must be a finite number")]
    NotFinite,
}

/// Check a manual score against a cell's point budget.
pub fn validate_manual_score(score: f64, points: f64) -> Result<(), ValidationError> {
    if !score.is_finite() {
        return Err(ValidationError::NotFinite);
    }
    if score < 0.0 || score > points {
        return Err(ValidationError::ScoreOutOfRange { score, max: points });
    }
    Ok(())
}

pub fn validate_extra_credit(extra_credit: f64) -> Result<(), ValidationError> {
    if !extra_credit.is_finite() {
        return Err(ValidationError::NotFinite);
    }
    if extra_credit < 0.0 {
        return Err(ValidationError::NegativeExtraCredit(extra_credit));
    }
    Ok(())
}

/// Serde adapter that keeps "absent" and `null` apart.
///
/// Used with `#[serde(default, skip_serializing_if = "Option::is_none")]`:
/// a missing key is `None`, an explicit `null` is `Some(None)`.
mod nullable {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S, T>(value: &Option<Option<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

/// One entry of a notebook's `grades_dict`, as sent by the grading service.
///
/// Keys this crate does not interpret (`max_score`, `failed_tests`, ...) are
/// kept in `extra` and written back untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GradeEntry {
    #[serde(default, skip_serializing_if = "Option::is_none", with = "nullable")]
    pub manual_score: Option<Option<Number>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "nullable")]
    pub auto_score: Option<Option<Number>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "nullable")]
    pub extra_credit: Option<Option<Number>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "nullable")]
    pub needs_manual_grade: Option<Option<bool>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One entry of a notebook's `comments_dict`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommentEntry {
    #[serde(default, skip_serializing_if = "Option::is_none", with = "nullable")]
    pub manual_comment: Option<Option<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Grading data for one notebook.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotebookGrades {
    pub grades_dict: BTreeMap<String, GradeEntry>,
    pub comments_dict: BTreeMap<String, CommentEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Flattened view of a single cell's grading state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeRecord {
    pub cell_id: String,
    pub manual_score: Option<f64>,
    pub auto_score: Option<f64>,
    pub extra_credit: f64,
    pub comment: String,
    pub needs_manual_grade: bool,
}

/// Per-submission grading ledger: notebook name → cell id → grading state.
///
/// The ledger is the parsed form of the grading service's properties payload
/// and serializes back to the same shape. Accessors fail with
/// [`LedgerError::KeyNotFound`] for notebooks or cells that have no entry;
/// use [`GradeLedger::ensure_entry`] before touching a newly visible cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GradeLedger {
    notebooks: BTreeMap<String, NotebookGrades>,
}

impl GradeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a properties payload. Fails if the nested shape does not match.
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Serialize back into a properties payload.
    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    pub fn notebooks(&self) -> impl Iterator<Item = &str> {
        self.notebooks.keys().map(String::as_str)
    }

    pub fn notebook(&self, notebook: &str) -> Result<&NotebookGrades, LedgerError> {
        self.notebooks
            .get(notebook)
            .ok_or_else(|| missing(notebook, None))
    }

    pub fn cell_ids(&self, notebook: &str) -> Result<Vec<&str>, LedgerError> {
        Ok(self
            .notebook(notebook)?
            .grades_dict
            .keys()
            .map(String::as_str)
            .collect())
    }

    pub fn contains(&self, notebook: &str, cell_id: &str) -> bool {
        self.notebooks
            .get(notebook)
            .is_some_and(|nb| nb.grades_dict.contains_key(cell_id))
    }

    fn grade(&self, notebook: &str, cell_id: &str) -> Result<&GradeEntry, LedgerError> {
        self.notebook(notebook)?
            .grades_dict
            .get(cell_id)
            .ok_or_else(|| missing(notebook, Some(cell_id)))
    }

    fn grade_mut(&mut self, notebook: &str, cell_id: &str) -> Result<&mut GradeEntry, LedgerError> {
        self.notebooks
            .get_mut(notebook)
            .ok_or_else(|| missing(notebook, None))?
            .grades_dict
            .get_mut(cell_id)
            .ok_or_else(|| missing(notebook, Some(cell_id)))
    }

    fn comment(&self, notebook: &str, cell_id: &str) -> Result<&CommentEntry, LedgerError> {
        self.notebook(notebook)?
            .comments_dict
            .get(cell_id)
            .ok_or_else(|| missing(notebook, Some(cell_id)))
    }

    fn comment_mut(
        &mut self,
        notebook: &str,
        cell_id: &str,
    ) -> Result<&mut CommentEntry, LedgerError> {
        self.notebooks
            .get_mut(notebook)
            .ok_or_else(|| missing(notebook, None))?
            .comments_dict
            .get_mut(cell_id)
            .ok_or_else(|| missing(notebook, Some(cell_id)))
    }

    // ============================================================
    // Scores
    // ============================================================

    pub fn get_manual_score(&self, notebook: &str, cell_id: &str) -> Result<Option<f64>, LedgerError> {
        Ok(number(&self.grade(notebook, cell_id)?.manual_score))
    }

    /// Store a manual score as given. The point budget is not checked here;
    /// see [`GradeLedger::set_manual_score_checked`].
    pub fn set_manual_score(
        &mut self,
        notebook: &str,
        cell_id: &str,
        score: f64,
    ) -> Result<(), LedgerError> {
        let value = Number::from_f64(score).ok_or(ValidationError::NotFinite)?;
        self.grade_mut(notebook, cell_id)?.manual_score = Some(Some(value));
        Ok(())
    }

    /// Store a manual score after checking it against the cell's point budget.
    pub fn set_manual_score_checked(
        &mut self,
        notebook: &str,
        cell_id: &str,
        score: f64,
        points: f64,
    ) -> Result<(), LedgerError> {
        validate_manual_score(score, points)?;
        self.set_manual_score(notebook, cell_id, score)
    }

    pub fn get_auto_score(&self, notebook: &str, cell_id: &str) -> Result<Option<f64>, LedgerError> {
        Ok(number(&self.grade(notebook, cell_id)?.auto_score))
    }

    /// Extra credit; absent or `null` reads as zero.
    pub fn get_extra_credit(&self, notebook: &str, cell_id: &str) -> Result<f64, LedgerError> {
        Ok(number(&self.grade(notebook, cell_id)?.extra_credit).unwrap_or(0.0))
    }

    pub fn set_extra_credit(
        &mut self,
        notebook: &str,
        cell_id: &str,
        extra_credit: f64,
    ) -> Result<(), LedgerError> {
        let value = Number::from_f64(extra_credit).ok_or(ValidationError::NotFinite)?;
        self.grade_mut(notebook, cell_id)?.extra_credit = Some(Some(value));
        Ok(())
    }

    pub fn set_extra_credit_checked(
        &mut self,
        notebook: &str,
        cell_id: &str,
        extra_credit: f64,
    ) -> Result<(), LedgerError> {
        validate_extra_credit(extra_credit)?;
        self.set_extra_credit(notebook, cell_id, extra_credit)
    }

    pub fn get_needs_manual_grade(&self, notebook: &str, cell_id: &str) -> Result<bool, LedgerError> {
        Ok(self
            .grade(notebook, cell_id)?
            .needs_manual_grade
            .flatten()
            .unwrap_or(false))
    }

    pub fn set_needs_manual_grade(
        &mut self,
        notebook: &str,
        cell_id: &str,
        needs_manual_grade: bool,
    ) -> Result<(), LedgerError> {
        self.grade_mut(notebook, cell_id)?.needs_manual_grade = Some(Some(needs_manual_grade));
        Ok(())
    }

    /// Point budget recorded by the grading service, if any.
    pub fn max_score(&self, notebook: &str, cell_id: &str) -> Result<Option<f64>, LedgerError> {
        Ok(self
            .grade(notebook, cell_id)?
            .extra
            .get("max_score")
            .and_then(Value::as_f64))
    }

    // ============================================================
    // Comments
    // ============================================================

    /// Manual comment; absent or `null` reads as empty.
    pub fn get_comment(&self, notebook: &str, cell_id: &str) -> Result<String, LedgerError> {
        Ok(self
            .comment(notebook, cell_id)?
            .manual_comment
            .clone()
            .flatten()
            .unwrap_or_default())
    }

    pub fn set_comment(
        &mut self,
        notebook: &str,
        cell_id: &str,
        comment: impl Into<String>,
    ) -> Result<(), LedgerError> {
        self.comment_mut(notebook, cell_id)?.manual_comment = Some(Some(comment.into()));
        Ok(())
    }

    // ============================================================
    // Entries
    // ============================================================

    /// Create a zero-valued entry for a cell if it has none yet.
    ///
    /// Existing values are left untouched. Returns `true` if a grade entry
    /// was created.
    pub fn ensure_entry(&mut self, notebook: &str, cell_id: &str, tool: &ToolData) -> bool {
        let grades = self.notebooks.entry(notebook.to_string()).or_default();

        grades
            .comments_dict
            .entry(cell_id.to_string())
            .or_insert_with(|| CommentEntry {
                manual_comment: Some(None),
                extra: Map::new(),
            });

        if grades.grades_dict.contains_key(cell_id) {
            return false;
        }

        let mut extra = Map::new();
        if let Some(points) = tool.points.and_then(Number::from_f64) {
            extra.insert("max_score".to_string(), Value::Number(points));
        }
        grades.grades_dict.insert(
            cell_id.to_string(),
            GradeEntry {
                manual_score: Some(None),
                auto_score: Some(None),
                extra_credit: Some(Some(Number::from(0u8))),
                needs_manual_grade: Some(Some(matches!(
                    tool.kind,
                    CellKind::Manual | CellKind::Task
                ))),
                extra,
            },
        );
        true
    }

    pub fn record(&self, notebook: &str, cell_id: &str) -> Result<GradeRecord, LedgerError> {
        let grade = self.grade(notebook, cell_id)?;
        let comment = self
            .notebook(notebook)?
            .comments_dict
            .get(cell_id)
            .and_then(|c| c.manual_comment.clone().flatten())
            .unwrap_or_default();

        Ok(GradeRecord {
            cell_id: cell_id.to_string(),
            manual_score: number(&grade.manual_score),
            auto_score: number(&grade.auto_score),
            extra_credit: number(&grade.extra_credit).unwrap_or(0.0),
            comment,
            needs_manual_grade: grade.needs_manual_grade.flatten().unwrap_or(false),
        })
    }

    // ============================================================
    // Score summaries
    // ============================================================

    /// Effective score of a cell: the manual score if set, otherwise the
    /// auto score, plus extra credit.
    pub fn cell_score(&self, notebook: &str, cell_id: &str) -> Result<f64, LedgerError> {
        let record = self.record(notebook, cell_id)?;
        let base = record.manual_score.or(record.auto_score).unwrap_or(0.0);
        Ok(base + record.extra_credit)
    }

    // Folds start from +0.0: an empty f64 `sum()` yields -0.0.
    pub fn notebook_score(&self, notebook: &str) -> Result<f64, LedgerError> {
        self.notebook(notebook)?
            .grades_dict
            .keys()
            .try_fold(0.0, |total, cell_id| {
                Ok(total + self.cell_score(notebook, cell_id)?)
            })
    }

    pub fn total_score(&self) -> f64 {
        self.notebooks
            .keys()
            .filter_map(|nb| self.notebook_score(nb).ok())
            .fold(0.0, |total, score| total + score)
    }
}

fn missing(notebook: &str, cell_id: Option<&str>) -> LedgerError {
    LedgerError::KeyNotFound {
        notebook: notebook.to_string(),
        cell_id: cell_id.map(str::to_string),
    }
}

fn number(value: &Option<Option<Number>>) -> Option<f64> {
    value.as_ref()?.as_ref()?.as_f64()
}
