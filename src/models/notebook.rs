use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::cell::{classify, CellAnnotation, CellContentKind, ToolData};

/// The subset of an nbformat v4 document needed for grading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notebook {
    pub cells: Vec<Cell>,
    #[serde(default)]
    pub metadata: Value,
}

/// A single notebook cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    /// Cell id (nbformat 4.5+). Older notebooks omit it.
    #[serde(default)]
    pub id: Option<String>,
    pub cell_type: CellContentKind,
    #[serde(default)]
    pub metadata: Value,
    #[serde(default)]
    pub source: Source,
}

/// Cell source, stored either as one string or as a list of lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Source {
    Text(String),
    Lines(Vec<String>),
}

impl Default for Source {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl Source {
    pub fn text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Lines(lines) => lines.concat(),
        }
    }
}

impl Cell {
    pub fn annotation(&self) -> Option<CellAnnotation> {
        CellAnnotation::from_metadata(&self.metadata)
    }

    pub fn tool_data(&self) -> ToolData {
        classify(self.annotation().as_ref(), self.cell_type)
    }
}

impl Notebook {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Classify every cell, in document order.
    pub fn classify_cells(&self) -> Vec<ToolData> {
        self.cells.iter().map(Cell::tool_data).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CellKind;

    const NOTEBOOK: &str = r##"{
        "cells": [
            {"cell_type": "markdown", "metadata": {}, "source": "# Homework 1"},
            {"cell_type": "code", "id": "a1", "metadata": {"nbgrader": {
                "grade_id": "answer-1", "grade": false, "solution": true,
                "locked": false, "task": false, "points": null, "schema_version": 3
            }}, "source": ["def f(x):\n", "    return x\n"]},
            {"cell_type": "code", "metadata": {"nbgrader": {
                "grade_id": "tests-1", "grade": true, "solution": true,
                "locked": true, "points": 3, "schema_version": 3
            }}, "source": "assert f(1) == 1"},
            {"cell_type": "raw", "metadata": {"nbgrader": {"grade_id": "r", "locked": true}}}
        ],
        "metadata": {"kernelspec": {"name": "python3"}},
        "nbformat": 4,
        "nbformat_minor": 5
    }"##;

    #[test]
    fn test_classify_cells_in_order() {
        let notebook = Notebook::from_json(NOTEBOOK).unwrap();
        let kinds: Vec<CellKind> = notebook.classify_cells().iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                CellKind::Unclassified,
                CellKind::Solution,
                CellKind::Tests,
                CellKind::Readonly,
            ]
        );
    }

    #[test]
    fn test_source_lines_are_joined() {
        let notebook = Notebook::from_json(NOTEBOOK).unwrap();
        assert_eq!(notebook.cells[0].source.text(), "# Homework 1");
        assert_eq!(notebook.cells[1].source.text(), "def f(x):\n    return x\n");
        assert_eq!(notebook.cells[1].id.as_deref(), Some("a1"));
        assert_eq!(notebook.cells[3].cell_type, CellContentKind::Raw);
    }
}
