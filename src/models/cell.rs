use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Metadata key under which grading annotations live on a notebook cell.
pub const ANNOTATION_KEY: &str = "nbgrader";

/// Annotation schema version written by [`CellAnnotation::for_tool_data`].
pub const SCHEMA_VERSION: u32 = 3;

/// Grading annotation attached to a single notebook cell.
///
/// This is foreign data owned by the notebook. Parsing is lenient: a field
/// that is missing or has the wrong JSON type is treated as "not set", so
/// read it with [`CellAnnotation::from_metadata`] rather than serde.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CellAnnotation {
    pub grade_id: Option<String>,
    pub grade: bool,
    pub solution: bool,
    pub locked: bool,
    pub task: bool,
    pub points: Option<f64>,
    pub schema_version: u32,
}

impl CellAnnotation {
    /// Read the annotation from a cell's metadata object.
    ///
    /// Returns `None` when the metadata has no annotation object at all.
    pub fn from_metadata(metadata: &Value) -> Option<Self> {
        let data = metadata.get(ANNOTATION_KEY)?.as_object()?;
        Some(Self::from_object(data))
    }

    fn from_object(data: &Map<String, Value>) -> Self {
        let flag = |key: &str| data.get(key).and_then(Value::as_bool).unwrap_or(false);

        Self {
            grade_id: data
                .get("grade_id")
                .and_then(Value::as_str)
                .filter(|id| !id.is_empty())
                .map(str::to_string),
            grade: flag("grade"),
            solution: flag("solution"),
            locked: flag("locked"),
            task: flag("task"),
            points: data.get("points").and_then(Value::as_f64),
            schema_version: data
                .get("schema_version")
                .and_then(Value::as_u64)
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(0),
        }
    }

    /// Build the annotation that assignment authoring writes for a role.
    ///
    /// For code cells `classify(Some(&CellAnnotation::for_tool_data(t)), Code)`
    /// yields `t` back.
    pub fn for_tool_data(tool: &ToolData) -> Option<Self> {
        let (grade, solution, task, locked) = match tool.kind {
            CellKind::Unclassified => return None,
            CellKind::Tests => (true, true, false, false),
            CellKind::Manual => (true, false, false, false),
            CellKind::Task => (true, false, true, false),
            CellKind::Solution => (false, true, false, false),
            CellKind::Readonly => (false, false, false, true),
        };

        Some(Self {
            grade_id: tool.id.clone(),
            grade,
            solution,
            locked: locked || tool.locked,
            task,
            points: tool.points,
            schema_version: SCHEMA_VERSION,
        })
    }

    /// Serialize into the JSON object stored under [`ANNOTATION_KEY`].
    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "grade_id": self.grade_id,
            "grade": self.grade,
            "solution": self.solution,
            "locked": self.locked,
            "task": self.task,
            "points": self.points,
            "schema_version": self.schema_version,
        })
    }
}

/// Content kind of a notebook cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellContentKind {
    Code,
    Markdown,
    /// Raw cells are classified like markdown.
    #[serde(other)]
    Raw,
}

/// Grading role of a cell.
///
/// - `Unclassified`: not part of grading
/// - `Manual`: answer cell graded by hand
/// - `Task`: free-form task graded by hand
/// - `Solution`: student answer checked by autograder tests
/// - `Tests`: autograder tests
/// - `Readonly`: locked cell with no grading role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    Unclassified,
    Manual,
    Task,
    Solution,
    Tests,
    Readonly,
}

impl CellKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unclassified => "unclassified",
            Self::Manual => "manual",
            Self::Task => "task",
            Self::Solution => "solution",
            Self::Tests => "tests",
            Self::Readonly => "readonly",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "unclassified" => Some(Self::Unclassified),
            "manual" => Some(Self::Manual),
            "task" => Some(Self::Task),
            "solution" => Some(Self::Solution),
            "tests" => Some(Self::Tests),
            "readonly" => Some(Self::Readonly),
            _ => None,
        }
    }

    /// Whether cells of this kind carry a point budget.
    pub fn has_points(&self) -> bool {
        matches!(self, Self::Manual | Self::Task | Self::Tests)
    }

    /// Whether cells of this kind get a grading widget.
    pub fn is_gradable(&self) -> bool {
        !matches!(self, Self::Unclassified | Self::Readonly)
    }
}

/// Derived grading role, identity and point budget of a cell. Never persisted.
///
/// `id` is set exactly when `kind` is not `Unclassified`; `points` is set
/// only for `Manual`, `Task` and `Tests`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolData {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: CellKind,
    pub points: Option<f64>,
    pub locked: bool,
}

impl ToolData {
    pub fn unclassified() -> Self {
        Self {
            id: None,
            kind: CellKind::Unclassified,
            points: None,
            locked: false,
        }
    }
}

/// Derive a cell's grading role from its annotation and content kind.
///
/// A cell whose flags mark a role but which has no `grade_id` cannot be
/// matched to a ledger entry and is reported as unclassified.
pub fn classify(annotation: Option<&CellAnnotation>, content: CellContentKind) -> ToolData {
    let Some(data) = annotation else {
        return ToolData::unclassified();
    };

    let is_code = content == CellContentKind::Code;
    let kind = if data.grade && data.solution {
        if is_code {
            CellKind::Tests
        } else {
            CellKind::Manual
        }
    } else if data.task {
        CellKind::Task
    } else if data.grade {
        CellKind::Manual
    } else if data.solution {
        CellKind::Solution
    } else if data.locked {
        CellKind::Readonly
    } else {
        CellKind::Unclassified
    };

    let id = match (kind, &data.grade_id) {
        (CellKind::Unclassified, _) | (_, None) => return ToolData::unclassified(),
        (_, Some(id)) => id.clone(),
    };

    let points = kind
        .has_points()
        .then(|| data.points.filter(|p| p.is_finite()).unwrap_or(0.0).max(0.0));

    ToolData {
        id: Some(id),
        kind,
        points,
        locked: data.locked,
    }
}
