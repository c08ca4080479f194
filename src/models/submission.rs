use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A student's submission as stored by the grading service.
///
/// Only `manual_status` is interpreted here. Every other field is carried in
/// `extra` so the record can be written back without dropping data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: u64,
    pub manual_status: ManualStatus,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Manual grading status of a submission.
///
/// - `NotGraded`: no manual grading saved yet
/// - `ManuallyGraded`: a grader saved the ledger
/// - `BeingEdited`: the submission is being edited by an instructor
/// - `GradingFailed`: manual grading could not be applied
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ManualStatus {
    NotGraded,
    ManuallyGraded,
    BeingEdited,
    GradingFailed,
}

impl ManualStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotGraded => "not_graded",
            Self::ManuallyGraded => "manually_graded",
            Self::BeingEdited => "being_edited",
            Self::GradingFailed => "grading_failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "not_graded" => Some(Self::NotGraded),
            "manually_graded" => Some(Self::ManuallyGraded),
            "being_edited" => Some(Self::BeingEdited),
            "grading_failed" => Some(Self::GradingFailed),
            _ => None,
        }
    }
}

/// Identifies one submission of one assignment in one lecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubmissionKey {
    pub lecture_id: u64,
    pub assignment_id: u64,
    pub submission_id: u64,
}

impl SubmissionKey {
    pub fn new(lecture_id: u64, assignment_id: u64, submission_id: u64) -> Self {
        Self {
            lecture_id,
            assignment_id,
            submission_id,
        }
    }

    /// Path of the submission record relative to the service base URL.
    pub fn submission_path(&self) -> String {
        format!(
            "/lectures/{}/assignments/{}/submissions/{}",
            self.lecture_id, self.assignment_id, self.submission_id
        )
    }

    /// Path of the grading properties relative to the service base URL.
    pub fn properties_path(&self) -> String {
        format!("{}/properties", self.submission_path())
    }
}

impl std::fmt::Display for SubmissionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.lecture_id, self.assignment_id, self.submission_id
        )
    }
}
