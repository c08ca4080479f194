use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A user's role within one lecture.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Tutor,
    Instructor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Tutor => "tutor",
            Self::Instructor => "instructor",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "student" => Some(Self::Student),
            "tutor" => Some(Self::Tutor),
            "instructor" => Some(Self::Instructor),
            _ => None,
        }
    }
}

/// Who is acting, and with which role in each lecture.
///
/// Passed explicitly to everything that needs permission checks instead of
/// being looked up from process-wide state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionContext {
    pub username: String,
    #[serde(default)]
    pub roles: HashMap<u64, Role>,
}

impl SessionContext {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            roles: HashMap::new(),
        }
    }

    pub fn with_role(mut self, lecture_id: u64, role: Role) -> Self {
        self.roles.insert(lecture_id, role);
        self
    }

    pub fn role(&self, lecture_id: u64) -> Option<Role> {
        self.roles.get(&lecture_id).copied()
    }

    /// Tutors and instructors may grade; students may not.
    pub fn can_grade(&self, lecture_id: u64) -> bool {
        matches!(
            self.role(lecture_id),
            Some(Role::Tutor | Role::Instructor)
        )
    }
}
