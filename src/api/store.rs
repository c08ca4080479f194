use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{Submission, SubmissionKey};

/// One submission and its grading properties, as held by the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSubmission {
    pub lecture_id: u64,
    pub assignment_id: u64,
    pub submission: Submission,
    pub properties: Value,
}

impl StoredSubmission {
    pub fn key(&self) -> SubmissionKey {
        SubmissionKey::new(self.lecture_id, self.assignment_id, self.submission.id)
    }
}

/// In-memory submission store shared by the service's handlers.
#[derive(Debug, Clone, Default)]
pub struct GradingStore {
    entries: Arc<Mutex<HashMap<SubmissionKey, StoredSubmission>>>,
}

impl GradingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a JSON array of [`StoredSubmission`] records.
    pub fn from_seed(json: &str) -> serde_json::Result<Self> {
        let entries: Vec<StoredSubmission> = serde_json::from_str(json)?;
        let store = Self::new();
        for entry in entries {
            store.insert(entry);
        }
        Ok(store)
    }

    pub fn insert(&self, entry: StoredSubmission) {
        let mut entries = self.entries.lock().expect("store lock poisoned");
        entries.insert(entry.key(), entry);
    }

    pub fn get(&self, key: &SubmissionKey) -> Option<StoredSubmission> {
        let entries = self.entries.lock().expect("store lock poisoned");
        entries.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace the properties of an existing submission.
    /// Returns `false` if the submission is unknown.
    pub fn set_properties(&self, key: &SubmissionKey, properties: Value) -> bool {
        let mut entries = self.entries.lock().expect("store lock poisoned");
        match entries.get_mut(key) {
            Some(entry) => {
                entry.properties = properties;
                true
            }
            None => false,
        }
    }

    /// Replace an existing submission record.
    /// Returns `false` if the submission is unknown.
    pub fn set_submission(&self, key: &SubmissionKey, submission: Submission) -> bool {
        let mut entries = self.entries.lock().expect("store lock poisoned");
        match entries.get_mut(key) {
            Some(entry) => {
                entry.submission = submission;
                true
            }
            None => false,
        }
    }
}
