use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::models::Submission;

/// In-memory submission store, the single source of truth for pending
/// submissions.
///
/// Empty at startup and gone at shutdown; surviving a restart is a non-goal.
/// `remove` is the linearization point for racing decisions: of two
/// concurrent calls for one id, exactly one gets the submission.
#[derive(Default)]
pub struct SubmissionStore {
    inner: Mutex<HashMap<String, Submission>>,
}

impl SubmissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, submission: Submission) {
        self.inner
            .lock()
            .await
            .insert(submission.id.clone(), submission);
    }

    pub async fn get(&self, id: &str) -> Option<Submission> {
        self.inner.lock().await.get(id).cloned()
    }

    pub async fn remove(&self, id: &str) -> Option<Submission> {
        self.inner.lock().await.remove(id)
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}
