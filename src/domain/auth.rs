use serde::{Deserialize, Serialize};

/// The authenticated identity of the current visitor.
///
/// Created on login and destroyed on logout by the application shell.
/// Workflow operations read it but never mutate it.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub token: String,
    pub subject_id: String,
}

impl AuthSession {
    pub fn new(token: impl Into<String>, subject_id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            subject_id: subject_id.into(),
        }
    }
}
