use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// What a mutating request did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ActionResult {
    None,
    Saved,
    Created,
    Updated,
    Deleted,
    Error,
}

/// Response body of mutating document requests
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ActionOutcome {
    pub message: String,
    pub result: ActionResult,
}

impl ActionOutcome {
    pub fn new(result: ActionResult, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            result,
        }
    }
}
