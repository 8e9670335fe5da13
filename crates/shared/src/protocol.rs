use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Body returned once a submission passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitAccepted {
    pub success: bool,
}

impl SubmitAccepted {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Outcome of one submission round trip as seen by a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionResult {
    Accepted,
    Rejected(ApiError),
    ServerError,
}

impl SubmissionResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

pub fn healthz_route() -> &'static str {
    "/healthz"
}
