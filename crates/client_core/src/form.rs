//! Form-side controller: advisory validation, in-flight guard, and the
//! idle / submitting / success / error status shown next to the submit button.

use shared::{
    error::{FieldErrors, ValidationError},
    protocol::SubmissionResult,
    validation::Submission,
};
use thiserror::Error;

use crate::IntakeClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormStatus {
    #[default]
    Idle,
    Submitting,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitRefused {
    #[error("a submission from this form is already in flight")]
    InFlight,
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

#[derive(Debug, Clone, Default)]
pub struct FormController<T> {
    draft: T,
    field_errors: FieldErrors,
    status: FormStatus,
}

impl<T: Submission + Default + Clone> FormController<T> {
    pub fn new() -> Self {
        Self {
            draft: T::default(),
            field_errors: FieldErrors::new(),
            status: FormStatus::Idle,
        }
    }

    pub fn draft(&self) -> &T {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut T {
        &mut self.draft
    }

    pub fn status(&self) -> FormStatus {
        self.status
    }

    pub fn field_errors(&self) -> &FieldErrors {
        &self.field_errors
    }

    pub fn field_error(&self, field: &str) -> Option<&str> {
        self.field_errors
            .get(field)
            .and_then(|messages| messages.first())
            .map(String::as_str)
    }

    pub fn submit_enabled(&self) -> bool {
        self.status != FormStatus::Submitting
    }

    /// Validates the draft and marks the form as in flight.
    ///
    /// Returns the payload to send. Inline errors are kept on refusal and the
    /// user may fix the draft and try again.
    pub fn begin_submit(&mut self) -> Result<T, SubmitRefused> {
        if self.status == FormStatus::Submitting {
            return Err(SubmitRefused::InFlight);
        }
        if let Err(err) = self.draft.validate() {
            self.field_errors = err.field_errors.clone();
            return Err(err.into());
        }
        self.field_errors.clear();
        self.status = FormStatus::Submitting;
        Ok(self.draft.clone())
    }

    pub fn finish_submit(&mut self, result: &SubmissionResult) {
        match result {
            SubmissionResult::Accepted => {
                self.status = FormStatus::Success;
                self.draft = T::default();
                self.field_errors.clear();
            }
            SubmissionResult::Rejected(rejection) => {
                self.status = FormStatus::Error;
                if let Some(details) = &rejection.details {
                    self.field_errors = details.clone();
                }
            }
            SubmissionResult::ServerError => {
                self.status = FormStatus::Error;
            }
        }
    }

    /// Validate, post, and record the outcome in one step.
    pub async fn submit(&mut self, client: &IntakeClient) -> Result<SubmissionResult, SubmitRefused> {
        let payload = self.begin_submit()?;
        let result = client.submit(&payload).await;
        self.finish_submit(&result);
        Ok(result)
    }
}

#[cfg(test)]
#[path = "tests/form_tests.rs"]
mod tests;
