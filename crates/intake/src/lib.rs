use std::{future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;
use mailer::{Notifier, OutboundEmail};
use serde_json::Value;
use shared::{
    domain::{ContactSubmission, FormKind, ProposalSubmission, SubmissionId},
    error::{ApiError, ValidationError},
    validation::Submission,
};
use storage::SubmissionStore;
use thiserror::Error;
use tracing::{error, info, warn};

pub const DEFAULT_SINK_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct NotifyAddresses {
    pub from: String,
    pub to: String,
}

/// Everything a submission may be forwarded to. Absent sinks are skipped.
#[derive(Clone)]
pub struct IntakeContext {
    pub store: Option<Arc<dyn SubmissionStore>>,
    pub notifier: Option<Arc<dyn Notifier>>,
    pub addresses: NotifyAddresses,
    pub sink_timeout: Duration,
}

impl IntakeContext {
    /// A context with no sinks configured; submissions only reach the log.
    pub fn log_only(addresses: NotifyAddresses) -> Self {
        Self {
            store: None,
            notifier: None,
            addresses,
            sink_timeout: DEFAULT_SINK_TIMEOUT,
        }
    }
}

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("request body is not valid json: {0}")]
    MalformedBody(#[from] serde_json::Error),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl IntakeError {
    pub fn to_api_error(&self) -> ApiError {
        match self {
            Self::MalformedBody(_) => ApiError::internal(),
            Self::Validation(err) => ApiError::from(err.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkOutcome {
    Disabled,
    Delivered,
    Failed,
}

/// What happened to an accepted submission. Sink failures never turn an
/// accepted submission into a rejected one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntakeReceipt {
    pub submission_id: SubmissionId,
    pub persisted: SinkOutcome,
    pub notified: SinkOutcome,
    pub fallback_logged: bool,
}

/// Per-form forwarding behavior on top of the shared schema.
#[async_trait]
pub trait Deliverable: Submission {
    async fn persist(&self, store: &dyn SubmissionStore) -> anyhow::Result<()>;
    fn notification(&self, addresses: &NotifyAddresses) -> OutboundEmail;
    fn log_fallback(&self, submission_id: SubmissionId);
}

#[async_trait]
impl Deliverable for ContactSubmission {
    async fn persist(&self, store: &dyn SubmissionStore) -> anyhow::Result<()> {
        store.insert_contact(self).await
    }

    fn notification(&self, addresses: &NotifyAddresses) -> OutboundEmail {
        let text = [
            "New contact message from your portfolio:".to_string(),
            String::new(),
            format!("Name: {}", self.name),
            format!("Email: {}", self.email),
            format!("Type: {}", self.kind.as_str()),
            format!("Subject: {}", self.subject),
            String::new(),
            "Message:".to_string(),
            self.message.clone(),
        ]
        .join("\n");

        OutboundEmail {
            from: addresses.from.clone(),
            to: addresses.to.clone(),
            subject: format!("[Portfolio Contact] {}", self.subject),
            text,
        }
    }

    fn log_fallback(&self, submission_id: SubmissionId) {
        info!(
            form = "contact",
            %submission_id,
            name = %self.name,
            email = %self.email,
            subject = %self.subject,
            kind = self.kind.as_str(),
            message = %self.message,
            "no sinks configured; contact message captured in log only"
        );
    }
}

#[async_trait]
impl Deliverable for ProposalSubmission {
    async fn persist(&self, store: &dyn SubmissionStore) -> anyhow::Result<()> {
        store.insert_proposal(self).await
    }

    fn notification(&self, addresses: &NotifyAddresses) -> OutboundEmail {
        let text = [
            "New project proposal from your portfolio:".to_string(),
            String::new(),
            format!("Name: {}", self.name),
            format!("Email: {}", self.email),
            format!("Company: {}", self.company.as_deref().unwrap_or("N/A")),
            format!("Budget: {}", self.budget.as_str()),
            format!("Deadline: {}", self.deadline),
            String::new(),
            "Description:".to_string(),
            self.description.clone(),
        ]
        .join("\n");

        OutboundEmail {
            from: addresses.from.clone(),
            to: addresses.to.clone(),
            subject: format!("[Portfolio Proposal] New project from {}", self.name),
            text,
        }
    }

    fn log_fallback(&self, submission_id: SubmissionId) {
        info!(
            form = "proposal",
            %submission_id,
            name = %self.name,
            email = %self.email,
            company = self.company.as_deref().unwrap_or(""),
            budget = self.budget.as_str(),
            deadline = %self.deadline,
            description = %self.description,
            "no sinks configured; project proposal captured in log only"
        );
    }
}

/// Parses, validates and forwards one raw request body.
pub async fn receive<T: Deliverable>(
    ctx: &IntakeContext,
    body: &[u8],
) -> Result<IntakeReceipt, IntakeError> {
    let value: Value = serde_json::from_slice(body)?;
    let submission = T::from_json(&value).map_err(|err| {
        warn!(form = T::FORM.label(), fields = %err, "submission rejected");
        err
    })?;
    Ok(forward(ctx, &submission).await)
}

/// Forwards an already validated submission to every configured sink.
///
/// Sinks are attempted one after the other; a failure or timeout in one is
/// logged and does not stop the next.
pub async fn forward<T: Deliverable>(ctx: &IntakeContext, submission: &T) -> IntakeReceipt {
    let form = T::FORM;
    let submission_id = SubmissionId::new();

    let persisted = match &ctx.store {
        Some(store) => {
            attempt(
                form,
                submission_id,
                store.describe(),
                ctx.sink_timeout,
                submission.persist(store.as_ref()),
            )
            .await
        }
        None => SinkOutcome::Disabled,
    };

    let notified = match &ctx.notifier {
        Some(notifier) => {
            let email = submission.notification(&ctx.addresses);
            attempt(
                form,
                submission_id,
                notifier.describe(),
                ctx.sink_timeout,
                notifier.send(&email),
            )
            .await
        }
        None => SinkOutcome::Disabled,
    };

    let fallback_logged = ctx.store.is_none() && ctx.notifier.is_none();
    if fallback_logged {
        submission.log_fallback(submission_id);
    }

    info!(
        form = form.label(),
        %submission_id,
        ?persisted,
        ?notified,
        "submission accepted"
    );

    IntakeReceipt {
        submission_id,
        persisted,
        notified,
        fallback_logged,
    }
}

async fn attempt<F>(
    form: FormKind,
    submission_id: SubmissionId,
    sink: &'static str,
    timeout: Duration,
    call: F,
) -> SinkOutcome
where
    F: Future<Output = anyhow::Result<()>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(())) => SinkOutcome::Delivered,
        Ok(Err(error)) => {
            let error = format!("{error:#}");
            error!(
                form = form.label(),
                %submission_id,
                sink,
                %error,
                "sink call failed"
            );
            SinkOutcome::Failed
        }
        Err(_) => {
            error!(
                form = form.label(),
                %submission_id,
                sink,
                timeout_ms = timeout.as_millis() as u64,
                "sink call timed out"
            );
            SinkOutcome::Failed
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
