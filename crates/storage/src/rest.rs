//! Table inserts through a PostgREST-compatible HTTP endpoint.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use shared::domain::{ContactSubmission, FormKind, ProposalSubmission};
use url::Url;

use crate::SubmissionStore;

#[derive(Clone)]
pub struct RestTableStore {
    http: Client,
    base_url: Url,
    service_key: String,
}

impl RestTableStore {
    pub fn new(base_url: &str, service_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let mut base_url =
            Url::parse(base_url).with_context(|| format!("invalid store url '{base_url}'"))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build store http client")?;
        Ok(Self {
            http,
            base_url,
            service_key: service_key.into(),
        })
    }

    pub fn table_url(&self, table: &str) -> Result<Url> {
        self.base_url
            .join(&format!("rest/v1/{table}"))
            .with_context(|| format!("invalid table name '{table}'"))
    }

    async fn insert_row(&self, form: FormKind, row: Value) -> Result<()> {
        let url = self.table_url(form.table())?;
        self.http
            .post(url)
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .header("Prefer", "return=minimal")
            .json(&row)
            .send()
            .await
            .with_context(|| format!("insert into {} failed to send", form.table()))?
            .error_for_status()
            .with_context(|| format!("insert into {} was rejected", form.table()))?;
        Ok(())
    }
}

#[async_trait]
impl SubmissionStore for RestTableStore {
    fn describe(&self) -> &'static str {
        "rest"
    }

    async fn insert_contact(&self, submission: &ContactSubmission) -> Result<()> {
        self.insert_row(
            FormKind::Contact,
            json!({
                "name": submission.name,
                "email": submission.email,
                "subject": submission.subject,
                "type": submission.kind.as_str(),
                "message": submission.message,
            }),
        )
        .await
    }

    async fn insert_proposal(&self, submission: &ProposalSubmission) -> Result<()> {
        self.insert_row(
            FormKind::Proposal,
            json!({
                "name": submission.name,
                "email": submission.email,
                "company": submission.company.as_deref().filter(|company| !company.is_empty()),
                "budget": submission.budget.as_str(),
                "deadline": submission.deadline,
                "description": submission.description,
            }),
        )
        .await
    }
}

#[cfg(test)]
#[path = "tests/rest_tests.rs"]
mod tests;
