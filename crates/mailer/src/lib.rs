//! Outbound notification email through a transactional-email HTTP API.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

pub const DEFAULT_API_URL: &str = "https://api.resend.com";
pub const DEFAULT_FROM: &str = "onboarding@resend.dev";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    fn describe(&self) -> &'static str;
    async fn send(&self, email: &OutboundEmail) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct MailerConfig {
    pub api_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    message: Option<String>,
}

#[derive(Clone)]
pub struct Mailer {
    http: Client,
    endpoint: Url,
    api_key: String,
}

impl Mailer {
    pub fn new(config: MailerConfig) -> Result<Self> {
        let mut base = Url::parse(&config.api_url)
            .with_context(|| format!("invalid email api url '{}'", config.api_url))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base
            .join("emails")
            .context("failed to build email endpoint")?;
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("failed to build mailer http client")?;
        Ok(Self {
            http,
            endpoint,
            api_key: config.api_key,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Notifier for Mailer {
    fn describe(&self) -> &'static str {
        "email"
    }

    async fn send(&self, email: &OutboundEmail) -> Result<()> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(email)
            .send()
            .await
            .context("email api request failed")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<ProviderError>()
                .await
                .ok()
                .and_then(|body| body.message)
                .unwrap_or_else(|| status.to_string());
            return Err(anyhow!("email api rejected message ({status}): {detail}"));
        }

        let accepted: SendResponse = response.json().await.unwrap_or(SendResponse { id: None });
        debug!(email_id = ?accepted.id, to = %email.to, "notification email accepted");
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
