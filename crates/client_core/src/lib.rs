use std::time::Duration;

use reqwest::{Client, StatusCode};
use shared::{error::ApiError, protocol::SubmissionResult, validation::Submission};
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

mod form;

pub use form::{FormController, FormStatus, SubmitRefused};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid server url '{url}': {source}")]
    InvalidServerUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("failed to build http client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Posts validated submissions to the intake endpoints of one site.
#[derive(Clone)]
pub struct IntakeClient {
    http: Client,
    server_url: Url,
}

impl IntakeClient {
    pub fn new(server_url: &str) -> Result<Self, ClientError> {
        let mut server_url =
            Url::parse(server_url).map_err(|source| ClientError::InvalidServerUrl {
                url: server_url.to_string(),
                source,
            })?;
        if !server_url.path().ends_with('/') {
            let path = format!("{}/", server_url.path());
            server_url.set_path(&path);
        }
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { http, server_url })
    }

    /// Form route resolved under the server url, keeping any path prefix the
    /// site is mounted at.
    pub fn endpoint<T: Submission>(&self) -> Result<Url, url::ParseError> {
        self.server_url.join(T::FORM.route().trim_start_matches('/'))
    }

    /// One request, no retries. Transport failures and non-2xx answers are
    /// reported as results, never as panics or errors.
    pub async fn submit<T: Submission>(&self, submission: &T) -> SubmissionResult {
        let form = T::FORM.label();
        let endpoint = match self.endpoint::<T>() {
            Ok(endpoint) => endpoint,
            Err(error) => {
                warn!(form, %error, "cannot build submission endpoint");
                return SubmissionResult::ServerError;
            }
        };

        let response = match self.http.post(endpoint).json(submission).send().await {
            Ok(response) => response,
            Err(error) => {
                warn!(form, %error, "submission request failed");
                return SubmissionResult::ServerError;
            }
        };

        let status = response.status();
        if status.is_success() {
            info!(form, "submission accepted");
            return SubmissionResult::Accepted;
        }

        if status == StatusCode::BAD_REQUEST {
            if let Ok(rejection) = response.json::<ApiError>().await {
                warn!(form, error = %rejection.error, "submission rejected by server");
                return SubmissionResult::Rejected(rejection);
            }
        }

        warn!(form, %status, "submission failed");
        SubmissionResult::ServerError
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
