//! Client for the recruiting backend REST API.
//!
//! One [`ApiClient`] is shared by every command. Transport and HTTP failures are
//! folded into [`ApiError`] with messages fit to show a candidate; the raw
//! details go to the log.

mod interview;
mod types;
mod vacancy;

pub use types::{
    AnswerResponse, ApplyResponse, CandidateAnswer, InterviewDetails, InterviewMessage,
    InterviewSummary, Question, ResumeEvaluation, ScreeningReport, StartResponse, Vacancy,
};

use crate::config::ApiConfig;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

/// Errors returned by backend calls.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Server could not be reached or did not answer in time
    #[error("{0}")]
    Network(String),

    /// Server answered with a non-success status
    #[error("{message}")]
    Status { status: u16, message: String },

    /// The requested interview, vacancy or question does not exist
    #[error("{0} was not found")]
    NotFound(String),

    /// Response body did not have the expected shape
    #[error("unexpected response from the interview server: {0}")]
    Malformed(String),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Builds a client for `config.base_url` with the configured request timeout.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Location of an audio file stored by the backend.
    pub fn audio_url(&self, fid: &str, filename: &str) -> String {
        format!(
            "{}/file/{}/{}",
            self.base_url,
            urlencoding::encode(fid),
            urlencoding::encode(filename)
        )
    }

    /// Sends a request and maps transport and status failures.
    ///
    /// `subject` names the resource for not-found messages.
    async fn send(&self, request: RequestBuilder, subject: &str) -> Result<Response, ApiError> {
        let response = request.send().await.map_err(|e| {
            tracing::error!("Request for {} failed: {}", subject, e);
            network_error(&e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        tracing::error!(
            "Interview server returned {} for {}: {}",
            status,
            subject,
            body
        );

        Err(status_error(status.as_u16(), subject, &body))
    }

    async fn json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Network(format!("Failed to read server response: {e}")))?;
        tracing::debug!("Interview server response: {}", body);
        serde_json::from_str(&body).map_err(|e| ApiError::Malformed(e.to_string()))
    }
}

fn network_error(e: &reqwest::Error) -> ApiError {
    let message = if e.is_connect() {
        "Failed to connect to the interview server. Check your internet connection.".to_string()
    } else if e.is_timeout() {
        "Request to the interview server timed out. Please try again.".to_string()
    } else if e.is_builder() {
        format!("Failed to build request: {e}. Check `api.base_url` in your config.")
    } else {
        format!("Network error: {e}")
    };
    ApiError::Network(message)
}

fn status_error(status: u16, subject: &str, body: &str) -> ApiError {
    let message = match status {
        404 => return ApiError::NotFound(subject.to_string()),
        400 | 422 => format!("The interview server rejected the request: {}", detail(body)),
        401 | 403 => "The interview server refused access to this resource.".to_string(),
        429 => "Too many requests to the interview server. Please wait and try again.".to_string(),
        500..=599 => "The interview server is experiencing issues. Please try again later.".to_string(),
        _ => format!("Interview server error (status {status}): {}", detail(body)),
    };
    ApiError::Status { status, message }
}

/// Pulls FastAPI-style `{"detail": ...}` out of an error body, falling back to the raw text.
fn detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| match value.get("detail")? {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        })
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
pub(crate) mod testing {
    //! Local HTTP server standing in for the recruiting backend.

    use super::ApiClient;
    use crate::config::ApiConfig;
    use axum::Router;

    /// Serves `router` on an ephemeral port and returns a client pointed at it.
    pub async fn serve(router: Router) -> ApiClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        ApiClient::new(&ApiConfig {
            base_url: format!("http://{addr}/api/"),
            timeout_secs: 5,
        })
        .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_url_encodes_both_segments() {
        let client = ApiClient::new(&ApiConfig {
            base_url: "https://example.test/api/".into(),
            timeout_secs: 5,
        })
        .unwrap();

        assert_eq!(
            client.audio_url("a b", "q1 intro.mp3"),
            "https://example.test/api/file/a%20b/q1%20intro.mp3"
        );
    }

    #[test]
    fn statuses_map_to_readable_errors() {
        assert_eq!(
            status_error(404, "Interview", ""),
            ApiError::NotFound("Interview".into())
        );
        assert_eq!(
            status_error(422, "Answer", r#"{"detail":"audio_file is required"}"#),
            ApiError::Status {
                status: 422,
                message: "The interview server rejected the request: audio_file is required"
                    .into()
            }
        );
        assert!(matches!(
            status_error(503, "Answer", "gateway"),
            ApiError::Status { status: 503, .. }
        ));
    }

    #[test]
    fn detail_falls_back_to_raw_body() {
        assert_eq!(detail("  plain failure \n"), "plain failure");
        assert_eq!(detail(r#"{"detail":[{"loc":"x"}]}"#), r#"[{"loc":"x"}]"#);
    }
}
