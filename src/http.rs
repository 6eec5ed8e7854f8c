// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared HTTP plumbing for the controller and Cloudflare clients.
//!
//! Every remote call goes through [`request_json`], which applies the configured
//! per-request timeout (set on the client), retries transient failures with
//! exponential backoff, and turns non-2xx responses into a typed [`HttpError`].

use crate::http_errors::map_http_error_to_reason;
use crate::retry::{http_backoff, is_retryable_http_status};
use reqwest::header::HeaderMap;
use reqwest::{Client as HttpClient, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, warn};
use url::Url;

/// Failure of a single logical HTTP call (after retries).
#[derive(Error, Debug)]
pub enum HttpError {
    /// The remote side answered with a non-success status
    #[error("HTTP {status} from {url} [{reason}]: {message}")]
    Status {
        /// Request URL
        url: String,
        /// Response status
        status: StatusCode,
        /// Short reason tag from [`map_http_error_to_reason`]
        reason: &'static str,
        /// Response body, or the reason text when the body is empty
        message: String,
    },

    /// The request never produced a response (connect failure, timeout, TLS)
    #[error("Request to {url} failed: {source}")]
    Transport {
        /// Request URL
        url: String,
        /// Underlying client error
        #[source]
        source: reqwest::Error,
    },

    /// The response body was not the expected JSON
    #[error("Invalid response body from {url}: {reason}")]
    Decode {
        /// Request URL
        url: String,
        /// Decoder message
        reason: String,
    },
}

impl HttpError {
    /// Returns true if repeating the same request may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status { status, .. } => is_retryable_http_status(*status),
            Self::Transport { source, .. } => {
                source.is_timeout() || source.is_connect() || source.is_request()
            }
            Self::Decode { .. } => false,
        }
    }

    /// HTTP status of the failed response, if one was received.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport { .. } | Self::Decode { .. } => None,
        }
    }
}

/// Build the HTTP client shared by all calls against one remote API.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialized.
pub fn build_http_client(
    timeout: Duration,
    accept_invalid_certs: bool,
) -> Result<HttpClient, reqwest::Error> {
    HttpClient::builder()
        .timeout(timeout)
        .danger_accept_invalid_certs(accept_invalid_certs)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Execute a JSON request with automatic retry.
///
/// # Retry Behavior
/// - Retries on HTTP 429, 500, 502, 503, 504 and on connection failures or timeouts
/// - Fails immediately on other 4xx errors and on undecodable bodies
/// - Gives up once `retry_budget` has elapsed (a zero budget sends exactly once)
///
/// # Errors
///
/// Returns the last [`HttpError`] once the request fails permanently or the
/// retry budget is exhausted.
pub async fn request_json<T, B>(
    client: &HttpClient,
    method: Method,
    url: &Url,
    headers: &HeaderMap,
    body: Option<&B>,
    retry_budget: Duration,
) -> Result<T, HttpError>
where
    T: DeserializeOwned,
    B: Serialize + ?Sized,
{
    let mut backoff = http_backoff(retry_budget);
    let start_time = Instant::now();
    let mut attempt = 0;

    loop {
        attempt += 1;

        match request_json_once(client, method.clone(), url, headers, body).await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(
                        method = %method,
                        url = %url,
                        attempt = attempt,
                        elapsed = ?start_time.elapsed(),
                        "HTTP call succeeded after retries"
                    );
                }
                return Ok(value);
            }
            Err(e) => {
                if !e.is_retryable() {
                    debug!(
                        method = %method,
                        url = %url,
                        error = %e,
                        "Non-retryable HTTP error, failing immediately"
                    );
                    return Err(e);
                }

                if let Some(duration) = backoff.next_backoff() {
                    warn!(
                        method = %method,
                        url = %url,
                        attempt = attempt,
                        retry_after = ?duration,
                        error = %e,
                        "Retryable HTTP error, will retry"
                    );
                    tokio::time::sleep(duration).await;
                } else {
                    error!(
                        method = %method,
                        url = %url,
                        attempt = attempt,
                        elapsed = ?start_time.elapsed(),
                        error = %e,
                        "Retry budget exhausted, giving up"
                    );
                    return Err(e);
                }
            }
        }
    }
}

/// Single request attempt without retry logic.
async fn request_json_once<T, B>(
    client: &HttpClient,
    method: Method,
    url: &Url,
    headers: &HeaderMap,
    body: Option<&B>,
) -> Result<T, HttpError>
where
    T: DeserializeOwned,
    B: Serialize + ?Sized,
{
    debug!(method = %method, url = %url, has_body = body.is_some(), "HTTP request");

    let mut request = client
        .request(method, url.clone())
        .headers(headers.clone());
    if let Some(body_data) = body {
        request = request.json(body_data);
    }

    let response = request.send().await.map_err(|source| HttpError::Transport {
        url: url.to_string(),
        source,
    })?;

    let status = response.status();
    let text = response.text().await.map_err(|source| HttpError::Transport {
        url: url.to_string(),
        source,
    })?;

    if !status.is_success() {
        let (reason, summary) = map_http_error_to_reason(status.as_u16());
        let message = if text.trim().is_empty() {
            summary
        } else {
            text
        };
        return Err(HttpError::Status {
            url: url.to_string(),
            status,
            reason,
            message,
        });
    }

    serde_json::from_str(&text).map_err(|e| HttpError::Decode {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod http_tests;
