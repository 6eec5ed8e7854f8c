// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Process configuration.
//!
//! All settings come from the environment and are read exactly once at startup
//! into an immutable [`Config`], which is then shared by every component.
//!
//! # Required
//!
//! | Variable | Meaning |
//! |----------|---------|
//! | `CLUSTER_DOMAIN` | Root domain whose routes and zone are managed |
//! | `CONTROLLER_AUTH_KEY` | Controller Basic auth key |
//! | `CF_EMAIL` | Cloudflare account email |
//! | `CF_KEY` | Cloudflare global API key |
//!
//! # Optional
//!
//! | Variable | Default |
//! |----------|---------|
//! | `CONTROLLER_URL` | `https://controller.<CLUSTER_DOMAIN>` |
//! | `CF_API_URL` | `https://api.cloudflare.com/client/v4` |
//! | `CONTROLLER_TLS_INSECURE` | `false` |
//! | `HTTP_TIMEOUT_SECS` | `30` |
//! | `HTTP_RETRY_MAX_ELAPSED_SECS` | `30` |
//! | `RECONCILE_INTERVAL_SECS` | `600` |
//!
//! # `.env` file
//!
//! [`load_dotenv`] copies `KEY=value` lines from a `.env` file into the process
//! environment before the configuration is read. Variables that are already set
//! win over the file. A missing file is not an error.

use crate::constants::{
    CONTROLLER_HOST_PREFIX, DEFAULT_CF_API_URL, DEFAULT_HTTP_RETRY_MAX_ELAPSED_SECS,
    DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_RECONCILE_INTERVAL_SECS, ENV_CF_API_URL, ENV_CF_EMAIL,
    ENV_CF_KEY, ENV_CLUSTER_DOMAIN, ENV_CONTROLLER_AUTH_KEY, ENV_CONTROLLER_TLS_INSECURE,
    ENV_CONTROLLER_URL, ENV_HTTP_RETRY_MAX_ELAPSED_SECS, ENV_HTTP_TIMEOUT_SECS,
    ENV_RECONCILE_INTERVAL_SECS,
};
use crate::sync_errors::ConfigError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Cloudflare API credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct CloudflareCredentials {
    /// Account email, sent as `X-Auth-Email`
    pub email: String,
    /// Global API key, sent as `X-Auth-Key`
    pub key: String,
}

impl fmt::Debug for CloudflareCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudflareCredentials")
            .field("email", &self.email)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// Immutable settings for one process lifetime.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    /// Managed root domain; also the Cloudflare zone name and the CNAME target
    pub cluster_domain: String,
    /// Controller base URL, always ending in `/`
    pub controller_url: Url,
    /// Precomputed `Authorization` header value for the controller
    pub controller_authorization: String,
    /// Accept the controller's certificate without verification
    pub controller_tls_insecure: bool,
    /// Cloudflare credentials
    pub cloudflare: CloudflareCredentials,
    /// Cloudflare API base URL, always ending in `/`
    pub cloudflare_api_url: Url,
    /// Per-request timeout for every HTTP call
    pub http_timeout: Duration,
    /// Retry budget for a single HTTP call
    pub http_retry_max_elapsed: Duration,
    /// Time between the start of consecutive passes
    pub reconcile_interval: Duration,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("cluster_domain", &self.cluster_domain)
            .field("controller_url", &self.controller_url.as_str())
            .field("controller_authorization", &"<redacted>")
            .field("controller_tls_insecure", &self.controller_tls_insecure)
            .field("cloudflare", &self.cloudflare)
            .field("cloudflare_api_url", &self.cloudflare_api_url.as_str())
            .field("http_timeout", &self.http_timeout)
            .field("http_retry_max_elapsed", &self.http_retry_max_elapsed)
            .field("reconcile_interval", &self.reconcile_interval)
            .finish()
    }
}

impl Config {
    /// Load settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSettings`] listing every required variable that
    /// is unset or empty, or [`ConfigError::InvalidSetting`] for an unparsable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`Config::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let required = [
            ENV_CLUSTER_DOMAIN,
            ENV_CONTROLLER_AUTH_KEY,
            ENV_CF_EMAIL,
            ENV_CF_KEY,
        ];
        let missing: Vec<String> = required
            .into_iter()
            .filter(|key| read(key).is_none())
            .map(ToString::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::MissingSettings { keys: missing });
        }

        let require = |key: &str| read(key).unwrap_or_default();

        let cluster_domain = normalize_domain(&require(ENV_CLUSTER_DOMAIN));
        if cluster_domain.is_empty() {
            return Err(ConfigError::InvalidSetting {
                key: ENV_CLUSTER_DOMAIN.to_string(),
                value: require(ENV_CLUSTER_DOMAIN),
                reason: "domain is empty".to_string(),
            });
        }

        let controller_url = match read(ENV_CONTROLLER_URL) {
            Some(raw) => parse_base_url(ENV_CONTROLLER_URL, &raw)?,
            None => parse_base_url(
                ENV_CLUSTER_DOMAIN,
                &format!("https://{CONTROLLER_HOST_PREFIX}.{cluster_domain}"),
            )?,
        };

        let cloudflare_api_url = parse_base_url(
            ENV_CF_API_URL,
            &read(ENV_CF_API_URL).unwrap_or_else(|| DEFAULT_CF_API_URL.to_string()),
        )?;

        let controller_tls_insecure = match read(ENV_CONTROLLER_TLS_INSECURE) {
            Some(raw) => parse_bool(ENV_CONTROLLER_TLS_INSECURE, &raw)?,
            None => false,
        };

        let http_timeout = read_secs(&read, ENV_HTTP_TIMEOUT_SECS, DEFAULT_HTTP_TIMEOUT_SECS, 1)?;
        let http_retry_max_elapsed = read_secs(
            &read,
            ENV_HTTP_RETRY_MAX_ELAPSED_SECS,
            DEFAULT_HTTP_RETRY_MAX_ELAPSED_SECS,
            0,
        )?;
        let reconcile_interval = read_secs(
            &read,
            ENV_RECONCILE_INTERVAL_SECS,
            DEFAULT_RECONCILE_INTERVAL_SECS,
            1,
        )?;

        Ok(Self {
            controller_authorization: basic_authorization(&require(ENV_CONTROLLER_AUTH_KEY)),
            cluster_domain,
            controller_url,
            controller_tls_insecure,
            cloudflare: CloudflareCredentials {
                email: require(ENV_CF_EMAIL),
                key: require(ENV_CF_KEY),
            },
            cloudflare_api_url,
            http_timeout,
            http_retry_max_elapsed,
            reconcile_interval,
        })
    }
}

/// Outcome of [`load_dotenv`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DotenvStatus {
    /// The file was applied to the process environment
    Loaded(PathBuf),
    /// No file exists at the path
    NotFound,
    /// The file exists but could not be read or parsed
    Failed(String),
}

/// Load a `.env` file into the process environment without overriding set variables.
///
/// Must run before the runtime spawns threads that read the environment.
pub fn load_dotenv(path: &Path) -> DotenvStatus {
    match dotenvy::from_path(path) {
        Ok(()) => DotenvStatus::Loaded(path.to_path_buf()),
        Err(e) if e.not_found() => DotenvStatus::NotFound,
        Err(e) => DotenvStatus::Failed(e.to_string()),
    }
}

/// `Authorization` header value for the controller: empty user, key as password.
#[must_use]
pub fn basic_authorization(auth_key: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!(":{auth_key}")))
}

/// Strip surrounding whitespace and a trailing root dot.
fn normalize_domain(raw: &str) -> String {
    raw.trim().trim_end_matches('.').to_string()
}

/// Parse a base URL and force a trailing slash so relative joins keep the path.
fn parse_base_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidSetting {
        key: key.to_string(),
        value: raw.to_string(),
        reason,
    };

    let mut url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("expected an http(s) URL".to_string()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidSetting {
            key: key.to_string(),
            value: raw.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

fn read_secs<F>(read: &F, key: &str, default: u64, min: u64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = read(key) else {
        return Ok(Duration::from_secs(default));
    };

    let secs: u64 = raw.parse().map_err(|_| ConfigError::InvalidSetting {
        key: key.to_string(),
        value: raw.clone(),
        reason: "expected a whole number of seconds".to_string(),
    })?;
    if secs < min {
        return Err(ConfigError::InvalidSetting {
            key: key.to_string(),
            value: raw,
            reason: format!("must be at least {min}"),
        });
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
