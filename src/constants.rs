// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for routeflare.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// Environment Variable Names
// ============================================================================

/// Root domain whose routes and Cloudflare zone are managed
pub const ENV_CLUSTER_DOMAIN: &str = "CLUSTER_DOMAIN";

/// Credential for the controller's HTTP Basic authentication
pub const ENV_CONTROLLER_AUTH_KEY: &str = "CONTROLLER_AUTH_KEY";

/// Cloudflare account email
pub const ENV_CF_EMAIL: &str = "CF_EMAIL";

/// Cloudflare global API key
pub const ENV_CF_KEY: &str = "CF_KEY";

/// Optional override for the controller base URL
pub const ENV_CONTROLLER_URL: &str = "CONTROLLER_URL";

/// Optional override for the Cloudflare API base URL
pub const ENV_CF_API_URL: &str = "CF_API_URL";

/// Accept the controller's self-signed certificate
pub const ENV_CONTROLLER_TLS_INSECURE: &str = "CONTROLLER_TLS_INSECURE";

/// Per-request HTTP timeout in seconds
pub const ENV_HTTP_TIMEOUT_SECS: &str = "HTTP_TIMEOUT_SECS";

/// Upper bound on time spent retrying one HTTP call, in seconds
pub const ENV_HTTP_RETRY_MAX_ELAPSED_SECS: &str = "HTTP_RETRY_MAX_ELAPSED_SECS";

/// Seconds between reconciliation passes
pub const ENV_RECONCILE_INTERVAL_SECS: &str = "RECONCILE_INTERVAL_SECS";

/// Selects the log output format (`json` or `text`)
pub const ENV_LOG_FORMAT: &str = "RUST_LOG_FORMAT";

/// Optional file of `KEY=value` settings read at startup, relative to the working directory
pub const DOTENV_FILE: &str = ".env";

// ============================================================================
// Controller API Constants
// ============================================================================

/// Host label prepended to the cluster domain to reach the controller
pub const CONTROLLER_HOST_PREFIX: &str = "controller";

/// Metadata key marking an application as cluster infrastructure
pub const SYSTEM_APP_META_KEY: &str = "flynn-system-app";

/// Path listing every application known to the controller
pub const CONTROLLER_APPS_PATH: &str = "apps";

// ============================================================================
// Cloudflare API Constants
// ============================================================================

/// Default Cloudflare API v4 base URL
pub const DEFAULT_CF_API_URL: &str = "https://api.cloudflare.com/client/v4";

/// Header carrying the Cloudflare account email (lowercase for `HeaderName::from_static`)
pub const CF_AUTH_EMAIL_HEADER: &str = "x-auth-email";

/// Header carrying the Cloudflare global API key
pub const CF_AUTH_KEY_HEADER: &str = "x-auth-key";

/// Page size used when listing DNS records
pub const CF_RECORDS_PAGE_SIZE: u32 = 100;

/// Cloudflare error code for a name that already has an A, AAAA or CNAME record
pub const CF_RECORD_ALREADY_EXISTS_CODE: i64 = 81053;

/// Record type created for every route
pub const DNS_RECORD_TYPE_CNAME: &str = "CNAME";

// ============================================================================
// Timing Constants
// ============================================================================

/// Default interval between reconciliation passes (10 minutes)
pub const DEFAULT_RECONCILE_INTERVAL_SECS: u64 = 600;

/// Default per-request HTTP timeout (30 seconds)
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Default maximum time spent retrying a single HTTP call (30 seconds)
pub const DEFAULT_HTTP_RETRY_MAX_ELAPSED_SECS: u64 = 30;

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of worker threads for Tokio runtime
pub const TOKIO_WORKER_THREADS: usize = 2;

/// Thread name for Tokio worker threads
pub const TOKIO_THREAD_NAME: &str = "routeflare";
