// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! HTTP error code mapping to short failure reasons.
//!
//! Both remote APIs (the cluster controller and Cloudflare) report failures through
//! HTTP status codes. This module turns those codes into a stable reason tag plus a
//! human-readable explanation so log lines say *why* a stage failed.
//!
//! # Usage
//!
//! ```rust
//! use routeflare::http_errors::map_http_error_to_reason;
//!
//! let (reason, message) = map_http_error_to_reason(403);
//! assert_eq!(reason, "AuthFailed");
//!
//! let (reason, message) = map_http_error_to_reason(503);
//! assert_eq!(reason, "Unavailable");
//! ```

/// Request was malformed or rejected by validation
pub const REASON_BAD_REQUEST: &str = "BadRequest";

/// Credentials missing, wrong, or lacking permission
pub const REASON_AUTH_FAILED: &str = "AuthFailed";

/// Resource does not exist
pub const REASON_NOT_FOUND: &str = "NotFound";

/// Request conflicts with existing state (e.g. record already exists)
pub const REASON_CONFLICT: &str = "Conflict";

/// Caller is being rate limited
pub const REASON_RATE_LIMITED: &str = "RateLimited";

/// Remote side failed internally
pub const REASON_INTERNAL_ERROR: &str = "InternalError";

/// Remote side or a gateway in front of it is unavailable
pub const REASON_UNAVAILABLE: &str = "Unavailable";

/// Anything else
pub const REASON_UNEXPECTED: &str = "UnexpectedStatus";

/// Map HTTP status code to failure reason and message.
///
/// # HTTP Code Mapping
///
/// | HTTP Code | Reason | Meaning |
/// |-----------|--------|---------|
/// | 400 | `BadRequest` | Invalid request format |
/// | 401 | `AuthFailed` | Authentication required |
/// | 403 | `AuthFailed` | Insufficient permissions |
/// | 404 | `NotFound` | Resource not found |
/// | 409 | `Conflict` | Conflicts with existing state |
/// | 429 | `RateLimited` | Too many requests |
/// | 500 | `InternalError` | Internal server error |
/// | 502 | `Unavailable` | Bad gateway |
/// | 503 | `Unavailable` | Service unavailable |
/// | 504 | `Unavailable` | Gateway timeout |
/// | Other | `UnexpectedStatus` | Unexpected error |
#[must_use]
pub fn map_http_error_to_reason(status_code: u16) -> (&'static str, String) {
    match status_code {
        400 => (REASON_BAD_REQUEST, "Invalid request (400)".into()),
        401 => (REASON_AUTH_FAILED, "Authentication required (401)".into()),
        403 => (REASON_AUTH_FAILED, "Authorization failed (403)".into()),
        404 => (REASON_NOT_FOUND, "Resource not found (404)".into()),
        409 => (
            REASON_CONFLICT,
            "Request conflicts with existing state (409)".into(),
        ),
        429 => (REASON_RATE_LIMITED, "Rate limit exceeded (429)".into()),
        500 => (REASON_INTERNAL_ERROR, "Remote internal error (500)".into()),
        502 => (REASON_UNAVAILABLE, "Bad gateway (502)".into()),
        503 => (REASON_UNAVAILABLE, "Service unavailable (503)".into()),
        504 => (REASON_UNAVAILABLE, "Gateway timeout (504)".into()),
        _ => (
            REASON_UNEXPECTED,
            format!("Unexpected HTTP status ({status_code})"),
        ),
    }
}
