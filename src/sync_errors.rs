// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for a reconciliation pass.
//!
//! This module provides specialized error types for:
//! - Configuration problems (missing settings, cluster domain without a zone)
//! - Controller API failures while discovering routes
//! - Cloudflare API failures while resolving the zone or listing records
//! - Individual record creation failures
//!
//! Discovery-stage errors abort the current pass only and are carried by
//! [`SyncError`]. Record creation errors are contained per domain: they are
//! reported in the pass outcome and never abort a pass, so they have no
//! [`SyncError`] variant.

use thiserror::Error;

/// Errors raised while loading settings or matching them against the provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// One or more required environment variables are unset or empty
    #[error("Environment variable(s) not set: {}", .keys.join(", "))]
    MissingSettings {
        /// Every missing key, in lookup order
        keys: Vec<String>,
    },

    /// A setting is present but cannot be parsed
    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidSetting {
        /// The environment variable name
        key: String,
        /// The raw value that was rejected
        value: String,
        /// Explanation of what is invalid
        reason: String,
    },

    /// No Cloudflare zone is named exactly like the cluster domain
    ///
    /// Returned by zone resolution. The cluster domain must be a zone apex
    /// registered in the Cloudflare account.
    #[error("Cluster domain '{domain}' is not a valid Cloudflare zone")]
    ZoneNotFound {
        /// The configured cluster domain
        domain: String,
    },
}

/// Errors raised while reading applications and routes from the controller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControllerError {
    /// The application listing could not be fetched or decoded
    #[error("Failed to list applications from {endpoint}: {reason}")]
    ListAppsFailed {
        /// The controller URL that was queried
        endpoint: String,
        /// Underlying failure
        reason: String,
    },

    /// The routes of one application could not be fetched or decoded
    ///
    /// A single failure aborts route discovery for the whole pass.
    #[error("Failed to list routes for app '{app_id}' from {endpoint}: {reason}")]
    ListRoutesFailed {
        /// The application identifier
        app_id: String,
        /// The controller URL that was queried
        endpoint: String,
        /// Underlying failure
        reason: String,
    },
}

/// Errors raised by the DNS provider during the discovery stage.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The zone lookup request itself failed (network, auth, bad response)
    #[error("Failed to look up zone '{zone}': {reason}")]
    ZoneLookupFailed {
        /// The zone name that was looked up
        zone: String,
        /// Underlying failure
        reason: String,
    },

    /// The record listing for a resolved zone failed
    #[error("Failed to list DNS records in zone '{zone}' ({zone_id}): {reason}")]
    RecordListFailed {
        /// The zone name
        zone: String,
        /// The provider's zone identifier
        zone_id: String,
        /// Underlying failure
        reason: String,
    },
}

/// A single record creation was rejected or could not be sent.
///
/// These errors are logged and counted but never abort a pass; the next pass
/// sees the record still missing and tries again.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to create {record_type} record '{name}' in zone {zone_id}: {reason}")]
pub struct RecordCreateError {
    /// The record name (the route domain)
    pub name: String,
    /// The record type that was requested
    pub record_type: String,
    /// The provider's zone identifier
    pub zone_id: String,
    /// Underlying failure
    pub reason: String,
}

/// Composite error type for a failed reconciliation pass.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Settings or zone mapping problem
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Route discovery failure
    #[error(transparent)]
    Controller(#[from] ControllerError),

    /// Zone or record discovery failure
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl SyncError {
    /// Returns true if a later pass can be expected to succeed without operator action.
    ///
    /// Configuration errors need a fix from an operator; everything else depends on
    /// remote state that may recover on its own.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Config(_) => false,
            Self::Controller(_) | Self::Provider(_) => true,
        }
    }

    /// Name of the pass stage that produced this error, for log fields.
    #[must_use]
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Config(ConfigError::ZoneNotFound { .. }) => "zone-resolution",
            Self::Config(_) => "configuration",
            Self::Controller(_) => "route-discovery",
            Self::Provider(ProviderError::ZoneLookupFailed { .. }) => "zone-resolution",
            Self::Provider(ProviderError::RecordListFailed { .. }) => "record-listing",
        }
    }
}

#[cfg(test)]
#[path = "sync_errors_tests.rs"]
mod sync_errors_tests;
