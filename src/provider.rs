// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! DNS provider abstraction.
//!
//! The reconciler only needs three provider operations: find zones by name,
//! list the records of a zone, and create one record. [`DnsProvider`] captures
//! exactly those so the pass logic can run against Cloudflare in production and
//! against in-memory fakes in tests.

use crate::constants::DNS_RECORD_TYPE_CNAME;
use crate::sync_errors::{ProviderError, RecordCreateError};
use serde::{Deserialize, Serialize};

/// A provider zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    /// Opaque provider identifier scoping record operations
    pub id: String,
    /// Zone apex name
    pub name: String,
}

/// A DNS record as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Fully-qualified record name
    pub name: String,
    /// Record type (`A`, `CNAME`, `TXT`, ...)
    #[serde(rename = "type")]
    pub record_type: String,
    /// Record target
    pub content: String,
    /// Whether traffic is proxied through the provider
    #[serde(default)]
    pub proxied: bool,
}

/// Request body for creating a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewDnsRecord {
    /// Record type
    #[serde(rename = "type")]
    pub record_type: String,
    /// Fully-qualified record name
    pub name: String,
    /// Record target
    pub content: String,
    /// Whether traffic is proxied through the provider
    pub proxied: bool,
}

impl NewDnsRecord {
    /// Alias record pointing `name` at `target`, proxied through the provider.
    #[must_use]
    pub fn proxied_cname(name: &str, target: &str) -> Self {
        Self {
            record_type: DNS_RECORD_TYPE_CNAME.to_string(),
            name: name.to_string(),
            content: target.to_string(),
            proxied: true,
        }
    }
}

/// Operations the reconciler needs from a DNS provider.
///
/// Implementations must be safe to share across concurrent tasks; record
/// creations for different domains are issued in parallel.
#[async_trait::async_trait]
pub trait DnsProvider: Send + Sync {
    /// Return every zone the provider reports for a name lookup.
    ///
    /// The provider may return loose matches; callers filter by exact name.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::ZoneLookupFailed`] if the lookup request fails.
    async fn find_zones(&self, name: &str) -> Result<Vec<Zone>, ProviderError>;

    /// Return the complete record set of a zone.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::RecordListFailed`] if any page cannot be fetched.
    async fn list_records(&self, zone: &Zone) -> Result<Vec<DnsRecord>, ProviderError>;

    /// Create one record in a zone.
    ///
    /// # Errors
    ///
    /// Returns [`RecordCreateError`] if the provider rejects the record or the
    /// request cannot be sent.
    async fn create_record(
        &self,
        zone: &Zone,
        record: &NewDnsRecord,
    ) -> Result<DnsRecord, RecordCreateError>;

    /// Provider name for log lines.
    fn provider_name(&self) -> &'static str;
}
