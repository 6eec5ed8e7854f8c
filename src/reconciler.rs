// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! One reconciliation pass: controller routes in, missing DNS records out.
//!
//! A pass runs these stages in order and stops at the first stage error:
//!
//! 1. **Route discovery** - [`desired_domains`] reads the desired route set
//! 2. **Zone resolution** - [`resolve_zone`] finds the zone named exactly like
//!    the cluster domain
//! 3. **Record listing** - the provider returns every record in that zone
//! 4. **Apply** - [`apply_missing`] creates one proxied CNAME per missing domain
//!
//! An empty desired set ends the pass after stage 1. Stage 4 never fails the
//! pass: each creation is independent and failures are only logged and
//! reported in the [`PassOutcome`]. Existing records are never modified or
//! deleted, so running a pass twice against unchanged state creates nothing
//! the second time.

use crate::context::Context;
use crate::controller::desired_domains;
use crate::provider::{DnsProvider, DnsRecord, NewDnsRecord, Zone};
use crate::sync_errors::{ConfigError, RecordCreateError, SyncError};
use futures::future::join_all;
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

/// What a completed pass did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    /// The controller reported no routes for the cluster domain
    NoRoutes,

    /// Every desired domain already has a record
    UpToDate {
        /// Size of the desired route set
        desired: usize,
    },

    /// Creation was attempted for the missing domains
    Applied {
        /// Domains whose record was created, in desired order
        created: Vec<String>,
        /// Creations the provider rejected or that could not be sent
        failed: Vec<RecordCreateError>,
    },
}

/// Domains from `desired` that have no record of the same name in `actual`.
///
/// Only names are compared, ASCII case-insensitively; the type and target of an
/// existing record are not inspected. The result keeps the order of `desired`.
#[must_use]
pub fn missing_domains(desired: &[String], actual: &[DnsRecord]) -> Vec<String> {
    let existing: HashSet<String> = actual
        .iter()
        .map(|r| r.name.to_ascii_lowercase())
        .collect();
    desired
        .iter()
        .filter(|domain| !existing.contains(&domain.to_ascii_lowercase()))
        .cloned()
        .collect()
}

/// Find the provider zone whose name equals the cluster domain.
///
/// # Errors
///
/// Returns [`SyncError::Provider`] if the lookup request fails, or
/// [`SyncError::Config`] with [`ConfigError::ZoneNotFound`] if no returned
/// zone matches the name exactly.
pub async fn resolve_zone(
    provider: &dyn DnsProvider,
    cluster_domain: &str,
) -> Result<Zone, SyncError> {
    let zones = provider.find_zones(cluster_domain).await?;
    zones
        .into_iter()
        .find(|zone| zone.name == cluster_domain)
        .ok_or_else(|| {
            ConfigError::ZoneNotFound {
                domain: cluster_domain.to_string(),
            }
            .into()
        })
}

/// Create a proxied CNAME pointing at `target` for every domain in `missing`.
///
/// Creations run concurrently. Each failure is logged and collected; it does not
/// stop the others.
pub async fn apply_missing(
    provider: &dyn DnsProvider,
    zone: &Zone,
    missing: &[String],
    target: &str,
) -> (Vec<String>, Vec<RecordCreateError>) {
    let attempts = missing.iter().map(|domain| async move {
        let record = NewDnsRecord::proxied_cname(domain, target);
        let result = provider.create_record(zone, &record).await;
        (domain, result)
    });

    let mut created = Vec::new();
    let mut failed = Vec::new();
    for (domain, result) in join_all(attempts).await {
        match result {
            Ok(_) => {
                info!(domain = %domain, zone_id = %zone.id, "dns record {} added", domain);
                created.push(domain.clone());
            }
            Err(e) => {
                error!(domain = %domain, zone_id = %zone.id, error = %e, "Failed to add dns record");
                failed.push(e);
            }
        }
    }
    (created, failed)
}

/// Run one full reconciliation pass.
///
/// # Errors
///
/// Returns the first route discovery, zone resolution or record listing error.
/// Record creation failures are reported in [`PassOutcome::Applied`] instead.
pub async fn reconcile_once(ctx: &Context) -> Result<PassOutcome, SyncError> {
    let cluster_domain = ctx.config.cluster_domain.as_str();
    let provider = ctx.provider.as_ref();

    let desired = desired_domains(ctx.routes.as_ref(), cluster_domain).await?;
    if desired.is_empty() {
        info!(cluster_domain = %cluster_domain, "no routes found on cluster");
        return Ok(PassOutcome::NoRoutes);
    }
    info!(cluster_domain = %cluster_domain, "{} routes found on cluster", desired.len());

    let zone = resolve_zone(provider, cluster_domain).await?;
    debug!(zone = %zone.name, zone_id = %zone.id, "Resolved zone for cluster domain");

    let records = provider.list_records(&zone).await?;
    debug!(zone_id = %zone.id, records = records.len(), "Listed zone records");

    let missing = missing_domains(&desired, &records);
    if missing.is_empty() {
        info!(zone_id = %zone.id, "{} is up to date", provider.provider_name());
        return Ok(PassOutcome::UpToDate {
            desired: desired.len(),
        });
    }
    info!(zone_id = %zone.id, "dns records to create: {}", missing.join(", "));

    let (created, failed) = apply_missing(provider, &zone, &missing, cluster_domain).await;
    if failed.is_empty() {
        info!(zone_id = %zone.id, created = created.len(), "records updated successfully");
    } else {
        warn!(
            zone_id = %zone.id,
            created = created.len(),
            failed = failed.len(),
            "Some dns records could not be created; they will be retried next pass"
        );
    }

    Ok(PassOutcome::Applied { created, failed })
}

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod reconciler_tests;
