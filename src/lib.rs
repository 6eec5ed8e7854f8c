// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # Routeflare - Cluster Route to Cloudflare DNS Sync
//!
//! Routeflare keeps a Cloudflare zone in step with the HTTP routes published by
//! a cluster controller. Every route whose domain belongs to the cluster domain
//! gets a proxied CNAME record pointing at the cluster domain.
//!
//! ## Overview
//!
//! The work happens in periodic reconciliation passes:
//!
//! - Read every non-system application's routes from the controller
//! - Resolve the Cloudflare zone named like the cluster domain
//! - List the zone's records and create the ones that are missing
//!
//! Records are only ever added. Existing records, including ones for routes that
//! no longer exist, are left alone.
//!
//! ## Modules
//!
//! - [`config`] - Environment configuration
//! - [`controller`] - Controller client and desired route set
//! - [`provider`] - DNS provider abstraction
//! - [`cloudflare`] - Cloudflare API v4 provider
//! - [`reconciler`] - One reconciliation pass
//! - [`scheduler`] - Periodic pass driver with graceful shutdown
//! - [`sync_errors`] - Error types per pass stage
//!
//! ## Example
//!
//! ```rust,no_run
//! use routeflare::{config::Config, context::Context, reconciler::reconcile_once};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let ctx = Context::new(Config::from_env()?)?;
//! let outcome = reconcile_once(&ctx).await?;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```

pub mod cloudflare;
pub mod config;
pub mod constants;
pub mod context;
pub mod controller;
pub mod http;
pub mod http_errors;
pub mod provider;
pub mod reconciler;
pub mod retry;
pub mod scheduler;
pub mod sync_errors;

#[cfg(test)]
mod test_fakes;
