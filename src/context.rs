// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared context for reconciliation passes.
//!
//! Every pass receives the same `Context`, built once at startup. It holds:
//! - The immutable process configuration
//! - The route source (the cluster controller)
//! - The DNS provider (Cloudflare)
//!
//! Nothing in the context is mutated between passes; each pass re-reads remote
//! state from scratch.

use crate::cloudflare::CloudflareClient;
use crate::config::Config;
use crate::controller::{ControllerClient, RouteSource};
use crate::provider::DnsProvider;
use anyhow::Result;
use std::sync::Arc;

/// Shared context passed to every reconciliation pass.
#[derive(Clone)]
pub struct Context {
    /// Process configuration
    pub config: Arc<Config>,

    /// Where the desired route set comes from
    pub routes: Arc<dyn RouteSource>,

    /// Where DNS records are read and created
    pub provider: Arc<dyn DnsProvider>,
}

impl Context {
    /// Build the production context: controller and Cloudflare HTTP clients.
    ///
    /// # Errors
    ///
    /// Returns an error if either HTTP client cannot be built.
    pub fn new(config: Config) -> Result<Self> {
        let routes = ControllerClient::new(&config)?;
        let provider = CloudflareClient::new(&config)?;
        Ok(Self::with_clients(
            config,
            Arc::new(routes),
            Arc::new(provider),
        ))
    }

    /// Build a context around already constructed collaborators.
    #[must_use]
    pub fn with_clients(
        config: Config,
        routes: Arc<dyn RouteSource>,
        provider: Arc<dyn DnsProvider>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            routes,
            provider,
        }
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .field("provider", &self.provider.provider_name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod context_tests;
