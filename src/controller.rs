// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Route discovery against the cluster controller.
//!
//! The controller exposes every application (`GET /apps`) and the routes of one
//! application (`GET /apps/{id}/routes`). [`desired_domains`] turns those into the
//! desired route set for a pass:
//!
//! 1. list applications once
//! 2. drop system applications (metadata `flynn-system-app`)
//! 3. fetch the routes of the remaining applications concurrently
//! 4. keep HTTP route domains that contain the cluster domain
//! 5. collapse duplicates (ignoring ASCII case), keeping first-seen order
//!
//! A failure fetching any application's routes fails the whole discovery.

use crate::config::Config;
use crate::constants::{CONTROLLER_APPS_PATH, SYSTEM_APP_META_KEY};
use crate::http::{build_http_client, request_json};
use crate::sync_errors::ControllerError;
use anyhow::{Context as _, Result};
use futures::future::try_join_all;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client as HttpClient, Method};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// An application registered with the controller.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct App {
    /// Controller identifier
    pub id: String,
    /// Human-readable name, when the controller reports one
    #[serde(default)]
    pub name: Option<String>,
    /// Free-form metadata; the controller sends `null` for apps without any
    #[serde(default)]
    pub meta: Option<HashMap<String, serde_json::Value>>,
}

impl App {
    /// Whether the metadata marks this app as cluster infrastructure.
    ///
    /// Accepts a JSON `true` or the string `"true"` (any case), which is how the
    /// controller serializes its string-valued metadata.
    #[must_use]
    pub fn is_system_app(&self) -> bool {
        match self.meta.as_ref().and_then(|m| m.get(SYSTEM_APP_META_KEY)) {
            Some(serde_json::Value::Bool(flag)) => *flag,
            Some(serde_json::Value::String(flag)) => flag.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// A route of one application.
///
/// TCP routes carry a port instead of a domain and are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Route {
    /// Public hostname for HTTP routes
    #[serde(default)]
    pub domain: Option<String>,
}

/// Read access to the controller's applications and routes.
#[async_trait::async_trait]
pub trait RouteSource: Send + Sync {
    /// List every application.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::ListAppsFailed`] on any request or decode failure.
    async fn list_apps(&self) -> Result<Vec<App>, ControllerError>;

    /// List the routes of one application.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::ListRoutesFailed`] on any request or decode failure.
    async fn list_routes(&self, app_id: &str) -> Result<Vec<Route>, ControllerError>;
}

/// Whether a route domain belongs to the managed cluster domain.
///
/// This is plain substring containment, so `shop.example.com.evil.net` matches
/// `example.com`. [`desired_domains`] warns about such matches.
#[must_use]
pub fn domain_in_cluster(domain: &str, cluster_domain: &str) -> bool {
    domain.contains(cluster_domain)
}

/// Whether `domain` is the cluster domain or a subdomain of it, label-wise.
#[must_use]
pub fn is_label_suffix(domain: &str, cluster_domain: &str) -> bool {
    domain == cluster_domain
        || domain
            .strip_suffix(cluster_domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Build the desired route set for one pass.
///
/// # Errors
///
/// Returns the first [`ControllerError`] raised by the app listing or any route listing.
pub async fn desired_domains(
    source: &dyn RouteSource,
    cluster_domain: &str,
) -> Result<Vec<String>, ControllerError> {
    let apps = source.list_apps().await?;
    debug!(apps = apps.len(), "Fetched applications from controller");

    let user_apps: Vec<&App> = apps
        .iter()
        .filter(|app| {
            let system = app.is_system_app();
            if system {
                debug!(app = %app.label(), "Skipping system application");
            }
            !system
        })
        .collect();

    let routes_per_app = try_join_all(user_apps.iter().map(|app| async move {
        let routes = source.list_routes(&app.id).await?;
        debug!(app = %app.label(), routes = routes.len(), "Fetched application routes");
        Ok::<_, ControllerError>(routes)
    }))
    .await?;

    let mut seen = HashSet::new();
    let mut domains = Vec::new();
    for domain in routes_per_app
        .into_iter()
        .flatten()
        .filter_map(|route| route.domain)
    {
        if !domain_in_cluster(&domain, cluster_domain) {
            continue;
        }
        if !is_label_suffix(&domain, cluster_domain) {
            warn!(
                domain = %domain,
                cluster_domain = %cluster_domain,
                "Route domain contains the cluster domain but is not a subdomain of it"
            );
        }
        if seen.insert(domain.to_ascii_lowercase()) {
            domains.push(domain);
        }
    }

    Ok(domains)
}

/// HTTP client for the controller API.
#[derive(Debug, Clone)]
pub struct ControllerClient {
    http: HttpClient,
    base_url: Url,
    headers: HeaderMap,
    retry_budget: Duration,
}

impl ControllerClient {
    /// Build a client from the process configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the precomputed
    /// authorization value is not a valid header.
    pub fn new(config: &Config) -> Result<Self> {
        let http = build_http_client(config.http_timeout, config.controller_tls_insecure)
            .context("Failed to build controller HTTP client")?;

        let mut auth = HeaderValue::from_str(&config.controller_authorization)
            .context("Controller authorization is not a valid header value")?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        Ok(Self {
            http,
            base_url: config.controller_url.clone(),
            headers,
            retry_budget: config.http_retry_max_elapsed,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, String> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| format!("{} cannot be used as a base URL", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait::async_trait]
impl RouteSource for ControllerClient {
    async fn list_apps(&self) -> Result<Vec<App>, ControllerError> {
        let failed = |reason: String| ControllerError::ListAppsFailed {
            endpoint: self.base_url.to_string(),
            reason,
        };

        let url = self.endpoint(&[CONTROLLER_APPS_PATH]).map_err(failed)?;
        request_json(
            &self.http,
            Method::GET,
            &url,
            &self.headers,
            None::<&()>,
            self.retry_budget,
        )
        .await
        .map_err(|e| failed(e.to_string()))
    }

    async fn list_routes(&self, app_id: &str) -> Result<Vec<Route>, ControllerError> {
        let failed = |reason: String| ControllerError::ListRoutesFailed {
            app_id: app_id.to_string(),
            endpoint: self.base_url.to_string(),
            reason,
        };

        let url = self
            .endpoint(&[CONTROLLER_APPS_PATH, app_id, "routes"])
            .map_err(failed)?;
        request_json(
            &self.http,
            Method::GET,
            &url,
            &self.headers,
            None::<&()>,
            self.retry_budget,
        )
        .await
        .map_err(|e| failed(e.to_string()))
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod controller_tests;
