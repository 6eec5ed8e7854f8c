// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory controller and provider doubles for unit tests.

use crate::config::Config;
use crate::controller::{App, Route, RouteSource};
use crate::provider::{DnsProvider, DnsRecord, NewDnsRecord, Zone};
use crate::sync_errors::{ControllerError, ProviderError, RecordCreateError};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Configuration for cluster domain `example.com` with retries disabled.
pub fn test_config() -> Config {
    Config::from_lookup(|key| match key {
        "CLUSTER_DOMAIN" => Some("example.com".to_string()),
        "CONTROLLER_AUTH_KEY" => Some("secret".to_string()),
        "CF_EMAIL" => Some("ops@example.com".to_string()),
        "CF_KEY" => Some("cf-key".to_string()),
        "HTTP_RETRY_MAX_ELAPSED_SECS" => Some("0".to_string()),
        _ => None,
    })
    .expect("test config")
}

pub fn app(id: &str) -> App {
    App {
        id: id.to_string(),
        name: Some(id.to_string()),
        meta: None,
    }
}

pub fn system_app(id: &str) -> App {
    let mut meta = HashMap::new();
    meta.insert(
        "flynn-system-app".to_string(),
        serde_json::Value::String("true".to_string()),
    );
    App {
        id: id.to_string(),
        name: Some(id.to_string()),
        meta: Some(meta),
    }
}

pub fn route(domain: &str) -> Route {
    Route {
        domain: Some(domain.to_string()),
    }
}

pub fn record(name: &str, record_type: &str, content: &str) -> DnsRecord {
    DnsRecord {
        name: name.to_string(),
        record_type: record_type.to_string(),
        content: content.to_string(),
        proxied: false,
    }
}

/// Controller double keyed by app id.
#[derive(Default)]
pub struct FakeRouteSource {
    pub apps: Vec<App>,
    pub routes: HashMap<String, Vec<Route>>,
    pub failing_apps: HashSet<String>,
    pub fail_list_apps: bool,
    pub route_calls: Mutex<Vec<String>>,
}

impl FakeRouteSource {
    pub fn with_app(mut self, app: App, routes: Vec<Route>) -> Self {
        self.routes.insert(app.id.clone(), routes);
        self.apps.push(app);
        self
    }

    pub fn route_calls(&self) -> Vec<String> {
        self.route_calls.lock().expect("lock").clone()
    }
}

#[async_trait::async_trait]
impl RouteSource for FakeRouteSource {
    async fn list_apps(&self) -> Result<Vec<App>, ControllerError> {
        if self.fail_list_apps {
            return Err(ControllerError::ListAppsFailed {
                endpoint: "fake".to_string(),
                reason: "connection refused".to_string(),
            });
        }
        Ok(self.apps.clone())
    }

    async fn list_routes(&self, app_id: &str) -> Result<Vec<Route>, ControllerError> {
        self.route_calls
            .lock()
            .expect("lock")
            .push(app_id.to_string());
        if self.failing_apps.contains(app_id) {
            return Err(ControllerError::ListRoutesFailed {
                app_id: app_id.to_string(),
                endpoint: "fake".to_string(),
                reason: "HTTP 500".to_string(),
            });
        }
        Ok(self.routes.get(app_id).cloned().unwrap_or_default())
    }
}

/// Provider double that remembers created records.
#[derive(Default)]
pub struct FakeDnsProvider {
    pub zones: Vec<Zone>,
    pub records: Mutex<Vec<DnsRecord>>,
    pub rejected_names: HashSet<String>,
    pub fail_zone_lookup: bool,
    pub fail_list_records: bool,
    pub zone_lookups: AtomicUsize,
    pub record_listings: AtomicUsize,
    pub created: Mutex<Vec<(String, NewDnsRecord)>>,
}

impl FakeDnsProvider {
    pub fn with_zone(id: &str, name: &str) -> Self {
        Self {
            zones: vec![Zone {
                id: id.to_string(),
                name: name.to_string(),
            }],
            ..Self::default()
        }
    }

    pub fn with_records(self, records: Vec<DnsRecord>) -> Self {
        *self.records.lock().expect("lock") = records;
        self
    }

    pub fn rejecting(mut self, name: &str) -> Self {
        self.rejected_names.insert(name.to_string());
        self
    }

    pub fn records(&self) -> Vec<DnsRecord> {
        self.records.lock().expect("lock").clone()
    }

    pub fn created(&self) -> Vec<(String, NewDnsRecord)> {
        self.created.lock().expect("lock").clone()
    }

    pub fn created_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .created()
            .into_iter()
            .map(|(_, record)| record.name)
            .collect();
        names.sort();
        names
    }

    pub fn zone_lookups(&self) -> usize {
        self.zone_lookups.load(Ordering::SeqCst)
    }

    pub fn record_listings(&self) -> usize {
        self.record_listings.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl DnsProvider for FakeDnsProvider {
    async fn find_zones(&self, name: &str) -> Result<Vec<Zone>, ProviderError> {
        self.zone_lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail_zone_lookup {
            return Err(ProviderError::ZoneLookupFailed {
                zone: name.to_string(),
                reason: "HTTP 403".to_string(),
            });
        }
        Ok(self.zones.clone())
    }

    async fn list_records(&self, zone: &Zone) -> Result<Vec<DnsRecord>, ProviderError> {
        self.record_listings.fetch_add(1, Ordering::SeqCst);
        if self.fail_list_records {
            return Err(ProviderError::RecordListFailed {
                zone: zone.name.clone(),
                zone_id: zone.id.clone(),
                reason: "HTTP 500".to_string(),
            });
        }
        Ok(self.records())
    }

    async fn create_record(
        &self,
        zone: &Zone,
        new_record: &NewDnsRecord,
    ) -> Result<DnsRecord, RecordCreateError> {
        if self.rejected_names.contains(&new_record.name) {
            return Err(RecordCreateError {
                name: new_record.name.clone(),
                record_type: new_record.record_type.clone(),
                zone_id: zone.id.clone(),
                reason: "HTTP 400: invalid record".to_string(),
            });
        }

        let created = DnsRecord {
            name: new_record.name.clone(),
            record_type: new_record.record_type.clone(),
            content: new_record.content.clone(),
            proxied: new_record.proxied,
        };
        self.created
            .lock()
            .expect("lock")
            .push((zone.id.clone(), new_record.clone()));
        self.records.lock().expect("lock").push(created.clone());
        Ok(created)
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}
