// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Cloudflare API v4 implementation of [`DnsProvider`].
//!
//! # Endpoints
//!
//! | Operation | Request |
//! |-----------|---------|
//! | Zone lookup | `GET zones?name=<domain>` |
//! | Record listing | `GET zones/{id}/dns_records?page=N&per_page=100` |
//! | Record creation | `POST zones/{id}/dns_records` |
//!
//! Every response is wrapped in the `{success, errors, result, result_info}`
//! envelope. A response with `success: false` is a failure even when the HTTP
//! status is 200. Record listing walks all pages so callers always receive the
//! complete record set.
//!
//! Record creation treats Cloudflare error 81053 (name already taken) as
//! success: the name is present, which is all a pass compares on.

use crate::config::Config;
use crate::constants::{
    CF_AUTH_EMAIL_HEADER, CF_AUTH_KEY_HEADER, CF_RECORDS_PAGE_SIZE, CF_RECORD_ALREADY_EXISTS_CODE,
};
use crate::http::{build_http_client, request_json, HttpError};
use crate::provider::{DnsProvider, DnsRecord, NewDnsRecord, Zone};
use crate::sync_errors::{ProviderError, RecordCreateError};
use anyhow::{Context as _, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client as HttpClient, Method};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Response envelope shared by every Cloudflare endpoint.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
    #[serde(default)]
    result_info: Option<ResultInfo>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    message: String,
}

/// Pagination block of list responses.
#[derive(Debug, Deserialize)]
struct ResultInfo {
    #[serde(default)]
    page: u32,
    #[serde(default)]
    total_pages: u32,
}

/// Join envelope error messages into one line: `[code] message; [code] message`.
fn join_api_errors(errors: &[ApiMessage]) -> String {
    if errors.is_empty() {
        return "request unsuccessful without error details".to_string();
    }
    errors
        .iter()
        .map(|e| format!("[{}] {}", e.code, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// A failed call: the envelope's error codes, when there was one, and a readable reason.
#[derive(Debug)]
struct ApiFailure {
    codes: Vec<i64>,
    reason: String,
}

impl ApiFailure {
    fn from_reason(reason: String) -> Self {
        Self {
            codes: Vec::new(),
            reason,
        }
    }

    fn from_errors(errors: &[ApiMessage]) -> Self {
        Self {
            codes: errors.iter().map(|e| e.code).collect(),
            reason: join_api_errors(errors),
        }
    }

    /// Describe a failed HTTP call, preferring the envelope's error list over the raw body.
    fn from_http(err: &HttpError) -> Self {
        if let HttpError::Status {
            status, message, ..
        } = err
        {
            if let Ok(envelope) = serde_json::from_str::<Envelope<serde_json::Value>>(message) {
                if !envelope.errors.is_empty() {
                    let failure = Self::from_errors(&envelope.errors);
                    return Self {
                        reason: format!("HTTP {status}: {}", failure.reason),
                        ..failure
                    };
                }
            }
        }
        Self::from_reason(err.to_string())
    }

    fn has_code(&self, code: i64) -> bool {
        self.codes.contains(&code)
    }
}

/// HTTP client for the Cloudflare API.
#[derive(Debug, Clone)]
pub struct CloudflareClient {
    http: HttpClient,
    base_url: Url,
    headers: HeaderMap,
    retry_budget: Duration,
}

impl CloudflareClient {
    /// Build a client from the process configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or a credential is not
    /// a valid header value.
    pub fn new(config: &Config) -> Result<Self> {
        let http = build_http_client(config.http_timeout, false)
            .context("Failed to build Cloudflare HTTP client")?;

        let email = HeaderValue::from_str(&config.cloudflare.email)
            .context("CF_EMAIL is not a valid header value")?;
        let mut key = HeaderValue::from_str(&config.cloudflare.key)
            .context("CF_KEY is not a valid header value")?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static(CF_AUTH_EMAIL_HEADER), email);
        headers.insert(HeaderName::from_static(CF_AUTH_KEY_HEADER), key);

        Ok(Self {
            http,
            base_url: config.cloudflare_api_url.clone(),
            headers,
            retry_budget: config.http_retry_max_elapsed,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiFailure> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                ApiFailure::from_reason(format!("{} cannot be used as a base URL", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send one request and unwrap the envelope.
    async fn call<T, B>(
        &self,
        method: Method,
        url: &Url,
        body: Option<&B>,
    ) -> Result<(T, Option<ResultInfo>), ApiFailure>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let envelope: Envelope<T> = request_json(
            &self.http,
            method,
            url,
            &self.headers,
            body,
            self.retry_budget,
        )
        .await
        .map_err(|e| ApiFailure::from_http(&e))?;

        if !envelope.success {
            return Err(ApiFailure::from_errors(&envelope.errors));
        }
        let result = envelope
            .result
            .ok_or_else(|| ApiFailure::from_reason("response has no result".to_string()))?;
        Ok((result, envelope.result_info))
    }
}

#[async_trait::async_trait]
impl DnsProvider for CloudflareClient {
    async fn find_zones(&self, name: &str) -> Result<Vec<Zone>, ProviderError> {
        let failed = |failure: ApiFailure| ProviderError::ZoneLookupFailed {
            zone: name.to_string(),
            reason: failure.reason,
        };

        let mut url = self.endpoint(&["zones"]).map_err(failed)?;
        url.query_pairs_mut().append_pair("name", name);

        let (zones, _) = self
            .call::<Vec<Zone>, ()>(Method::GET, &url, None)
            .await
            .map_err(failed)?;
        debug!(zone = %name, matches = zones.len(), "Cloudflare zone lookup");
        Ok(zones)
    }

    async fn list_records(&self, zone: &Zone) -> Result<Vec<DnsRecord>, ProviderError> {
        let failed = |failure: ApiFailure| ProviderError::RecordListFailed {
            zone: zone.name.clone(),
            zone_id: zone.id.clone(),
            reason: failure.reason,
        };

        let mut records = Vec::new();
        let mut page: u32 = 1;
        loop {
            let mut url = self
                .endpoint(&["zones", &zone.id, "dns_records"])
                .map_err(failed)?;
            url.query_pairs_mut()
                .append_pair("page", &page.to_string())
                .append_pair("per_page", &CF_RECORDS_PAGE_SIZE.to_string());

            let (batch, info) = self
                .call::<Vec<DnsRecord>, ()>(Method::GET, &url, None)
                .await
                .map_err(failed)?;
            let batch_len = batch.len();
            records.extend(batch);

            let total_pages = info.map_or(page, |i| i.total_pages.max(i.page));
            debug!(
                zone = %zone.name,
                page = page,
                total_pages = total_pages,
                records = batch_len,
                "Fetched Cloudflare DNS record page"
            );
            if batch_len == 0 || page >= total_pages {
                break;
            }
            page += 1;
        }

        Ok(records)
    }

    async fn create_record(
        &self,
        zone: &Zone,
        record: &NewDnsRecord,
    ) -> Result<DnsRecord, RecordCreateError> {
        let failed = |failure: ApiFailure| RecordCreateError {
            name: record.name.clone(),
            record_type: record.record_type.clone(),
            zone_id: zone.id.clone(),
            reason: failure.reason,
        };

        let url = self
            .endpoint(&["zones", &zone.id, "dns_records"])
            .map_err(failed)?;
        match self
            .call::<DnsRecord, NewDnsRecord>(Method::POST, &url, Some(record))
            .await
        {
            Ok((created, _)) => Ok(created),
            // A retried POST whose first attempt landed, or a record added since listing
            Err(failure) if failure.has_code(CF_RECORD_ALREADY_EXISTS_CODE) => {
                debug!(
                    name = %record.name,
                    zone_id = %zone.id,
                    reason = %failure.reason,
                    "Record name already present in zone"
                );
                Ok(DnsRecord {
                    name: record.name.clone(),
                    record_type: record.record_type.clone(),
                    content: record.content.clone(),
                    proxied: record.proxied,
                })
            }
            Err(failure) => Err(failed(failure)),
        }
    }

    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }
}

#[cfg(test)]
#[path = "cloudflare_tests.rs"]
mod cloudflare_tests;
