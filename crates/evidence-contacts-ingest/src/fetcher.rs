// Copyright 2026 Evidence Contacts Contributors
// SPDX-License-Identifier: Apache-2.0

//! Static page fetching.

use crate::config::{IngestConfig, ROBOTS_AGENT};
use crate::error::IngestError;
use crate::http_client::{HttpClient, HttpResponse};
use crate::robots::RobotsCache;
use async_trait::async_trait;
use evidence_contacts::FetchResult;

/// Source of static page fetches.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch with the configured static timeout.
    async fn fetch(&self, url: &str) -> Result<FetchResult, IngestError>;
    /// Fetch with an explicit timeout (profile follow-ups).
    async fn fetch_with_timeout(&self, url: &str, timeout_ms: u64)
        -> Result<FetchResult, IngestError>;
}

/// Lower-cased MIME type without parameters.
pub fn parse_mime(content_type: Option<&str>) -> Option<String> {
    content_type
        .and_then(|ct| ct.split(';').next())
        .map(|m| m.trim().to_ascii_lowercase())
        .filter(|m| !m.is_empty())
}

fn to_fetch_result(resp: HttpResponse) -> FetchResult {
    let mime = parse_mime(resp.content_type.as_deref());
    let content_length = resp.body.len();
    let html = (mime.as_deref() == Some("text/html")).then_some(resp.body);
    FetchResult {
        url: resp.final_url,
        status_code: resp.status,
        mime,
        content_length,
        html,
        blocked_by_robots: false,
    }
}

/// reqwest-backed fetcher honoring robots.txt.
pub struct StaticFetcher {
    client: HttpClient,
    robots: Option<RobotsCache>,
    timeout_ms: u64,
}

impl StaticFetcher {
    pub fn new(config: &IngestConfig) -> Self {
        let client = HttpClient::new(&config.user_agent, config.static_timeout_ms);
        let robots = config
            .respect_robots
            .then(|| RobotsCache::new(client.clone(), ROBOTS_AGENT));
        Self {
            client,
            robots,
            timeout_ms: config.static_timeout_ms,
        }
    }

    pub fn with_client(mut self, client: HttpClient) -> Self {
        if self.robots.is_some() {
            self.robots = Some(RobotsCache::new(client.clone(), ROBOTS_AGENT));
        }
        self.client = client;
        self
    }
}

#[async_trait]
impl PageFetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResult, IngestError> {
        self.fetch_with_timeout(url, self.timeout_ms).await
    }

    async fn fetch_with_timeout(
        &self,
        url: &str,
        timeout_ms: u64,
    ) -> Result<FetchResult, IngestError> {
        if url::Url::parse(url).is_err() {
            return Err(IngestError::InvalidUrl(url.to_string()));
        }
        if let Some(robots) = &self.robots {
            if !robots.allowed(url).await {
                return Ok(FetchResult::blocked(url));
            }
        }

        let resp = self.client.get(url, timeout_ms).await.map_err(|e| {
            let timed_out = e
                .downcast_ref::<reqwest::Error>()
                .is_some_and(reqwest::Error::is_timeout);
            if timed_out {
                IngestError::Timeout(timeout_ms)
            } else {
                IngestError::Fetch(format!("{e:#}"))
            }
        })?;

        let result = to_fetch_result(resp);
        tracing::debug!(
            "fetched {url}: status={} mime={:?} bytes={}",
            result.status_code,
            result.mime,
            result.content_length
        );
        Ok(result)
    }
}
