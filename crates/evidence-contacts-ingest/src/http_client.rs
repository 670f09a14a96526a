// Copyright 2026 Evidence Contacts Contributors
// SPDX-License-Identifier: Apache-2.0

//! Async HTTP client wrapping reqwest.
//!
//! Plain GETs with a crawler UA and limited redirects. 5xx answers are
//! retried and 429 answers honor `Retry-After`, all inside the caller's
//! timeout. Transport errors and timeouts are returned, not retried.

use anyhow::{Context, Result};
use std::time::{Duration, Instant};

const MAX_REDIRECTS: usize = 5;
const DEFAULT_MAX_RETRIES: u32 = 2;
const MAX_RETRY_AFTER_SECS: u64 = 10;

/// Response from a GET request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Requested URL.
    pub url: String,
    /// Final URL after redirects.
    pub final_url: String,
    pub status: u16,
    /// Raw `Content-Type` header.
    pub content_type: Option<String>,
    pub body: String,
}

#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    /// HTTP/1.1-only fallback for servers that reject HTTP/2.
    h1_client: reqwest::Client,
    max_retries: u32,
}

impl HttpClient {
    pub fn new(user_agent: &str, timeout_ms: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(user_agent)
            .build()
            .unwrap_or_default();

        let h1_client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(user_agent)
            .http1_only()
            .build()
            .unwrap_or_default();

        Self {
            client,
            h1_client,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Retries for 5xx/429 answers (0 disables).
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// GET with retry on 5xx and backoff on 429.
    ///
    /// `timeout_ms` bounds the whole call: every attempt, backoff sleep and
    /// the HTTP/1.1 fallback share one deadline. A retry whose backoff would
    /// run past it is skipped and the last answer is returned instead.
    pub async fn get(&self, url: &str, timeout_ms: u64) -> Result<HttpResponse> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        match self.get_inner(&self.client, url, deadline).await {
            Ok(resp) => Ok(resp),
            Err(e) => {
                let err_str = format!("{e:#}");
                if err_str.contains("http2")
                    || err_str.contains("protocol")
                    || err_str.contains("connection closed")
                {
                    tracing::debug!("retrying {url} over HTTP/1.1: {err_str}");
                    self.get_inner(&self.h1_client, url, deadline).await
                } else {
                    Err(e)
                }
            }
        }
    }

    async fn get_inner(
        &self,
        client: &reqwest::Client,
        url: &str,
        deadline: Instant,
    ) -> Result<HttpResponse> {
        let mut retries = 0u32;

        loop {
            let r = client
                .get(url)
                .timeout(deadline.saturating_duration_since(Instant::now()))
                .send()
                .await
                .with_context(|| format!("GET {url}"))?;

            let status = r.status().as_u16();
            let delay = match status {
                s if s >= 500 => Some(Duration::from_millis(500 * 2u64.pow(retries))),
                429 => {
                    let retry_after = r
                        .headers()
                        .get("retry-after")
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.trim().parse::<u64>().ok())
                        .unwrap_or(2);
                    Some(Duration::from_secs(retry_after.min(MAX_RETRY_AFTER_SECS)))
                }
                _ => None,
            };

            if let Some(delay) = delay.filter(|_| retries < self.max_retries) {
                if delay < deadline.saturating_duration_since(Instant::now()) {
                    retries += 1;
                    tracing::debug!("{url} answered {status}; retry {retries} in {delay:?}");
                    tokio::time::sleep(delay).await;
                    continue;
                }
                tracing::debug!("{url} answered {status}; no time left to retry");
            }

            let final_url = r.url().to_string();
            let content_type = r
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = r
                .text()
                .await
                .with_context(|| format!("reading body of {url}"))?;

            return Ok(HttpResponse {
                url: url.to_string(),
                final_url,
                status,
                content_type,
                body,
            });
        }
    }
}
