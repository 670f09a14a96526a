// Copyright 2026 Evidence Contacts Contributors
// SPDX-License-Identifier: Apache-2.0

//! Rendered-page extraction.
//!
//! One browser context per call: navigate, wait for team-like sections,
//! run the in-page sweep, and fall back to card extraction over the
//! rendered DOM when the sweep finds nothing. The context is closed on
//! every path.

use crate::config::IngestConfig;
use crate::renderer::{RenderContext, Renderer};
use anyhow::{Context, Result};
use evidence_contacts::{ContactAttributor, PageExtraction, SiteTally, SweepReport, SWEEP_SCRIPT};
use std::sync::Arc;
use std::time::Duration;

/// Sections worth waiting for before sweeping.
pub const SETTLE_SELECTOR: &str = "section, .team, [class*='team'], [class*='member'], article";

const SETTLE_PAUSE_MS: u64 = 200;

/// What a rendered extraction produced.
#[derive(Debug, Clone, Default)]
pub struct RenderedPage {
    pub extraction: PageExtraction,
    /// URL the browser ended up on.
    pub final_url: String,
    /// Whether the sweep (rather than card extraction) produced the contacts.
    pub via_sweep: bool,
}

pub struct HeadlessExtractor {
    renderer: Arc<dyn Renderer>,
    attributor: ContactAttributor,
    navigation_timeout_ms: u64,
    settle_timeout_ms: u64,
    sweep_budget_ms: u64,
}

impl HeadlessExtractor {
    pub fn new(
        renderer: Arc<dyn Renderer>,
        attributor: ContactAttributor,
        config: &IngestConfig,
    ) -> Self {
        Self {
            renderer,
            attributor,
            navigation_timeout_ms: config.headless_timeout_ms,
            settle_timeout_ms: config.settle_timeout_ms,
            sweep_budget_ms: config.sweep_budget_ms,
        }
    }

    /// Render `url` in a fresh context and extract contacts from it.
    pub async fn extract(&self, url: &str, tally: &SiteTally) -> Result<RenderedPage> {
        let mut ctx = self
            .renderer
            .new_context()
            .await
            .context("failed to open browser context")?;

        let result = self.extract_in(&mut *ctx, url, tally).await;

        if let Err(e) = ctx.close().await {
            tracing::warn!("failed to close browser context for {url}: {e:#}");
        }
        result
    }

    async fn extract_in(
        &self,
        ctx: &mut dyn RenderContext,
        url: &str,
        tally: &SiteTally,
    ) -> Result<RenderedPage> {
        let nav = ctx
            .navigate(url, self.navigation_timeout_ms)
            .await
            .with_context(|| format!("navigating to {url}"))?;
        let source_url = if nav.final_url.starts_with("http") {
            nav.final_url.clone()
        } else {
            url.to_string()
        };
        tracing::debug!("rendered {url} in {}ms", nav.load_time_ms);

        let settled = ctx
            .wait_for_selector(SETTLE_SELECTOR, self.settle_timeout_ms)
            .await
            .unwrap_or(false);
        if !settled {
            tracing::debug!("no team-like section appeared on {url}");
        }
        tokio::time::sleep(Duration::from_millis(SETTLE_PAUSE_MS)).await;

        if let Some(report) = self.sweep(ctx, url).await {
            let extraction = self.attributor.contacts_from_sweep(&report, &source_url, tally);
            if !extraction.contacts.is_empty() {
                tracing::debug!("sweep found {} contacts on {url}", extraction.contacts.len());
                return Ok(RenderedPage {
                    extraction,
                    final_url: nav.final_url,
                    via_sweep: true,
                });
            }
        }

        let html = ctx.get_html().await.context("failed to read rendered DOM")?;
        let extraction = self.attributor.extract_rendered(&html, &source_url, tally);
        Ok(RenderedPage {
            extraction,
            final_url: nav.final_url,
            via_sweep: false,
        })
    }

    async fn sweep(&self, ctx: &dyn RenderContext, url: &str) -> Option<SweepReport> {
        let budget = Duration::from_millis(self.sweep_budget_ms);
        match tokio::time::timeout(budget, ctx.execute_js(SWEEP_SCRIPT)).await {
            Ok(Ok(value)) => match serde_json::from_value::<SweepReport>(value) {
                Ok(report) => Some(report),
                Err(e) => {
                    tracing::debug!("sweep report on {url} did not decode: {e}");
                    None
                }
            },
            Ok(Err(e)) => {
                tracing::debug!("sweep script failed on {url}: {e:#}");
                None
            }
            Err(_) => {
                tracing::debug!("sweep exceeded {}ms on {url}", self.sweep_budget_ms);
                None
            }
        }
    }
}
