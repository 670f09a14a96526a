// Copyright 2026 Evidence Contacts Contributors
// SPDX-License-Identifier: Apache-2.0

//! Per-URL ingest orchestration.
//!
//! fetch → robots/HTTP checks → static extraction → escalation decision →
//! budget gate → rendered extraction, with every failure turned into fields
//! of the returned [`IngestResult`].

use crate::budget::{BudgetGate, BudgetSnapshot};
use crate::config::IngestConfig;
use crate::discovery::{discover_links, expand_candidate_urls, normalize_url, MAX_DISCOVERED_LINKS};
use crate::error::IngestError;
use crate::fetcher::{PageFetcher, StaticFetcher};
use crate::follow_up::{follow_leads, FollowUpBudget};
use crate::headless::HeadlessExtractor;
use crate::renderer::chromium::ChromiumRenderer;
use crate::renderer::{NoopRenderer, Renderer};
use evidence_contacts::normalize::{is_listing_url, site_host};
use evidence_contacts::{
    count_person_containers, dedupe_contacts, Contact, ContactAttributor, EscalationDecision,
    EscalationEngine, FetchMethod, FetchResult, IngestResult, ProfileLead, SiteTally,
    TARGET_URL_NO_CONTACTS,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::Instrument;

pub struct IngestPipeline {
    config: IngestConfig,
    fetcher: Arc<dyn PageFetcher>,
    attributor: ContactAttributor,
    engine: EscalationEngine,
    headless: HeadlessExtractor,
    budget: Arc<BudgetGate>,
    tally: Mutex<SiteTally>,
}

impl IngestPipeline {
    pub fn new(
        config: IngestConfig,
        fetcher: Arc<dyn PageFetcher>,
        renderer: Arc<dyn Renderer>,
    ) -> Self {
        let budget = Arc::new(BudgetGate::new(
            config.max_headless_pct,
            config.domain_cap,
            config.global_cap,
        ));
        Self::with_budget(config, fetcher, renderer, budget)
    }

    /// Share a budget gate with other pipelines in the same process.
    pub fn with_budget(
        config: IngestConfig,
        fetcher: Arc<dyn PageFetcher>,
        renderer: Arc<dyn Renderer>,
        budget: Arc<BudgetGate>,
    ) -> Self {
        let attributor = ContactAttributor::new(config.attributor_config());
        let headless = HeadlessExtractor::new(renderer, attributor.clone(), &config);
        Self {
            config,
            fetcher,
            attributor,
            engine: EscalationEngine::new(),
            headless,
            budget,
            tally: Mutex::new(SiteTally::new()),
        }
    }

    /// Static fetcher plus Chromium when headless is enabled and a binary is
    /// found; otherwise every escalation degrades to the static result.
    pub fn from_config(config: IngestConfig) -> Self {
        let fetcher: Arc<dyn PageFetcher> = Arc::new(StaticFetcher::new(&config));
        let renderer: Arc<dyn Renderer> = if config.headless_enabled {
            match ChromiumRenderer::new(config.user_agent.clone()) {
                Ok(r) => Arc::new(r),
                Err(e) => {
                    tracing::warn!("{e:#}; running static-only");
                    Arc::new(NoopRenderer)
                }
            }
        } else {
            Arc::new(NoopRenderer)
        };
        Self::new(config, fetcher, renderer)
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    pub fn budget(&self) -> &BudgetGate {
        &self.budget
    }

    pub fn budget_snapshot(&self, domain: &str) -> BudgetSnapshot {
        self.budget.snapshot(domain)
    }

    /// Copy of the run's foreign-domain tally.
    pub fn site_tally(&self) -> SiteTally {
        self.tally.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// Record one page's foreign-domain counts. A page extracted twice
    /// (static, then rendered) keeps only its latest counts.
    fn record_tally(&self, page_url: &str, counts: &HashMap<String, usize>) {
        let site = site_host(page_url).unwrap_or_default();
        self.tally
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .record_page(&site, page_url, counts);
    }

    // ── Ingest ───────────────────────────────────────

    /// Process one URL. Never fails: every error lands in the result.
    pub async fn ingest(&self, url: &str) -> IngestResult {
        let start = Instant::now();
        let domain = site_host(url).unwrap_or_else(|| url.trim().to_lowercase());
        let span = tracing::info_span!("ingest", url = %url, domain = %domain);

        let mut result = self.ingest_inner(url, &domain).instrument(span.clone()).await;
        result.elapsed_ms = start.elapsed().as_millis() as u64;

        let _entered = span.enter();
        match &result.error {
            None => tracing::info!(
                "ingest complete: url={url}, method={}, contacts={}, elapsed={}ms",
                result.method,
                result.contacts.len(),
                result.elapsed_ms
            ),
            Some(err) => tracing::info!(
                "ingest complete: url={url}, method={}, contacts={}, error={err}",
                result.method,
                result.contacts.len()
            ),
        }
        result
    }

    async fn ingest_inner(&self, url: &str, domain: &str) -> IngestResult {
        let fetch = match self.fetcher.fetch(url).await {
            Ok(fetch) => fetch,
            Err(e) => {
                let err = match e {
                    IngestError::Fetch(_) => e,
                    other => IngestError::Fetch(other.to_string()),
                };
                tracing::warn!("{err}");
                return IngestResult::failure(url, err.to_string());
            }
        };
        self.budget.record_static(domain);

        if fetch.blocked_by_robots {
            return IngestResult::failure(url, IngestError::RobotsBlocked.to_string());
        }
        if fetch.status_code >= 400 {
            let mut result =
                IngestResult::failure(url, IngestError::Http(fetch.status_code).to_string());
            result.status_code = Some(fetch.status_code);
            return result;
        }

        let mut follow_ups = FollowUpBudget::new(self.config.max_follow_ups);
        let contacts = self.extract_static(&fetch, &mut follow_ups).await;
        let decision = self.decide(url, &fetch, !contacts.is_empty());
        let escalate = decision.escalate();

        let mut result = IngestResult {
            url: url.to_string(),
            method: FetchMethod::Static,
            success: true,
            contacts,
            escalation_decision: Some(decision),
            error: None,
            status_code: Some(fetch.status_code),
            elapsed_ms: 0,
        };
        if !escalate || !self.config.headless_enabled {
            return result;
        }

        if let Err(denial) = self.budget.try_acquire_headless(domain) {
            let err = IngestError::QuotaExceeded {
                domain: domain.to_string(),
                denial,
            };
            tracing::warn!("{err}");
            result.success = false;
            result.error = Some(err.to_string());
            return result;
        }

        let tally = self.site_tally();
        match self.headless.extract(url, &tally).await {
            Ok(page) => {
                self.record_tally(&fetch.url, &page.extraction.foreign_domains);
                let mut rendered = page.extraction.contacts;
                rendered.extend(self.follow(&page.extraction.leads, &mut follow_ups).await);
                if rendered.is_empty() {
                    tracing::debug!("headless found nothing on {url}; keeping static result");
                } else {
                    result.method = FetchMethod::Headless;
                    let mut contacts = std::mem::take(&mut result.contacts);
                    contacts.extend(rendered);
                    result.contacts = dedupe_contacts(contacts);
                }
            }
            Err(e) => {
                let err = IngestError::Headless(format!("{e:#}"));
                tracing::warn!("{err}; keeping static result");
                result.error = Some(err.to_string());
            }
        }
        result
    }

    async fn extract_static(
        &self,
        fetch: &FetchResult,
        follow_ups: &mut FollowUpBudget,
    ) -> Vec<Contact> {
        let Some(html) = fetch.html.as_deref() else {
            return Vec::new();
        };
        let tally = self.site_tally();
        let page = self.attributor.extract(html, &fetch.url, &tally);
        self.record_tally(&fetch.url, &page.foreign_domains);

        let mut contacts = page.contacts;
        contacts.extend(self.follow(&page.leads, follow_ups).await);
        contacts
    }

    async fn follow(&self, leads: &[ProfileLead], budget: &mut FollowUpBudget) -> Vec<Contact> {
        if leads.is_empty() {
            return Vec::new();
        }
        let tally = self.site_tally();
        let found = follow_leads(
            self.fetcher.as_ref(),
            &self.attributor,
            leads,
            &tally,
            budget,
            self.config.follow_up_timeout_ms,
        )
        .await;
        for (page_url, counts) in &found.foreign_domains {
            self.record_tally(page_url, counts);
        }
        found.contacts
    }

    /// Escalation verdict for a page. The engine runs whether or not static
    /// extraction found contacts; only the listing-URL rule requires an
    /// empty static result.
    fn decide(&self, url: &str, fetch: &FetchResult, has_contacts: bool) -> EscalationDecision {
        let hits = fetch.html.as_deref().map(count_person_containers).unwrap_or(0);
        let mut decision = self.engine.decide(fetch, hits);
        if !has_contacts && self.config.headless_enabled && is_listing_url(url) {
            decision.add_reason(TARGET_URL_NO_CONTACTS);
        }
        if decision.escalate() {
            tracing::debug!("escalating {url}: {}", decision.reasons().join(", "));
        }
        decision
    }

    // ── Discovery ────────────────────────────────────

    /// Pages worth ingesting for a site root: discovered people/contact
    /// links, then the configured include paths.
    pub async fn candidate_urls(&self, root: &str) -> Vec<String> {
        let mut urls = Vec::new();
        if self.config.discovery_enabled {
            match self.fetcher.fetch(root).await {
                Ok(fetch) if !fetch.blocked_by_robots && fetch.status_code < 400 => {
                    if let Some(html) = fetch.html.as_deref() {
                        urls.extend(discover_links(&fetch.url, html, MAX_DISCOVERED_LINKS));
                    }
                }
                Ok(fetch) => {
                    tracing::debug!("no discovery on {root} (status {})", fetch.status_code)
                }
                Err(e) => tracing::debug!("no discovery on {root}: {e}"),
            }
        }
        urls.extend(expand_candidate_urls(root, &self.config.include_paths));

        let mut seen = HashSet::new();
        urls.into_iter()
            .filter(|u| u.starts_with("http://") || u.starts_with("https://"))
            .map(|u| normalize_url(&u))
            .filter(|u| seen.insert(u.clone()))
            .take(self.config.max_pages_per_domain)
            .collect()
    }
}
