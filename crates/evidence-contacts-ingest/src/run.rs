// Copyright 2026 Evidence Contacts Contributors
// SPDX-License-Identifier: Apache-2.0

//! Multi-URL runs: per-domain sequencing, bounded cross-domain concurrency,
//! and run-wide deduplication and consolidation.

use crate::pipeline::IngestPipeline;
use evidence_contacts::normalize::site_host;
use evidence_contacts::{
    consolidate_per_person, dedupe_contacts, Contact, FetchMethod, IngestResult, PersonRecord,
};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// What happened to one URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSummary {
    pub url: String,
    pub method: FetchMethod,
    pub success: bool,
    pub contacts: usize,
    pub escalated: bool,
    pub reasons: Vec<String>,
    pub error: Option<String>,
    pub status_code: Option<u16>,
    pub elapsed_ms: u64,
}

impl From<&IngestResult> for PageSummary {
    fn from(r: &IngestResult) -> Self {
        let decision = r.escalation_decision.as_ref();
        Self {
            url: r.url.clone(),
            method: r.method,
            success: r.success,
            contacts: r.contacts.len(),
            escalated: decision.is_some_and(|d| d.escalate()),
            reasons: decision.map(|d| d.reasons().to_vec()).unwrap_or_default(),
            error: r.error.clone(),
            status_code: r.status_code,
            elapsed_ms: r.elapsed_ms,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub pages: usize,
    pub static_pages: usize,
    pub headless_pages: usize,
    pub failures: usize,
    pub raw_contacts: usize,
    pub deduped_contacts: usize,
    pub people: usize,
    pub headless_spent: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    pub pages: Vec<PageSummary>,
    /// Deduplicated contacts, first-seen order.
    pub contacts: Vec<Contact>,
    pub people: Vec<PersonRecord>,
    pub stats: RunStats,
}

/// URLs grouped by domain, both in first-seen order. Repeated URLs are
/// dropped.
pub fn group_by_domain(urls: &[String]) -> Vec<(String, Vec<String>)> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<String>> = HashMap::new();
    let mut seen = HashSet::new();
    for url in urls {
        let url = url.trim();
        if url.is_empty() || !seen.insert(url.to_string()) {
            continue;
        }
        let domain = site_host(url).unwrap_or_else(|| url.to_lowercase());
        let group = groups.entry(domain.clone()).or_insert_with(|| {
            order.push(domain.clone());
            Vec::new()
        });
        group.push(url.to_string());
    }
    order
        .into_iter()
        .filter_map(|d| groups.remove(&d).map(|urls| (d, urls)))
        .collect()
}

impl IngestPipeline {
    /// Ingest every URL. Domains run concurrently up to
    /// `max_concurrent_domains`; URLs inside a domain run one after another.
    pub async fn run(&self, urls: &[String]) -> RunReport {
        let groups = group_by_domain(urls);
        let concurrency = self.config().max_concurrent_domains.max(1);
        tracing::info!(
            "run starting: {} urls across {} domains (concurrency {concurrency})",
            urls.len(),
            groups.len()
        );

        let per_domain: Vec<Vec<IngestResult>> = stream::iter(groups)
            .map(|(domain, urls)| async move {
                let mut out = Vec::with_capacity(urls.len());
                for url in &urls {
                    out.push(self.ingest(url).await);
                }
                tracing::debug!("domain {domain} done ({} pages)", out.len());
                out
            })
            .buffered(concurrency)
            .collect()
            .await;

        let mut report = RunReport::default();
        let mut raw = Vec::new();
        for result in per_domain.into_iter().flatten() {
            let summary = PageSummary::from(&result);
            report.stats.pages += 1;
            match (summary.success, summary.method) {
                (false, _) => report.stats.failures += 1,
                (true, FetchMethod::Static) => report.stats.static_pages += 1,
                (true, FetchMethod::Headless) => report.stats.headless_pages += 1,
            }
            report.pages.push(summary);
            raw.extend(result.contacts);
        }

        report.stats.raw_contacts = raw.len();
        report.contacts = dedupe_contacts(raw);
        report.people = consolidate_per_person(&report.contacts);
        report.stats.deduped_contacts = report.contacts.len();
        report.stats.people = report.people.len();
        report.stats.headless_spent = self.budget().global_spent();

        tracing::info!(
            "run complete: pages={}, contacts={}, people={}, headless={}",
            report.stats.pages,
            report.stats.deduped_contacts,
            report.stats.people,
            report.stats.headless_spent
        );
        report
    }

    /// Expand each site root into candidate pages, then [`run`](Self::run)
    /// them all.
    pub async fn run_sites(&self, roots: &[String]) -> RunReport {
        let mut urls = Vec::new();
        for root in roots {
            let candidates = self.candidate_urls(root).await;
            tracing::debug!("{root}: {} candidate pages", candidates.len());
            urls.extend(candidates);
        }
        self.run(&urls).await
    }
}
