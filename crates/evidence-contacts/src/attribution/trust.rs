// Copyright 2026 Evidence Contacts Contributors
// SPDX-License-Identifier: Apache-2.0

//! Cross-domain email trust.
//!
//! An email on the site's own registrable domain (or one at least 0.9
//! similar) is accepted outright. A foreign domain must earn a weighted
//! score of at least `threshold` AND show one strong signal: phone or vCard
//! in the same card, the domain repeated on the page (≥2) or across the
//! site (≥3), or a footer/contact-block mention.

use crate::normalize::{registrable_domain, similarity_ratio};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const SAME_SITE_SIMILARITY: f64 = 0.9;
pub const PAGE_REPEAT_MIN: usize = 2;
pub const SITE_REPEAT_MIN: usize = 3;

/// Weights for the cross-domain score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustWeights {
    pub anchor_origin: f64,
    pub phone_in_card: f64,
    pub vcard_in_card: f64,
    pub reveal_phrase: f64,
    pub page_repeat: f64,
    pub site_repeat: f64,
    pub footer_mention: f64,
    /// Subtracted for press/careers/newsroom style paths.
    pub negative_zone_penalty: f64,
    pub threshold: f64,
}

impl Default for TrustWeights {
    fn default() -> Self {
        Self {
            anchor_origin: 0.30,
            phone_in_card: 0.25,
            vcard_in_card: 0.25,
            reveal_phrase: 0.15,
            page_repeat: 0.20,
            site_repeat: 0.20,
            footer_mention: 0.20,
            negative_zone_penalty: 0.30,
            threshold: 0.50,
        }
    }
}

/// Evidence gathered around one foreign email candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrustSignals {
    pub anchor_origin: bool,
    pub phone_in_card: bool,
    pub vcard_in_card: bool,
    pub reveal_phrase: bool,
    /// Distinct addresses on this page sharing the domain.
    pub page_repeat: usize,
    /// Distinct addresses across the site sharing the domain.
    pub site_repeat: usize,
    pub footer_mention: bool,
    pub negative_zone: bool,
}

impl TrustSignals {
    pub fn has_strong_signal(&self) -> bool {
        self.phone_in_card
            || self.vcard_in_card
            || self.page_repeat >= PAGE_REPEAT_MIN
            || self.site_repeat >= SITE_REPEAT_MIN
            || self.footer_mention
    }

    pub fn score(&self, w: &TrustWeights) -> f64 {
        let mut score = 0.0;
        if self.anchor_origin {
            score += w.anchor_origin;
        }
        if self.phone_in_card {
            score += w.phone_in_card;
        }
        if self.vcard_in_card {
            score += w.vcard_in_card;
        }
        if self.reveal_phrase {
            score += w.reveal_phrase;
        }
        if self.page_repeat >= PAGE_REPEAT_MIN {
            score += w.page_repeat;
        }
        if self.site_repeat >= SITE_REPEAT_MIN {
            score += w.site_repeat;
        }
        if self.footer_mention {
            score += w.footer_mention;
        }
        if self.negative_zone {
            score -= w.negative_zone_penalty;
        }
        score
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrustVerdict {
    SameSite,
    Accepted { score: f64 },
    Rejected { score: f64, strong_signal: bool },
}

impl TrustVerdict {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, TrustVerdict::Rejected { .. })
    }
}

/// True when two hosts share (or nearly share) a registrable domain.
pub fn is_same_site(site_host: &str, email_domain: &str) -> bool {
    let a = registrable_domain(site_host);
    let b = registrable_domain(email_domain);
    a == b || similarity_ratio(&a, &b) >= SAME_SITE_SIMILARITY
}

pub fn evaluate(
    site_host: &str,
    email_domain: &str,
    signals: &TrustSignals,
    weights: &TrustWeights,
) -> TrustVerdict {
    if is_same_site(site_host, email_domain) {
        return TrustVerdict::SameSite;
    }
    let score = signals.score(weights);
    let strong_signal = signals.has_strong_signal();
    if score >= weights.threshold && strong_signal {
        TrustVerdict::Accepted { score }
    } else {
        TrustVerdict::Rejected {
            score,
            strong_signal,
        }
    }
}

/// Run-scoped counts of foreign email domains per site, accumulated across
/// pages.
///
/// Pages recorded through [`SiteTally::record_page`] count once each: a
/// second extraction of the same URL replaces the first one's counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteTally {
    sites: HashMap<String, HashMap<String, usize>>,
    #[serde(skip)]
    pages: HashMap<String, (String, HashMap<String, usize>)>,
}

impl SiteTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, site: &str, domain: &str) -> usize {
        self.sites
            .get(site)
            .and_then(|d| d.get(domain))
            .copied()
            .unwrap_or(0)
    }

    /// Add one page's foreign-domain counts for `site`.
    pub fn merge(&mut self, site: &str, page_counts: &HashMap<String, usize>) {
        let entry = self.sites.entry(site.to_string()).or_default();
        for (domain, n) in page_counts {
            *entry.entry(domain.clone()).or_insert(0) += n;
        }
    }

    /// Add the counts seen on `page_url`, dropping whatever that URL
    /// contributed before.
    pub fn record_page(
        &mut self,
        site: &str,
        page_url: &str,
        page_counts: &HashMap<String, usize>,
    ) {
        if let Some((old_site, old_counts)) = self.pages.remove(page_url) {
            if let Some(entry) = self.sites.get_mut(&old_site) {
                for (domain, n) in &old_counts {
                    if let Some(c) = entry.get_mut(domain) {
                        *c = c.saturating_sub(*n);
                        if *c == 0 {
                            entry.remove(domain);
                        }
                    }
                }
                if entry.is_empty() {
                    self.sites.remove(&old_site);
                }
            }
        }
        if page_counts.is_empty() {
            return;
        }
        self.merge(site, page_counts);
        self.pages
            .insert(page_url.to_string(), (site.to_string(), page_counts.clone()));
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_site_accepted_unconditionally() {
        let v = evaluate("www.firm.com", "firm.com", &TrustSignals::default(), &TrustWeights::default());
        assert_eq!(v, TrustVerdict::SameSite);
        assert!(is_same_site("mail.firm.co.uk", "firm.co.uk"));
        assert!(is_same_site("smithlawfirm.com", "smithlawfirms.com"));
    }

    #[test]
    fn test_foreign_without_signals_rejected() {
        let v = evaluate("firm.com", "gmail.com", &TrustSignals::default(), &TrustWeights::default());
        assert!(!v.is_accepted());
    }

    #[test]
    fn test_score_without_strong_signal_rejected() {
        let signals = TrustSignals {
            anchor_origin: true,
            reveal_phrase: true,
            page_repeat: 1,
            ..Default::default()
        };
        let w = TrustWeights {
            threshold: 0.4,
            ..Default::default()
        };
        let v = evaluate("firm.com", "partner.org", &signals, &w);
        match v {
            TrustVerdict::Rejected {
                score,
                strong_signal,
            } => {
                assert!(score > w.threshold);
                assert!(!strong_signal);
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_anchor_with_phone_in_card_accepted() {
        let signals = TrustSignals {
            anchor_origin: true,
            phone_in_card: true,
            ..Default::default()
        };
        let v = evaluate("acme.com", "example.com", &signals, &TrustWeights::default());
        assert!(v.is_accepted());
    }

    #[test]
    fn test_negative_zone_penalty() {
        let signals = TrustSignals {
            anchor_origin: true,
            phone_in_card: true,
            negative_zone: true,
            ..Default::default()
        };
        let v = evaluate("acme.com", "example.com", &signals, &TrustWeights::default());
        assert!(!v.is_accepted());
    }

    #[test]
    fn test_site_tally_accumulates() {
        let mut tally = SiteTally::new();
        let page: HashMap<String, usize> = [("partner.org".to_string(), 2)].into_iter().collect();
        tally.merge("firm.com", &page);
        tally.merge("firm.com", &page);
        assert_eq!(tally.count("firm.com", "partner.org"), 4);
        assert_eq!(tally.count("other.com", "partner.org"), 0);
    }

    #[test]
    fn test_site_tally_counts_each_page_once() {
        let mut tally = SiteTally::new();
        let first: HashMap<String, usize> = [("partner.org".to_string(), 2)].into_iter().collect();
        let rendered: HashMap<String, usize> =
            [("partner.org".to_string(), 3), ("gmail.com".to_string(), 1)].into_iter().collect();
        tally.record_page("firm.com", "https://firm.com/team", &first);
        tally.record_page("firm.com", "https://firm.com/team", &rendered);
        assert_eq!(tally.count("firm.com", "partner.org"), 3);
        assert_eq!(tally.count("firm.com", "gmail.com"), 1);

        tally.record_page("firm.com", "https://firm.com/about", &first);
        assert_eq!(tally.count("firm.com", "partner.org"), 5);

        tally.record_page("firm.com", "https://firm.com/team", &HashMap::new());
        assert_eq!(tally.count("firm.com", "partner.org"), 2);
        assert_eq!(tally.count("firm.com", "gmail.com"), 0);
    }
}
