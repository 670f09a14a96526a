// Copyright 2026 Evidence Contacts Contributors
// SPDX-License-Identifier: Apache-2.0

//! Profile-page follow-ups for cards that named a person but carried no
//! email or phone.

use crate::fetcher::PageFetcher;
use evidence_contacts::{Contact, ContactAttributor, ProfileLead, SiteTally};
use std::collections::{HashMap, HashSet};

/// Call-scoped cap on profile fetches. Created fresh for every top-level
/// extraction and never shared.
#[derive(Debug)]
pub struct FollowUpBudget {
    limit: usize,
    used: usize,
}

impl FollowUpBudget {
    pub fn new(limit: usize) -> Self {
        Self { limit, used: 0 }
    }

    /// Take one unit if any remain.
    pub fn try_take(&mut self) -> bool {
        if self.used >= self.limit {
            return false;
        }
        self.used += 1;
        true
    }

    pub fn used(&self) -> usize {
        self.used
    }

    pub fn is_exhausted(&self) -> bool {
        self.used >= self.limit
    }
}

/// Contacts recovered from profile pages.
#[derive(Debug, Default)]
pub struct FollowUpYield {
    pub contacts: Vec<Contact>,
    /// Foreign email domains seen on each profile page, keyed by page URL.
    pub foreign_domains: Vec<(String, HashMap<String, usize>)>,
}

/// Fetch each lead's profile page until the budget runs out.
///
/// Leads pointing at an already-visited URL are skipped without spending
/// budget. Fetch failures drop the lead.
pub async fn follow_leads(
    fetcher: &dyn PageFetcher,
    attributor: &ContactAttributor,
    leads: &[ProfileLead],
    tally: &SiteTally,
    budget: &mut FollowUpBudget,
    timeout_ms: u64,
) -> FollowUpYield {
    let mut out = FollowUpYield::default();
    let mut visited = HashSet::new();

    for lead in leads {
        if !visited.insert(lead.url.clone()) {
            continue;
        }
        if !budget.try_take() {
            tracing::debug!("follow-up budget exhausted after {} profiles", budget.used());
            break;
        }

        let fetch = match fetcher.fetch_with_timeout(&lead.url, timeout_ms).await {
            Ok(fetch) => fetch,
            Err(e) => {
                tracing::debug!("follow-up {} for {} failed: {e}", lead.url, lead.person_name);
                continue;
            }
        };
        if fetch.blocked_by_robots || fetch.status_code >= 400 {
            tracing::debug!("follow-up {} unusable (status {})", lead.url, fetch.status_code);
            continue;
        }
        let Some(html) = fetch.html.as_deref() else {
            continue;
        };

        let page = attributor.extract_profile(html, &fetch.url, lead, tally);
        tracing::debug!(
            "follow-up {} gave {} contacts for {}",
            lead.url,
            page.contacts.len(),
            lead.person_name
        );
        if !page.foreign_domains.is_empty() {
            out.foreign_domains.push((fetch.url.clone(), page.foreign_domains));
        }
        out.contacts.extend(page.contacts);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_stops_at_limit() {
        let mut budget = FollowUpBudget::new(5);
        let taken = (0..8).filter(|_| budget.try_take()).count();
        assert_eq!(taken, 5);
        assert_eq!(budget.used(), 5);
        assert!(budget.is_exhausted());
    }

    #[test]
    fn test_zero_budget_takes_nothing() {
        let mut budget = FollowUpBudget::new(0);
        assert!(!budget.try_take());
        assert_eq!(budget.used(), 0);
    }
}
