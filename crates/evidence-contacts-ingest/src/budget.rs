// Copyright 2026 Evidence Contacts Contributors
// SPDX-License-Identifier: Apache-2.0

//! Headless cost control.
//!
//! Two gates must both pass before a page is rendered:
//!
//! - **Share gate** ([`DomainTracker`]): the domain's headless share of all
//!   recorded fetches must stay below `max_headless_pct`.
//! - **Hard caps** ([`HeadlessBudget`]): per-domain and global spend counts.
//!
//! [`BudgetGate`] owns both behind one lock so check-and-spend is a single
//! step even when domains are processed concurrently.

use evidence_contacts::FetchMethod;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Static/headless fetch counts for one domain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainUsage {
    pub static_count: u32,
    pub headless_count: u32,
}

impl DomainUsage {
    pub fn total(&self) -> u32 {
        self.static_count + self.headless_count
    }

    pub fn headless_share(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            n => f64::from(self.headless_count) / f64::from(n),
        }
    }
}

/// Per-domain fetch mix.
#[derive(Debug, Clone)]
pub struct DomainTracker {
    max_headless_pct: f64,
    usage: HashMap<String, DomainUsage>,
}

impl DomainTracker {
    pub fn new(max_headless_pct: f64) -> Self {
        Self {
            max_headless_pct,
            usage: HashMap::new(),
        }
    }

    pub fn record_fetch(&mut self, domain: &str, method: FetchMethod) {
        let usage = self.usage.entry(domain.to_string()).or_default();
        match method {
            FetchMethod::Static => usage.static_count += 1,
            FetchMethod::Headless => usage.headless_count += 1,
        }
    }

    pub fn record_static(&mut self, domain: &str) {
        self.record_fetch(domain, FetchMethod::Static);
    }

    pub fn record_headless(&mut self, domain: &str) {
        self.record_fetch(domain, FetchMethod::Headless);
    }

    /// True for a fresh domain; otherwise the headless share must be below
    /// the limit.
    pub fn can_use_headless(&self, domain: &str) -> bool {
        match self.usage.get(domain) {
            None => true,
            Some(u) if u.total() == 0 => true,
            Some(u) => u.headless_share() < self.max_headless_pct,
        }
    }

    pub fn usage(&self, domain: &str) -> DomainUsage {
        self.usage.get(domain).copied().unwrap_or_default()
    }
}

/// Hard caps on rendered fetches.
#[derive(Debug, Clone)]
pub struct HeadlessBudget {
    domain_cap: u32,
    global_cap: u32,
    per_domain: HashMap<String, u32>,
    global_used: u32,
}

impl HeadlessBudget {
    pub fn new(domain_cap: u32, global_cap: u32) -> Self {
        Self {
            domain_cap,
            global_cap,
            per_domain: HashMap::new(),
            global_used: 0,
        }
    }

    pub fn domain_used(&self, domain: &str) -> u32 {
        self.per_domain.get(domain).copied().unwrap_or(0)
    }

    pub fn global_used(&self) -> u32 {
        self.global_used
    }

    pub fn can_spend(&self, domain: &str) -> bool {
        self.domain_used(domain) < self.domain_cap && self.global_used < self.global_cap
    }

    pub fn spend(&mut self, domain: &str) {
        *self.per_domain.entry(domain.to_string()).or_insert(0) += 1;
        self.global_used += 1;
    }
}

/// Why a headless fetch was refused.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum BudgetDenial {
    #[error("headless share {used_pct:.2} at or above {max_pct:.2}")]
    HeadlessShare { used_pct: f64, max_pct: f64 },

    #[error("domain cap reached ({used}/{cap})")]
    DomainCap { used: u32, cap: u32 },

    #[error("global cap reached ({used}/{cap})")]
    GlobalCap { used: u32, cap: u32 },
}

/// Usage counters for one domain plus the global spend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetSnapshot {
    pub usage: DomainUsage,
    pub domain_spent: u32,
    pub global_spent: u32,
}

struct GateState {
    tracker: DomainTracker,
    budget: HeadlessBudget,
}

/// Both gates behind one lock. Share one instance across the run.
pub struct BudgetGate {
    state: Mutex<GateState>,
}

impl BudgetGate {
    pub fn new(max_headless_pct: f64, domain_cap: u32, global_cap: u32) -> Self {
        Self {
            state: Mutex::new(GateState {
                tracker: DomainTracker::new(max_headless_pct),
                budget: HeadlessBudget::new(domain_cap, global_cap),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        // Counters stay consistent even if a holder panicked.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn record_static(&self, domain: &str) {
        self.lock().tracker.record_static(domain);
    }

    /// Check both gates and, only if both pass, record the headless fetch
    /// and spend one unit.
    pub fn try_acquire_headless(&self, domain: &str) -> Result<(), BudgetDenial> {
        let mut state = self.lock();
        if !state.tracker.can_use_headless(domain) {
            return Err(BudgetDenial::HeadlessShare {
                used_pct: state.tracker.usage(domain).headless_share(),
                max_pct: state.tracker.max_headless_pct,
            });
        }
        let domain_used = state.budget.domain_used(domain);
        if domain_used >= state.budget.domain_cap {
            return Err(BudgetDenial::DomainCap {
                used: domain_used,
                cap: state.budget.domain_cap,
            });
        }
        if state.budget.global_used >= state.budget.global_cap {
            return Err(BudgetDenial::GlobalCap {
                used: state.budget.global_used,
                cap: state.budget.global_cap,
            });
        }
        state.tracker.record_headless(domain);
        state.budget.spend(domain);
        Ok(())
    }

    pub fn snapshot(&self, domain: &str) -> BudgetSnapshot {
        let state = self.lock();
        BudgetSnapshot {
            usage: state.tracker.usage(domain),
            domain_spent: state.budget.domain_used(domain),
            global_spent: state.budget.global_used(),
        }
    }

    pub fn global_spent(&self) -> u32 {
        self.lock().budget.global_used()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_fresh_domain_allows_headless() {
        let t = DomainTracker::new(0.2);
        assert!(t.can_use_headless("acme.com"));
    }

    #[test]
    fn test_share_gate_after_four_static_one_headless() {
        let mut t = DomainTracker::new(0.2);
        for _ in 0..4 {
            t.record_static("acme.com");
        }
        assert!(t.can_use_headless("acme.com"));
        t.record_headless("acme.com");
        assert!(!t.can_use_headless("acme.com"));
    }

    #[test]
    fn test_domain_cap() {
        let mut b = HeadlessBudget::new(2, 10);
        b.spend("acme.com");
        b.spend("acme.com");
        assert!(!b.can_spend("acme.com"));
        assert!(b.can_spend("other.com"));
        assert_eq!(b.global_used(), 2);
    }

    #[test]
    fn test_global_cap() {
        let mut b = HeadlessBudget::new(5, 2);
        b.spend("a.com");
        b.spend("b.com");
        assert!(!b.can_spend("c.com"));
    }

    #[test]
    fn test_gate_denial_reasons() {
        let gate = BudgetGate::new(0.5, 1, 10);
        for _ in 0..10 {
            gate.record_static("acme.com");
        }
        assert!(gate.try_acquire_headless("acme.com").is_ok());
        assert_eq!(
            gate.try_acquire_headless("acme.com"),
            Err(BudgetDenial::DomainCap { used: 1, cap: 1 })
        );

        let gate = BudgetGate::new(0.2, 5, 10);
        gate.record_static("acme.com");
        assert!(gate.try_acquire_headless("acme.com").is_ok());
        match gate.try_acquire_headless("acme.com") {
            Err(BudgetDenial::HeadlessShare { .. }) => {}
            other => panic!("expected share denial, got {other:?}"),
        }
        let snap = gate.snapshot("acme.com");
        assert_eq!(snap.usage.static_count, 1);
        assert_eq!(snap.usage.headless_count, 1);
        assert_eq!(snap.domain_spent, 1);
    }

    #[test]
    fn test_gate_is_atomic_across_threads() {
        let gate = Arc::new(BudgetGate::new(0.5, 3, 100));
        for _ in 0..100 {
            gate.record_static("acme.com");
        }
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let gate = Arc::clone(&gate);
                std::thread::spawn(move || gate.try_acquire_headless("acme.com").is_ok())
            })
            .collect();
        let granted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(granted, 3);
        assert_eq!(gate.global_spent(), 3);
    }
}
