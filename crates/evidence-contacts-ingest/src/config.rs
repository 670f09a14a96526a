// Copyright 2026 Evidence Contacts Contributors
// SPDX-License-Identifier: Apache-2.0

//! Per-run ingest configuration.
//!
//! Defaults match the reference crawler. `from_env` overlays `EGC_*`
//! variables; loading YAML/JSON is left to callers (every field has a serde
//! default).

use evidence_contacts::{AttributorConfig, TrustWeights, PARSER_VERSION};
use serde::{Deserialize, Serialize};

/// Desktop Chrome UA used for both static and rendered fetches.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/140.0.0.0 Safari/537.36";

/// Token matched against robots.txt `User-agent` groups.
pub const ROBOTS_AGENT: &str = "evidence-contacts";

pub const DEFAULT_INCLUDE_PATHS: &[&str] = &[
    "/about",
    "/team",
    "/leadership",
    "/management",
    "/contacts",
    "/contact",
    "/imprint",
    "/impressum",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub headless_enabled: bool,
    pub static_timeout_ms: u64,
    pub headless_timeout_ms: u64,
    /// Wait for team-like sections after navigation.
    pub settle_timeout_ms: u64,
    /// Time allowed for the in-page anchor sweep.
    pub sweep_budget_ms: u64,
    pub follow_up_timeout_ms: u64,
    pub max_follow_ups: usize,
    pub aggressive: bool,
    pub respect_robots: bool,
    pub user_agent: String,
    pub max_headless_pct: f64,
    pub domain_cap: u32,
    pub global_cap: u32,
    pub max_concurrent_domains: usize,
    pub discovery_enabled: bool,
    pub max_pages_per_domain: usize,
    pub include_paths: Vec<String>,
    pub trust_weights: TrustWeights,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            headless_enabled: true,
            static_timeout_ms: 12_000,
            headless_timeout_ms: 20_000,
            settle_timeout_ms: 2_000,
            sweep_budget_ms: 3_000,
            follow_up_timeout_ms: 5_000,
            max_follow_ups: 5,
            aggressive: false,
            respect_robots: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_headless_pct: 0.2,
            domain_cap: 2,
            global_cap: 10,
            max_concurrent_domains: 1,
            discovery_enabled: true,
            max_pages_per_domain: 10,
            include_paths: DEFAULT_INCLUDE_PATHS.iter().map(|s| s.to_string()).collect(),
            trust_weights: TrustWeights::default(),
        }
    }
}

impl IngestConfig {
    /// Defaults overlaid with `EGC_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env(|name| std::env::var(name).ok());
        config
    }

    /// Overlay values from `lookup`; unparsable values are skipped.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = read_parsed(&lookup, "EGC_HEADLESS", parse_bool) {
            self.headless_enabled = v;
        }
        if let Some(v) = read_parsed(&lookup, "EGC_STATIC_TIMEOUT_MS", |s| s.parse().ok()) {
            self.static_timeout_ms = v;
        }
        if let Some(v) = read_parsed(&lookup, "EGC_AGGRESSIVE", parse_bool) {
            self.aggressive = v;
        }
        if let Some(v) = read_parsed(&lookup, "EGC_DOMAIN_CAP", |s| s.parse().ok()) {
            self.domain_cap = v;
        }
        if let Some(v) = read_parsed(&lookup, "EGC_GLOBAL_CAP", |s| s.parse().ok()) {
            self.global_cap = v;
        }
        if let Some(v) = read_parsed(&lookup, "EGC_MAX_HEADLESS_PCT", |s| {
            s.parse::<f64>().ok().filter(|p| (0.0..=1.0).contains(p))
        }) {
            self.max_headless_pct = v;
        }
        if let Some(v) = read_parsed(&lookup, "EGC_RESPECT_ROBOTS", parse_bool) {
            self.respect_robots = v;
        }
    }

    pub fn attributor_config(&self) -> AttributorConfig {
        AttributorConfig {
            aggressive: self.aggressive,
            weights: self.trust_weights,
            parser_version: PARSER_VERSION.to_string(),
        }
    }
}

fn read_parsed<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    let raw = lookup(name)?;
    let raw = raw.trim();
    match parse(raw) {
        Some(v) => Some(v),
        None => {
            tracing::warn!("ignoring {name}={raw:?}: unparsable");
            None
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let c = IngestConfig::default();
        assert!(c.headless_enabled);
        assert_eq!(c.static_timeout_ms, 12_000);
        assert_eq!(c.domain_cap, 2);
        assert_eq!(c.global_cap, 10);
        assert_eq!(c.max_concurrent_domains, 1);
        assert_eq!(c.include_paths.len(), 8);
    }

    #[test]
    fn test_env_overlay_skips_garbage() {
        let vars: HashMap<&str, &str> = [
            ("EGC_HEADLESS", "false"),
            ("EGC_DOMAIN_CAP", "5"),
            ("EGC_GLOBAL_CAP", "lots"),
            ("EGC_MAX_HEADLESS_PCT", "1.5"),
            ("EGC_AGGRESSIVE", "1"),
        ]
        .into_iter()
        .collect();
        let mut c = IngestConfig::default();
        c.apply_env(|k| vars.get(k).map(|v| v.to_string()));
        assert!(!c.headless_enabled);
        assert!(c.aggressive);
        assert_eq!(c.domain_cap, 5);
        assert_eq!(c.global_cap, 10);
        assert!((c.max_headless_pct - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let c: IngestConfig = serde_json::from_str(r#"{"aggressive": true}"#).unwrap();
        assert!(c.aggressive);
        assert_eq!(c.headless_timeout_ms, 20_000);
    }
}
