// Copyright 2026 Evidence Contacts Contributors
// SPDX-License-Identifier: Apache-2.0

//! Evidence package construction.
//!
//! Every extracted contact carries a seven-field evidence package. The
//! builder fills in the mechanical fields (timestamp, parser version,
//! content hash, screenshot reference) so extractors only supply the
//! source URL, the selector, and the verbatim text.
//!
//! Screenshot capture itself is done by an external collaborator; the
//! builder only mints the deterministic reference it should be stored under.

use crate::types::Evidence;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Version stamped into every evidence package.
pub const PARSER_VERSION: &str = env!("CARGO_PKG_VERSION");

// Selector fragments recorded in evidence. Anything containing `a[href`
// counts as anchor-sourced downstream.
pub const SEL_MAILTO: &str = "a[href*='mailto:']";
pub const SEL_TEL: &str = "a[href*='tel:']";
pub const SEL_VCARD: &str = "a[href$='.vcf']";
pub const SEL_ARIA: &str = "[aria-label]";
pub const SEL_DATA_ATTR: &str = "[data-email],[data-phone]";
pub const SEL_CFEMAIL: &str = "[data-cfemail]";
pub const SEL_TEXT_EMAIL: &str = ":contains('@')";
pub const SEL_TEXT_PHONE: &str = ":contains-phone";

/// How the page content was obtained when the evidence was captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    Static,
    Headless,
}

impl CaptureMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureMode::Static => "static",
            CaptureMode::Headless => "headless",
        }
    }
}

/// Builds evidence packages.
#[derive(Debug, Clone)]
pub struct EvidenceBuilder {
    parser_version: String,
    screenshot_dir: String,
}

impl Default for EvidenceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EvidenceBuilder {
    pub fn new() -> Self {
        Self {
            parser_version: PARSER_VERSION.to_string(),
            screenshot_dir: "evidence".to_string(),
        }
    }

    pub fn with_parser_version(mut self, version: impl Into<String>) -> Self {
        self.parser_version = version.into();
        self
    }

    pub fn with_screenshot_dir(mut self, dir: impl Into<String>) -> Self {
        self.screenshot_dir = dir.into();
        self
    }

    pub fn parser_version(&self) -> &str {
        &self.parser_version
    }

    /// Create a complete evidence package stamped with the current time.
    pub fn build(
        &self,
        mode: CaptureMode,
        source_url: &str,
        selector: &str,
        verbatim: &str,
    ) -> Evidence {
        self.build_at(mode, source_url, selector, verbatim, Utc::now())
    }

    /// Same as [`build`](Self::build) with an explicit timestamp.
    pub fn build_at(
        &self,
        mode: CaptureMode,
        source_url: &str,
        selector: &str,
        verbatim: &str,
        timestamp: DateTime<Utc>,
    ) -> Evidence {
        let verbatim = verbatim.trim();
        Evidence {
            source_url: source_url.to_string(),
            selector_or_xpath: selector.to_string(),
            verbatim_quote: verbatim.to_string(),
            screenshot_ref: self.screenshot_ref(mode, source_url, selector, timestamp),
            timestamp,
            parser_version: self.parser_version.clone(),
            content_hash: content_hash(verbatim),
        }
    }

    /// `{dir}/{mode}_{url8}_{selector8}_{timestamp}.png`
    pub fn screenshot_ref(
        &self,
        mode: CaptureMode,
        url: &str,
        selector: &str,
        timestamp: DateTime<Utc>,
    ) -> String {
        let url_hash = short_hash(url);
        let sel_hash = short_hash(selector);
        format!(
            "{}/{}_{}_{}_{}.png",
            self.screenshot_dir,
            mode.as_str(),
            url_hash,
            sel_hash,
            timestamp.format("%Y%m%d_%H%M%S")
        )
    }
}

/// SHA-256 hex of whitespace-collapsed, trimmed, lower-cased text.
pub fn content_hash(text: &str) -> String {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    hex::encode(hasher.finalize())
}

fn short_hash(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    hex::encode(hasher.finalize())[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_build_produces_complete_evidence() {
        let ev = EvidenceBuilder::new().build(
            CaptureMode::Static,
            "https://example.com/team",
            SEL_MAILTO,
            "  jane@example.com ",
        );
        assert!(ev.is_complete());
        assert_eq!(ev.verbatim_quote, "jane@example.com");
        assert_eq!(ev.parser_version, PARSER_VERSION);
    }

    #[test]
    fn test_content_hash_normalizes_case_and_space() {
        assert_eq!(content_hash("Jane  Doe\n"), content_hash("jane doe"));
        assert_eq!(content_hash("x").len(), 64);
    }

    #[test]
    fn test_screenshot_ref_layout() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let r = EvidenceBuilder::new().screenshot_ref(
            CaptureMode::Headless,
            "https://example.com",
            SEL_TEL,
            ts,
        );
        assert!(r.starts_with("evidence/headless_"));
        assert!(r.ends_with("_20260102_030405.png"));
        assert_eq!(r.split('_').count(), 5);
    }

    #[test]
    fn test_custom_parser_version_must_be_semver() {
        let ev = EvidenceBuilder::new().with_parser_version("dev").build(
            CaptureMode::Static,
            "https://example.com",
            SEL_TEL,
            "555",
        );
        assert!(!ev.is_complete());
    }
}
