// Copyright 2026 Evidence Contacts Contributors
// SPDX-License-Identifier: Apache-2.0

//! Static-to-headless escalation rules.
//!
//! The engine is a pure function over a [`FetchResult`] and a cheap content
//! signal (the number of person-container hits in the static HTML). Each rule
//! is an independent predicate tagged with stable reason strings; the engine
//! evaluates every rule and unions the reasons, so several may fire at once.
//! `escalate` is simply "at least one reason fired".
//!
//! All checks are regex scans over the raw body. Nothing here parses a DOM,
//! which keeps the engine cheap enough to run on every page.

use crate::types::{EscalationDecision, FetchResult};
use regex::Regex;

/// Pages smaller than this with no person containers are considered thin.
pub const THIN_PAGE_BYTES: usize = 5 * 1024;

/// Minimum team/member/profile/person class hits for the card heuristic.
pub const MIN_REPEATING_CARDS: usize = 3;

/// Second-pass reason added by the orchestrator for listing URLs that
/// produced no contacts from static extraction.
pub const TARGET_URL_NO_CONTACTS: &str = "target_url_no_contacts";

pub const REASON_THIN_PAGE: &str = "selector_hits==0 && content_length<5KiB";
pub const REASON_ANTI_BOT: &str = "anti-bot markers detected";
pub const REASON_CARDS_NO_ANCHORS: &str = "cards_present_but_no_mailto_tel";

/// Known challenge-page strings.
const ANTI_BOT_MARKERS: &[&str] = &[
    r"Just a moment\s*\.\.\.",
    r"Enable JavaScript and cookies to continue",
    r"__cf_chl_",
    r"cf-browser-verification",
    r"Attention Required!\s*\|\s*Cloudflare",
    r"captcha-delivery\.com",
    r"px-captcha",
];

/// Obfuscated-contact and client-rendering markers, tagged `js:<name>`.
const JS_MARKERS: &[(&str, &str)] = &[
    ("cfemail", r#"data-cfemail|/cdn-cgi/l/email-protection"#),
    (
        "data-contact-attr",
        r#"data-(?:email|mail|phone|tel)\s*="#,
    ),
    (
        "reveal-trigger",
        r#"(?:reveal|show|display)[\s_-]*(?:e-?mail|phone|contact)"#,
    ),
    (
        "obfuscated-at",
        r#"[\w.]+\s*(?:\[at\]|\(at\)|\{at\}|\s+at\s+)\s*[\w-]+\s*(?:\[dot\]|\(dot\)|\{dot\})"#,
    ),
    (
        "spa-root",
        r#"<div[^>]+id\s*=\s*["'](?:root|app|__next|__nuxt)["'][^>]*>\s*</div>"#,
    ),
];

/// Everything a rule may look at.
#[derive(Debug, Clone, Copy)]
pub struct EscalationInput<'a> {
    pub fetch: &'a FetchResult,
    pub selector_hits: usize,
}

impl EscalationInput<'_> {
    fn html(&self) -> &str {
        self.fetch.html.as_deref().unwrap_or("")
    }
}

/// One independent escalation predicate.
pub trait EscalationRule: Send + Sync {
    /// Stable rule name, used in logs.
    fn name(&self) -> &'static str;
    /// Reasons this rule contributes (empty when it does not fire).
    fn evaluate(&self, input: &EscalationInput<'_>) -> Vec<String>;
}

// ── Rules ────────────────────────────────────────────

/// Response MIME type is not `text/html`.
pub struct MimeMismatchRule;

impl EscalationRule for MimeMismatchRule {
    fn name(&self) -> &'static str {
        "mime_mismatch"
    }

    fn evaluate(&self, input: &EscalationInput<'_>) -> Vec<String> {
        match input.fetch.mime.as_deref() {
            Some("text/html") => Vec::new(),
            Some(mime) => vec![format!("mime!=text/html ({mime})")],
            None => vec!["mime!=text/html (none)".to_string()],
        }
    }
}

/// No person containers and a tiny body.
pub struct ThinPageRule;

impl EscalationRule for ThinPageRule {
    fn name(&self) -> &'static str {
        "thin_page"
    }

    fn evaluate(&self, input: &EscalationInput<'_>) -> Vec<String> {
        if input.selector_hits == 0 && input.fetch.content_length < THIN_PAGE_BYTES {
            vec![REASON_THIN_PAGE.to_string()]
        } else {
            Vec::new()
        }
    }
}

/// Anti-bot challenge page markers.
pub struct AntiBotRule {
    patterns: Vec<Regex>,
}

impl AntiBotRule {
    pub fn new() -> Self {
        let patterns = ANTI_BOT_MARKERS
            .iter()
            .map(|p| Regex::new(&format!("(?i){p}")).expect("valid regex"))
            .collect();
        Self { patterns }
    }
}

impl Default for AntiBotRule {
    fn default() -> Self {
        Self::new()
    }
}

impl EscalationRule for AntiBotRule {
    fn name(&self) -> &'static str {
        "anti_bot"
    }

    fn evaluate(&self, input: &EscalationInput<'_>) -> Vec<String> {
        let html = input.html();
        if self.patterns.iter().any(|re| re.is_match(html)) {
            vec![REASON_ANTI_BOT.to_string()]
        } else {
            Vec::new()
        }
    }
}

/// Obfuscated contacts and client-side rendering markers. Fires regardless
/// of page size or selector hits.
pub struct JsMarkerRule {
    markers: Vec<(&'static str, Regex)>,
}

impl JsMarkerRule {
    pub fn new() -> Self {
        let markers = JS_MARKERS
            .iter()
            .map(|(name, p)| (*name, Regex::new(&format!("(?i){p}")).expect("valid regex")))
            .collect();
        Self { markers }
    }
}

impl Default for JsMarkerRule {
    fn default() -> Self {
        Self::new()
    }
}

impl EscalationRule for JsMarkerRule {
    fn name(&self) -> &'static str {
        "js_markers"
    }

    fn evaluate(&self, input: &EscalationInput<'_>) -> Vec<String> {
        let html = input.html();
        self.markers
            .iter()
            .filter(|(_, re)| re.is_match(html))
            .map(|(name, _)| format!("js:{name}"))
            .collect()
    }
}

/// Repeating team/member cards with no mailto/tel anchors anywhere.
pub struct RepeatingCardsRule {
    card_class: Regex,
    contact_href: Regex,
}

impl RepeatingCardsRule {
    pub fn new() -> Self {
        Self {
            card_class: Regex::new(
                r#"(?i)class\s*=\s*["'][^"']*(?:team|member|profile|person)[^"']*["']"#,
            )
            .expect("valid regex"),
            contact_href: Regex::new(r#"(?i)href\s*=\s*["']?\s*(?:mailto|tel):"#)
                .expect("valid regex"),
        }
    }
}

impl Default for RepeatingCardsRule {
    fn default() -> Self {
        Self::new()
    }
}

impl EscalationRule for RepeatingCardsRule {
    fn name(&self) -> &'static str {
        "repeating_cards"
    }

    fn evaluate(&self, input: &EscalationInput<'_>) -> Vec<String> {
        let html = input.html();
        let cards = self.card_class.find_iter(html).count();
        if cards >= MIN_REPEATING_CARDS && !self.contact_href.is_match(html) {
            vec![REASON_CARDS_NO_ANCHORS.to_string()]
        } else {
            Vec::new()
        }
    }
}

// ── Engine ───────────────────────────────────────────

/// Ordered list of rules; every rule is evaluated and reasons are unioned.
pub struct EscalationEngine {
    rules: Vec<Box<dyn EscalationRule>>,
}

impl Default for EscalationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl EscalationEngine {
    /// Engine with the default rule set.
    pub fn new() -> Self {
        Self::with_rules(vec![
            Box::new(MimeMismatchRule),
            Box::new(ThinPageRule),
            Box::new(AntiBotRule::new()),
            Box::new(JsMarkerRule::new()),
            Box::new(RepeatingCardsRule::new()),
        ])
    }

    pub fn with_rules(rules: Vec<Box<dyn EscalationRule>>) -> Self {
        Self { rules }
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Decide whether the page needs a rendered fetch.
    pub fn decide(&self, fetch: &FetchResult, selector_hits: usize) -> EscalationDecision {
        let input = EscalationInput {
            fetch,
            selector_hits,
        };
        let mut decision = EscalationDecision::default();
        for rule in &self.rules {
            for reason in rule.evaluate(&input) {
                tracing::debug!("escalation rule {} fired: {}", rule.name(), reason);
                decision.add_reason(reason);
            }
        }
        decision
    }
}
