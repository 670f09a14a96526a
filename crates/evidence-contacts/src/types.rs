// Copyright 2026 Evidence Contacts Contributors
// SPDX-License-Identifier: Apache-2.0

//! Core data model: evidence, contacts, fetch results, and per-URL outcomes.

use crate::error::{ContactError, ContactResult};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Placeholder role used when no usable title was found.
pub const UNKNOWN_ROLE: &str = "Unknown";

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$").expect("valid regex")
    })
}

fn semver_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+\.\d+\.\d+(-[A-Za-z0-9]+)?$").expect("valid regex"))
}

/// Kind of contact channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactType {
    Email,
    Phone,
    Link,
}

impl ContactType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactType::Email => "email",
            ContactType::Phone => "phone",
            ContactType::Link => "link",
        }
    }
}

/// Whether a contact's evidence package is complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    Verified,
    Unverified,
}

/// The audit trail proving how and where a contact was extracted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    /// Page the contact was read from.
    pub source_url: String,
    /// CSS selector (or XPath) locating the contact on the page.
    pub selector_or_xpath: String,
    /// Exact text fragment the value was taken from.
    pub verbatim_quote: String,
    /// Reference to the screenshot captured for this contact.
    pub screenshot_ref: String,
    /// When the evidence was captured.
    pub timestamp: DateTime<Utc>,
    /// Version of the extractor that produced the evidence.
    pub parser_version: String,
    /// SHA-256 hex digest of the normalized page text.
    pub content_hash: String,
}

impl Evidence {
    /// True when all seven fields are present and well-formed.
    pub fn is_complete(&self) -> bool {
        let filled = [
            &self.source_url,
            &self.selector_or_xpath,
            &self.verbatim_quote,
            &self.screenshot_ref,
            &self.parser_version,
            &self.content_hash,
        ]
        .iter()
        .all(|s| !s.trim().is_empty());

        filled
            && (self.source_url.starts_with("http://") || self.source_url.starts_with("https://"))
            && self.content_hash.len() == 64
            && self
                .content_hash
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
            && semver_re().is_match(&self.parser_version)
    }
}

/// A single extracted contact channel for one person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub company: String,
    pub person_name: String,
    pub role_title: String,
    pub contact_type: ContactType,
    pub contact_value: String,
    pub evidence: Evidence,
    pub captured_at: DateTime<Utc>,
    /// Derived from `evidence` at construction.
    pub verification_status: VerificationStatus,
}

impl Contact {
    /// Build a validated contact. The value must satisfy its type's syntax
    /// and company/person must be non-blank.
    pub fn new(
        company: impl Into<String>,
        person_name: impl Into<String>,
        role_title: impl Into<String>,
        contact_type: ContactType,
        contact_value: impl Into<String>,
        evidence: Evidence,
    ) -> ContactResult<Self> {
        let company = company.into().trim().to_string();
        let person_name = person_name.into().trim().to_string();
        let mut role_title = role_title.into().trim().to_string();
        let contact_value = contact_value.into().trim().to_string();

        if company.is_empty() {
            return Err(ContactError::EmptyField("company"));
        }
        if person_name.is_empty() {
            return Err(ContactError::EmptyField("person_name"));
        }
        if role_title.is_empty() {
            role_title = UNKNOWN_ROLE.to_string();
        }
        validate_contact_value(contact_type, &contact_value)?;

        let verification_status = if evidence.is_complete() {
            VerificationStatus::Verified
        } else {
            VerificationStatus::Unverified
        };

        Ok(Self {
            company,
            person_name,
            role_title,
            contact_type,
            contact_value,
            captured_at: evidence.timestamp,
            evidence,
            verification_status,
        })
    }

    /// Override the capture time (defaults to the evidence timestamp).
    pub fn with_captured_at(mut self, at: DateTime<Utc>) -> Self {
        self.captured_at = at;
        self
    }

    pub fn is_verified(&self) -> bool {
        self.verification_status == VerificationStatus::Verified
    }

    /// True when the evidence selector points at an `a[href…]` anchor.
    pub fn is_anchor_sourced(&self) -> bool {
        let sel = self.evidence.selector_or_xpath.to_ascii_lowercase();
        sel.contains("a[href")
    }

    pub fn has_known_role(&self) -> bool {
        let role = self.role_title.trim();
        !role.is_empty() && !role.eq_ignore_ascii_case(UNKNOWN_ROLE)
    }
}

/// Check a raw contact value against its type's syntax.
pub fn validate_contact_value(contact_type: ContactType, value: &str) -> ContactResult<()> {
    match contact_type {
        ContactType::Email => {
            if email_re().is_match(value) {
                Ok(())
            } else {
                Err(ContactError::InvalidEmail(value.to_string()))
            }
        }
        ContactType::Phone => {
            let stripped: String = value
                .chars()
                .filter(|c| !(c.is_whitespace() || matches!(c, '-' | '(' | ')' | '+' | '.')))
                .collect();
            let ok = stripped.chars().all(|c| c.is_ascii_digit())
                && (7..=15).contains(&stripped.len());
            if ok {
                Ok(())
            } else {
                Err(ContactError::InvalidPhone(value.to_string()))
            }
        }
        ContactType::Link => {
            let absolute = value.starts_with("http://") || value.starts_with("https://");
            if absolute && url::Url::parse(value).is_ok() {
                Ok(())
            } else {
                Err(ContactError::InvalidLink(value.to_string()))
            }
        }
    }
}

/// Outcome of a static fetch. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchResult {
    /// Final URL after redirects.
    pub url: String,
    /// HTTP status code (0 when no request was made).
    pub status_code: u16,
    /// Lower-cased MIME type without parameters.
    pub mime: Option<String>,
    /// Body size in bytes.
    pub content_length: usize,
    /// Body text, populated only for `text/html` responses.
    pub html: Option<String>,
    pub blocked_by_robots: bool,
}

impl FetchResult {
    /// Result for a URL disallowed by robots.txt.
    pub fn blocked(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status_code: 0,
            mime: None,
            content_length: 0,
            html: None,
            blocked_by_robots: true,
        }
    }

    pub fn is_html(&self) -> bool {
        self.mime.as_deref() == Some("text/html")
    }
}

/// Escalate/no-escalate verdict with the reasons that fired.
///
/// Reasons keep insertion order, never repeat, and are never retracted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawEscalationDecision")]
pub struct EscalationDecision {
    escalate: bool,
    reasons: Vec<String>,
}

/// Wire shape of [`EscalationDecision`], checked before it is accepted.
#[derive(Deserialize)]
struct RawEscalationDecision {
    escalate: bool,
    #[serde(default)]
    reasons: Vec<String>,
}

impl TryFrom<RawEscalationDecision> for EscalationDecision {
    type Error = ContactError;

    fn try_from(raw: RawEscalationDecision) -> ContactResult<Self> {
        let mut unique = raw.reasons.clone();
        unique.sort_unstable();
        unique.dedup();
        if raw.escalate == raw.reasons.is_empty() || unique.len() != raw.reasons.len() {
            return Err(ContactError::InconsistentDecision {
                escalate: raw.escalate,
                reasons: raw.reasons.len(),
            });
        }
        Ok(Self {
            escalate: raw.escalate,
            reasons: raw.reasons,
        })
    }
}

impl EscalationDecision {
    pub fn from_reasons<I, S>(reasons: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut decision = Self::default();
        for reason in reasons {
            decision.add_reason(reason);
        }
        decision
    }

    /// Append a reason (ignored if already present). Sets `escalate`.
    pub fn add_reason(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        if !self.reasons.contains(&reason) {
            self.reasons.push(reason);
        }
        self.escalate = true;
    }

    pub fn escalate(&self) -> bool {
        self.escalate
    }

    pub fn reasons(&self) -> &[String] {
        &self.reasons
    }

    pub fn has_reason(&self, reason: &str) -> bool {
        self.reasons.iter().any(|r| r == reason)
    }
}

/// How a page's contacts were ultimately obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMethod {
    Static,
    Headless,
}

impl std::fmt::Display for FetchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchMethod::Static => write!(f, "static"),
            FetchMethod::Headless => write!(f, "headless"),
        }
    }
}

/// Uniform per-URL result produced by the ingest pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResult {
    pub url: String,
    pub method: FetchMethod,
    pub success: bool,
    pub contacts: Vec<Contact>,
    /// `None` when the pipeline stopped before escalation was evaluated.
    pub escalation_decision: Option<EscalationDecision>,
    pub error: Option<String>,
    pub status_code: Option<u16>,
    pub elapsed_ms: u64,
}

impl IngestResult {
    /// A failed static result with no contacts.
    pub fn failure(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: FetchMethod::Static,
            success: false,
            contacts: Vec::new(),
            escalation_decision: None,
            error: Some(error.into()),
            status_code: None,
            elapsed_ms: 0,
        }
    }
}
