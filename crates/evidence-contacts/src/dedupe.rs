// Copyright 2026 Evidence Contacts Contributors
// SPDX-License-Identifier: Apache-2.0

//! Run-level deduplication and per-person consolidation.
//!
//! [`dedupe_contacts`] collapses identical (company, person, type, value)
//! records to the best-sourced instance. [`consolidate_per_person`] then
//! folds each person's channels into one [`PersonRecord`].

use crate::attribution::names::is_non_person_name;
use crate::normalize::{
    is_date_like, is_plausible_phone, is_semantic_path, is_toll_free, local_part_tokens,
    normalize_company, normalize_person, normalize_url_for_report, phone_digits,
};
use crate::types::{Contact, ContactType, Evidence, VerificationStatus, UNKNOWN_ROLE};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::cmp::Reverse;
use std::collections::HashMap;

type DedupeKey = (String, String, ContactType, String);

fn dedupe_key(c: &Contact) -> DedupeKey {
    let value = match c.contact_type {
        ContactType::Phone => phone_digits(&c.contact_value),
        ContactType::Email => c.contact_value.trim().to_lowercase(),
        ContactType::Link => c.contact_value.trim().to_string(),
    };
    (
        normalize_company(&c.company),
        normalize_person(&c.person_name),
        c.contact_type,
        value,
    )
}

/// Quality tuple; larger is better, compared lexicographically.
fn quality(c: &Contact) -> (bool, bool, bool, Reverse<usize>, DateTime<Utc>) {
    (
        c.is_anchor_sourced(),
        is_semantic_path(&c.evidence.source_url),
        c.has_known_role(),
        Reverse(normalize_url_for_report(&c.evidence.source_url).len()),
        c.captured_at,
    )
}

/// Keep the best instance of each normalized contact key.
///
/// Output order follows the first time each key was seen.
pub fn dedupe_contacts(contacts: Vec<Contact>) -> Vec<Contact> {
    let mut slots: Vec<Contact> = Vec::new();
    let mut index: HashMap<DedupeKey, usize> = HashMap::new();

    for c in contacts {
        let key = dedupe_key(&c);
        match index.get(&key) {
            Some(&i) => {
                if quality(&c) > quality(&slots[i]) {
                    slots[i] = c;
                }
            }
            None => {
                index.insert(key, slots.len());
                slots.push(c);
            }
        }
    }
    slots
}

// ── Consolidation ────────────────────────────────────

/// One person with their best channel of each kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonRecord {
    pub company: String,
    pub person_name: String,
    pub role_title: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub vcard: Option<String>,
    pub email_evidence: Option<Evidence>,
    pub phone_evidence: Option<Evidence>,
    pub vcard_evidence: Option<Evidence>,
}

impl PersonRecord {
    /// At least one channel, and every chosen channel has complete evidence.
    pub fn evidence_complete(&self) -> bool {
        let chosen: Vec<&Evidence> = [&self.email_evidence, &self.phone_evidence, &self.vcard_evidence]
            .into_iter()
            .flatten()
            .collect();
        !chosen.is_empty() && chosen.iter().all(|e| e.is_complete())
    }

    pub fn verification_status(&self) -> VerificationStatus {
        if self.evidence_complete() {
            VerificationStatus::Verified
        } else {
            VerificationStatus::Unverified
        }
    }

    /// Stable upsert key: SHA-256 hex of `normalized_person@company`.
    pub fn norm_key(&self) -> String {
        let company: String = self.company.chars().filter(|c| !c.is_whitespace()).collect();
        let raw = format!("{}@{}", normalize_person(&self.person_name), company);
        let mut hasher = Sha256::new();
        hasher.update(raw.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Count of person-name tokens present in the email's local part.
fn name_overlap(person: &str, email: &str) -> usize {
    let local = local_part_tokens(email).join("");
    normalize_person(person)
        .split_whitespace()
        .filter(|t| t.chars().count() >= 2 && local.contains(t))
        .count()
}

fn best_by<'c, K: Ord>(
    group: &[&'c Contact],
    kind: ContactType,
    filter: impl Fn(&Contact) -> bool,
    key: impl Fn(&Contact) -> K,
) -> Option<&'c Contact> {
    let mut best: Option<&Contact> = None;
    for c in group.iter().copied().filter(|c| c.contact_type == kind && filter(c)) {
        // Strictly greater keeps the first seen on ties.
        if best.map_or(true, |b| key(c) > key(b)) {
            best = Some(c);
        }
    }
    best
}

fn consolidate_group(group: &[&Contact]) -> PersonRecord {
    let first = group[0];
    let semantic = |c: &Contact| is_semantic_path(&c.evidence.source_url);

    let email = best_by(group, ContactType::Email, |_| true, |c| {
        (
            c.is_anchor_sourced(),
            semantic(c),
            name_overlap(&first.person_name, &c.contact_value),
            c.captured_at,
        )
    });

    let phone = best_by(
        group,
        ContactType::Phone,
        |c| {
            let digits = phone_digits(&c.contact_value);
            is_plausible_phone(&digits) && !is_date_like(&digits)
        },
        |c| {
            (
                c.is_anchor_sourced(),
                semantic(c),
                !is_toll_free(&phone_digits(&c.contact_value)),
                c.captured_at,
            )
        },
    );

    let vcard = best_by(group, ContactType::Link, |_| true, |c| (semantic(c), c.captured_at));

    let role_title = group
        .iter()
        .map(|c| c.role_title.trim())
        .filter(|r| !r.is_empty() && *r != UNKNOWN_ROLE)
        .fold(None::<&str>, |best, r| match best {
            Some(b) if b.chars().count() >= r.chars().count() => Some(b),
            _ => Some(r),
        })
        .unwrap_or(UNKNOWN_ROLE)
        .to_string();

    PersonRecord {
        company: first.company.clone(),
        person_name: first.person_name.clone(),
        role_title,
        email: email.map(|c| c.contact_value.trim().to_lowercase()),
        phone: phone.map(|c| phone_digits(&c.contact_value)),
        vcard: vcard.map(|c| c.contact_value.clone()),
        email_evidence: email.map(|c| c.evidence.clone()),
        phone_evidence: phone.map(|c| c.evidence.clone()),
        vcard_evidence: vcard.map(|c| c.evidence.clone()),
    }
}

/// Fold contacts into one record per normalized (company, person).
///
/// Stoplisted non-person names are dropped before grouping. Groups keep
/// first-seen order.
pub fn consolidate_per_person(contacts: &[Contact]) -> Vec<PersonRecord> {
    let mut order: Vec<(String, String)> = Vec::new();
    let mut groups: HashMap<(String, String), Vec<&Contact>> = HashMap::new();

    for c in contacts.iter().filter(|c| !is_non_person_name(&c.person_name)) {
        let key = (normalize_company(&c.company), normalize_person(&c.person_name));
        groups
            .entry(key.clone())
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(c);
    }

    order
        .iter()
        .filter_map(|k| groups.get(k))
        .map(|group| consolidate_group(group))
        .collect()
}
