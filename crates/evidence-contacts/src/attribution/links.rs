// Copyright 2026 Evidence Contacts Contributors
// SPDX-License-Identifier: Apache-2.0

//! Nearest-link attribution inside a card.
//!
//! Each channel walks a fixed strategy list and stops at the first strategy
//! that yields an acceptable candidate:
//!
//! 1. `Anchor`: `mailto:`/`tel:` anchors in the card, nearest to the name
//!    node by LCA distance
//! 2. `LinksContainer`: the same anchors inside close siblings whose class
//!    marks them as a links/icons strip
//! 3. `AttributeLabel`: `data-email`/`data-phone`, `aria-label` and `title`
//!    values (plus Cloudflare `data-cfemail` in aggressive mode)
//! 4. `IconAdjacent`: a mail/phone icon or label right next to a plain-text
//!    value vouches for it
//! 5. `FreeText`: raw text; phones additionally need aggressive mode and a
//!    nearby marker word

use super::dom::DomIndex;
use super::PageContext;
use crate::evidence::{
    SEL_ARIA, SEL_CFEMAIL, SEL_DATA_ATTR, SEL_MAILTO, SEL_TEL, SEL_TEXT_EMAIL, SEL_TEXT_PHONE,
    SEL_VCARD,
};
use crate::normalize::{is_date_like, is_plausible_phone, phone_digits, sanitize_email};
use crate::types::{validate_contact_value, ContactType};
use regex::Regex;
use std::sync::OnceLock;

/// Element siblings inspected on each side of the card for links strips.
const SIBLING_SPAN: usize = 2;

/// Characters before a text phone searched for a marker word.
const MARKER_WINDOW: usize = 30;

/// Largest LCA distance between a cue element and the value it vouches for.
const CUE_DISTANCE: usize = 2;

const LINKS_CONTAINER_HINTS: &[&str] = &[
    "links",
    "contact-links",
    "member-links",
    "social",
    "contact-info",
    "icons",
    "team-links",
];

const EMAIL_CUES: &[&str] = &["envelope", "email", "mail"];
const PHONE_CUES: &[&str] = &["phone", "telephone", "call", "tel", "mobile"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Strategy {
    Anchor,
    LinksContainer,
    AttributeLabel,
    IconAdjacent,
    FreeText,
}

const STRATEGIES: [Strategy; 5] = [
    Strategy::Anchor,
    Strategy::LinksContainer,
    Strategy::AttributeLabel,
    Strategy::IconAdjacent,
    Strategy::FreeText,
];

/// A contact value located in the DOM.
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    pub value: String,
    pub node: usize,
    pub selector: String,
    pub quote: String,
    pub anchor: bool,
    pub strategy: Strategy,
}

fn email_text_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}").expect("valid regex")
    })
}

fn phone_text_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\+?\(?\d[\d\s().\-]{6,}\d").expect("valid regex"))
}

fn marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:phone|tel|telephone|mobile|cell|direct|office|call)\b|телефон|тел\.?|telefon|téléphone")
            .expect("valid regex")
    })
}

pub(crate) fn email_regex() -> &'static Regex {
    email_text_re()
}

// ── Public entry points ──────────────────────────────

/// Best phone for the card that passes `accept`, or `None`.
pub(crate) fn find_phone(
    ctx: &PageContext<'_, '_>,
    root: usize,
    name_node: usize,
    mut accept: impl FnMut(&Candidate) -> bool,
) -> Option<Candidate> {
    for strategy in STRATEGIES {
        let mut found = phone_candidates(ctx, root, strategy);
        sort_by_distance(ctx.dom, &mut found, name_node);
        if let Some(c) = found.into_iter().find(|c| accept(c)) {
            return Some(c);
        }
    }
    None
}

/// Best email for the card that passes `accept` (the trust check).
pub(crate) fn find_email(
    ctx: &PageContext<'_, '_>,
    root: usize,
    name_node: usize,
    mut accept: impl FnMut(&Candidate) -> bool,
) -> Option<Candidate> {
    for strategy in STRATEGIES {
        let mut found = email_candidates(ctx, root, strategy);
        sort_by_distance(ctx.dom, &mut found, name_node);
        for c in found {
            if accept(&c) {
                return Some(c);
            }
            tracing::debug!("dropped untrusted email {} ({:?})", c.value, c.strategy);
        }
    }
    None
}

/// A `.vcf` link whose path carries a token of the person's name.
pub(crate) fn find_vcard(ctx: &PageContext<'_, '_>, root: usize, name: &str) -> Option<Candidate> {
    let tokens: Vec<String> = name
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 3)
        .map(String::from)
        .collect();
    let dom = ctx.dom;

    for node in dom.subtree(root) {
        if dom.tag(node) != "a" {
            continue;
        }
        let Some(href) = dom.attr(node, "href") else {
            continue;
        };
        let path = href.split(['?', '#']).next().unwrap_or("").to_lowercase();
        if !path.ends_with(".vcf") {
            continue;
        }
        if !tokens.iter().any(|t| path.contains(t.as_str())) {
            tracing::debug!("skipped shared vCard {href} for {name}");
            continue;
        }
        let Some(absolute) = ctx.absolute_url(href) else {
            continue;
        };
        if validate_contact_value(ContactType::Link, &absolute).is_err() {
            continue;
        }
        let text = dom.text(node);
        return Some(Candidate {
            quote: if text.is_empty() { absolute.clone() } else { text },
            value: absolute,
            node,
            selector: format!("{} {}", dom.css_path(root), SEL_VCARD),
            anchor: true,
            strategy: Strategy::Anchor,
        });
    }
    None
}

/// Decode Cloudflare's `data-cfemail` hex (first byte is the XOR key).
pub fn decode_cfemail(encoded: &str) -> Option<String> {
    let bytes = hex::decode(encoded.trim()).ok()?;
    let (key, rest) = bytes.split_first()?;
    let decoded: Vec<u8> = rest.iter().map(|b| b ^ key).collect();
    String::from_utf8(decoded).ok()
}

// ── Candidate gathering ──────────────────────────────

fn sort_by_distance(dom: &DomIndex<'_>, found: &mut [Candidate], name_node: usize) {
    found.sort_by_key(|c| (dom.lca_distance(name_node, c.node), c.node));
}

fn links_containers(dom: &DomIndex<'_>, root: usize) -> Vec<usize> {
    let sig = dom.signature(root);
    dom.close_siblings(root, SIBLING_SPAN)
        .into_iter()
        .filter(|&s| dom.signature(s) != sig)
        .filter(|&s| {
            dom.classes(s).iter().any(|c| {
                let c = c.to_ascii_lowercase();
                LINKS_CONTAINER_HINTS.iter().any(|h| c.contains(h))
            })
        })
        .collect()
}

/// True when a word of `text` (split on anything but letters and digits)
/// is one of `cues`: `fa-phone` names a phone, `hotel-photo` does not.
fn names_cue(text: &str, cues: &[&str]) -> bool {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| cues.contains(&word))
}

/// Elements in the card whose class or label names one of `cues`.
fn cue_nodes(dom: &DomIndex<'_>, root: usize, cues: &[&str]) -> Vec<usize> {
    dom.subtree(root)
        .filter(|&i| {
            dom.classes(i).iter().any(|c| names_cue(c, cues))
                || ["aria-label", "title"]
                    .iter()
                    .any(|a| dom.attr(i, a).is_some_and(|v| names_cue(v, cues)))
        })
        .collect()
}

fn next_to_cue(dom: &DomIndex<'_>, cues: &[usize], node: usize) -> bool {
    cues.iter().any(|&c| dom.lca_distance(c, node) <= CUE_DISTANCE)
}

fn anchors_with_scheme<'a>(dom: &DomIndex<'a>, scope: usize, scheme: &str) -> Vec<(usize, &'a str)> {
    dom.subtree(scope)
        .filter(|&i| dom.tag(i) == "a")
        .filter_map(|i| dom.attr(i, "href").map(|h| (i, h)))
        .filter(|(_, h)| {
            h.trim()
                .get(..scheme.len())
                .is_some_and(|p| p.eq_ignore_ascii_case(scheme))
        })
        .collect()
}

fn email_from_anchor(dom: &DomIndex<'_>, node: usize, href: &str) -> Option<(String, String)> {
    let text = dom.text(node);
    let value = sanitize_email(href)
        .filter(|e| validate_contact_value(ContactType::Email, e).is_ok())
        .or_else(|| {
            sanitize_email(&text).filter(|e| validate_contact_value(ContactType::Email, e).is_ok())
        })?;
    let quote = if text.is_empty() { value.clone() } else { text };
    Some((value, quote))
}

fn email_candidates(ctx: &PageContext<'_, '_>, root: usize, strategy: Strategy) -> Vec<Candidate> {
    let dom = ctx.dom;
    let card_path = dom.css_path(root);
    let mut out = Vec::new();

    match strategy {
        Strategy::Anchor | Strategy::LinksContainer => {
            let scopes = if strategy == Strategy::Anchor {
                vec![root]
            } else {
                links_containers(dom, root)
            };
            for scope in scopes {
                let path = dom.css_path(scope);
                for (node, href) in anchors_with_scheme(dom, scope, "mailto:") {
                    if let Some((value, quote)) = email_from_anchor(dom, node, href) {
                        out.push(Candidate {
                            value,
                            node,
                            selector: format!("{path} {SEL_MAILTO}"),
                            quote,
                            anchor: true,
                            strategy,
                        });
                    }
                }
            }
        }
        Strategy::AttributeLabel => {
            for node in dom.subtree(root) {
                if let Some(v) = dom.attr(node, "data-email").and_then(sanitize_email) {
                    push_email(&mut out, v, node, format!("{card_path} {SEL_DATA_ATTR}"), strategy);
                }
                for attr in ["aria-label", "title"] {
                    if let Some(m) = dom.attr(node, attr).and_then(|v| email_text_re().find(v)) {
                        let v = m.as_str().to_lowercase();
                        push_email(&mut out, v, node, format!("{card_path} {SEL_ARIA}"), strategy);
                    }
                }
                if ctx.aggressive {
                    if let Some(v) = cfemail_value(dom, node) {
                        push_email(&mut out, v, node, format!("{card_path} {SEL_CFEMAIL}"), strategy);
                    }
                }
            }
        }
        Strategy::IconAdjacent => {
            let cues = cue_nodes(dom, root, EMAIL_CUES);
            if !cues.is_empty() {
                for (value, node) in text_emails(dom, root) {
                    if next_to_cue(dom, &cues, node) {
                        push_email(&mut out, value, node, format!("{card_path} {SEL_ARIA}"), strategy);
                    }
                }
            }
        }
        Strategy::FreeText => {
            for (value, node) in text_emails(dom, root) {
                push_email(&mut out, value, node, format!("{card_path} {SEL_TEXT_EMAIL}"), strategy);
            }
        }
    }
    out
}

fn push_email(out: &mut Vec<Candidate>, value: String, node: usize, selector: String, strategy: Strategy) {
    if validate_contact_value(ContactType::Email, &value).is_err() {
        return;
    }
    out.push(Candidate {
        quote: value.clone(),
        value,
        node,
        selector,
        anchor: false,
        strategy,
    });
}

fn cfemail_value(dom: &DomIndex<'_>, node: usize) -> Option<String> {
    if let Some(encoded) = dom.attr(node, "data-cfemail") {
        return decode_cfemail(encoded).map(|e| e.to_lowercase());
    }
    let href = dom.attr(node, "href")?;
    let (_, encoded) = href.split_once("/cdn-cgi/l/email-protection#")?;
    decode_cfemail(encoded).map(|e| e.to_lowercase())
}

/// Email addresses in the card's text with the deepest element holding each.
fn text_emails(dom: &DomIndex<'_>, root: usize) -> Vec<(String, usize)> {
    let text = dom.text(root);
    email_text_re()
        .find_iter(&text)
        .map(|m| {
            let raw = m.as_str();
            (raw.to_lowercase(), holder(dom, root, raw))
        })
        .collect()
}

/// Deepest element in the subtree whose text contains `needle`.
fn holder(dom: &DomIndex<'_>, root: usize, needle: &str) -> usize {
    dom.subtree(root)
        .rev()
        .find(|&i| dom.text(i).contains(needle))
        .unwrap_or(root)
}

fn phone_candidates(ctx: &PageContext<'_, '_>, root: usize, strategy: Strategy) -> Vec<Candidate> {
    let dom = ctx.dom;
    let card_path = dom.css_path(root);
    let mut out = Vec::new();

    match strategy {
        Strategy::Anchor | Strategy::LinksContainer => {
            let scopes = if strategy == Strategy::Anchor {
                vec![root]
            } else {
                links_containers(dom, root)
            };
            for scope in scopes {
                let path = dom.css_path(scope);
                for (node, href) in anchors_with_scheme(dom, scope, "tel:") {
                    let digits = phone_digits(href);
                    if validate_contact_value(ContactType::Phone, &digits).is_err() || is_date_like(&digits) {
                        continue;
                    }
                    let text = dom.text(node);
                    out.push(Candidate {
                        quote: if text.is_empty() { href.trim().to_string() } else { text },
                        value: digits,
                        node,
                        selector: format!("{path} {SEL_TEL}"),
                        anchor: true,
                        strategy,
                    });
                }
            }
        }
        Strategy::AttributeLabel => {
            for node in dom.subtree(root) {
                let mut raw: Vec<&str> = Vec::new();
                if let Some(v) = dom.attr(node, "data-phone") {
                    raw.push(v);
                }
                for attr in ["aria-label", "title"] {
                    if let Some(m) = dom.attr(node, attr).and_then(|v| phone_text_re().find(v)) {
                        raw.push(m.as_str());
                    }
                }
                for r in raw {
                    let digits = phone_digits(r);
                    if is_plausible_phone(&digits) {
                        out.push(Candidate {
                            value: digits,
                            node,
                            selector: format!("{card_path} {SEL_ARIA}"),
                            quote: r.trim().to_string(),
                            anchor: false,
                            strategy,
                        });
                    }
                }
            }
        }
        Strategy::IconAdjacent => {
            let cues = cue_nodes(dom, root, PHONE_CUES);
            if !cues.is_empty() {
                out.extend(
                    text_phones(dom, root, false, strategy, &card_path)
                        .into_iter()
                        .filter(|c| next_to_cue(dom, &cues, c.node)),
                );
            }
        }
        Strategy::FreeText => {
            if ctx.aggressive {
                out.extend(text_phones(dom, root, true, strategy, &card_path));
            }
        }
    }
    out
}

/// Phones in the card text: 10–15 digits, not date-like, and (when
/// `need_marker`) a marker word shortly before the number.
fn text_phones(
    dom: &DomIndex<'_>,
    root: usize,
    need_marker: bool,
    strategy: Strategy,
    card_path: &str,
) -> Vec<Candidate> {
    let text = dom.text(root);
    let mut out = Vec::new();
    for m in phone_text_re().find_iter(&text) {
        let digits = phone_digits(m.as_str());
        if !is_plausible_phone(&digits) {
            continue;
        }
        if need_marker && !has_marker_before(&text, m.start()) {
            continue;
        }
        let raw = m.as_str().trim();
        out.push(Candidate {
            value: digits,
            node: holder(dom, root, raw),
            selector: format!("{card_path} {SEL_TEXT_PHONE}"),
            quote: raw.to_string(),
            anchor: false,
            strategy,
        });
    }
    out
}

fn has_marker_before(text: &str, start: usize) -> bool {
    let window: String = {
        let before: Vec<char> = text[..start].chars().rev().take(MARKER_WINDOW).collect();
        before.into_iter().rev().collect()
    };
    if window.to_lowercase().contains("fax") {
        return false;
    }
    marker_re().is_match(&window)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_cfemail() {
        // key 0x42, "a@b.co"
        let plain = b"a@b.co";
        let mut encoded = String::from("42");
        for b in plain {
            encoded.push_str(&format!("{:02x}", b ^ 0x42));
        }
        assert_eq!(decode_cfemail(&encoded).as_deref(), Some("a@b.co"));
        assert_eq!(decode_cfemail("zz"), None);
    }

    #[test]
    fn test_cues_match_whole_words() {
        assert!(names_cue("fa fa-phone", PHONE_CUES));
        assert!(names_cue("icon_envelope", EMAIL_CUES));
        assert!(names_cue("Call Jane", PHONE_CUES));
        assert!(!names_cue("hotel-photo", PHONE_CUES));
        assert!(!names_cue("recall-notice", PHONE_CUES));
        assert!(!names_cue("mailbox-art", EMAIL_CUES));
    }

    #[test]
    fn test_marker_window() {
        let text = "Jane Roe Engineer Phone: +1 (401) 555-1234";
        let start = text.find('+').unwrap();
        assert!(has_marker_before(text, start));
        let text = "John Doe 20240602 +1 (401) 555-1234";
        let start = text.find('+').unwrap();
        assert!(!has_marker_before(text, start));
        let text = "Fax: 401 555 1234";
        assert!(!has_marker_before(text, 5));
    }
}
