// Copyright 2026 Evidence Contacts Contributors
// SPDX-License-Identifier: Apache-2.0

//! Candidate page discovery: fixed include paths plus in-domain links whose
//! text or href looks like a people or contact section.

use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::OnceLock;
use url::Url;

/// Default number of discovered links per root page.
pub const MAX_DISCOVERED_LINKS: usize = 20;

const KEYWORDS: &[&str] = &[
    // English
    "team", "leadership", "management", "people", "staff", "executives", "board",
    "about", "contacts", "contact",
    // Russian
    "команда", "руководство", "менеджмент", "дирек", "о компании", "контакты",
    "совет директоров",
    // German
    "leitung", "über uns", "ueber uns", "kontakt", "impressum", "mitarbeiter", "vorstand",
    "geschäftsführung", "geschaeftsfuehrung",
];

fn anchor_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("a[href]").expect("valid selector"))
}

/// Lower-case host, drop query and fragment, trim the trailing slash except
/// at the root. Non-URLs come back unchanged.
pub fn normalize_url(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };
    parsed.set_query(None);
    parsed.set_fragment(None);
    let path = parsed.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        parsed.set_path(path.trim_end_matches('/'));
    }
    parsed.to_string()
}

/// `base` followed by each include path joined to it, deduplicated in order.
/// Anything that is not an http(s) URL is returned alone.
pub fn expand_candidate_urls(base: &str, include_paths: &[String]) -> Vec<String> {
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        return vec![base.to_string()];
    }
    let mut out = vec![base.trim_end_matches('/').to_string()];
    if let Ok(parsed) = Url::parse(base) {
        for p in include_paths {
            let path = if p.starts_with('/') {
                p.clone()
            } else {
                format!("/{p}")
            };
            if let Ok(joined) = parsed.join(&path) {
                out.push(joined.to_string());
            }
        }
    }
    let mut seen = HashSet::new();
    out.retain(|u| seen.insert(u.clone()));
    out
}

fn bare_host(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    Some(host.strip_prefix("www.").unwrap_or(&host).to_string())
}

fn is_candidate_link(text: &str, href: &str) -> bool {
    let text = text.to_lowercase();
    let href = href.to_lowercase();
    KEYWORDS
        .iter()
        .any(|k| text.contains(k) || href.contains(k))
}

/// In-domain people/contact links on `html`, normalized, at most `max_links`.
pub fn discover_links(base_url: &str, html: &str, max_links: usize) -> Vec<String> {
    let Ok(base) = Url::parse(base_url) else {
        return Vec::new();
    };
    let base_host = bare_host(&base);
    let doc = Html::parse_document(html);

    let mut out = Vec::new();
    let mut seen = HashSet::new();
    for a in doc.select(anchor_selector()) {
        if out.len() >= max_links {
            break;
        }
        let Some(href) = a.value().attr("href") else {
            continue;
        };
        if href.is_empty() || href.contains('?') || href.contains('#') {
            continue;
        }
        let text: String = a.text().collect();
        if !is_candidate_link(text.trim(), href) {
            continue;
        }
        let Ok(abs) = base.join(href) else {
            continue;
        };
        if !matches!(abs.scheme(), "http" | "https") || bare_host(&abs) != base_host {
            continue;
        }
        let normalized = normalize_url(abs.as_str());
        if seen.insert(normalized.clone()) {
            out.push(normalized);
        }
    }
    out
}
