// Copyright 2026 Evidence Contacts Contributors
// SPDX-License-Identifier: Apache-2.0

//! Person name and role title extraction inside a card root.

use super::dom::{sel, DomIndex};
use crate::normalize::{collapse_whitespace, normalize_person};
use crate::types::UNKNOWN_ROLE;
use scraper::Selector;
use std::sync::OnceLock;

const MAX_NAME_LEN: usize = 80;
const MAX_NAME_TOKENS: usize = 6;
const MAX_TITLE_LEN: usize = 120;

/// Section headers and UI labels that are never a person.
const NON_PERSON_PHRASES: &[&str] = &[
    "our team",
    "meet the team",
    "mailing address",
    "executive team",
    "leadership team",
    "management team",
    "board of directors",
    "contact us",
    "contact information",
    "get in touch",
    "click here",
    "read more",
    "learn more",
    "view profile",
    "our people",
    "our leadership",
    "office hours",
    "main office",
    "follow us",
    "email us",
    "call us",
    "physical address",
];

const HONORIFICS: &[&str] = &["dr.", "dr", "mr.", "mr", "ms.", "ms", "mrs.", "mrs", "prof.", "prof"];

/// Titles that carry no information and map to "Unknown".
const JUNK_TITLES: &[&str] = &[
    "areas of focus",
    "coming soon",
    "read more",
    "view profile",
    "learn more",
    "bio",
    "biography",
    "email",
    "phone",
    "contact",
    "vcard",
    "download vcard",
];

const NAME_SELECTOR_GROUPS: &[&str] = &[
    "h1, h2, h3, h4",
    ".name, .person-name, .full-name, .member-name, [itemprop=name]",
    ".heading",
    "strong, b",
];

const TITLE_SELECTOR_GROUPS: &[&str] = &[
    ".title, .job-title, .position, .role, .designation, [itemprop=jobTitle]",
    ".subtitle",
    "h5, h6",
    "em, i, p",
];

fn name_selectors() -> &'static [Selector] {
    static SELS: OnceLock<Vec<Selector>> = OnceLock::new();
    SELS.get_or_init(|| NAME_SELECTOR_GROUPS.iter().map(|s| sel(s)).collect())
}

fn title_selectors() -> &'static [Selector] {
    static SELS: OnceLock<Vec<Selector>> = OnceLock::new();
    SELS.get_or_init(|| TITLE_SELECTOR_GROUPS.iter().map(|s| sel(s)).collect())
}

/// True when the text is a section header or UI label rather than a person.
///
/// Phrases match whole words only, so "Pascall Usher" is not "call us".
pub fn is_non_person_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    NON_PERSON_PHRASES.iter().any(|phrase| {
        let phrase: Vec<&str> = phrase.split(' ').collect();
        words.windows(phrase.len()).any(|w| w == phrase.as_slice())
    })
}

/// Node holding `name` in the subtree of `root`, by name-selector priority.
pub fn find_name_node(dom: &DomIndex<'_>, root: usize, name: &str) -> Option<usize> {
    let key = normalize_person(name);
    name_selectors().iter().find_map(|selector| {
        dom.select_within(root, selector).into_iter().find(|&node| {
            clean_name(&dom.text(node)).is_some_and(|n| normalize_person(&n) == key)
        })
    })
}

/// Clean and validate a name candidate.
///
/// Strips honorifics and trailing credentials ("Jane Doe, CPA"), then
/// requires 2..=6 tokens with letters, no digits or `@`, and no stoplisted
/// phrase.
pub fn clean_name(raw: &str) -> Option<String> {
    let text = collapse_whitespace(raw);
    let text = text.split(" | ").next().unwrap_or("").trim();
    let text = match text.split_once(',') {
        Some((head, tail)) if is_credentials(tail) => head.trim(),
        _ => text,
    };

    let mut tokens: Vec<&str> = text.split_whitespace().collect();
    while tokens
        .first()
        .is_some_and(|t| HONORIFICS.contains(&t.to_lowercase().as_str()))
    {
        tokens.remove(0);
    }
    let name = tokens.join(" ");

    if name.is_empty()
        || name.len() > MAX_NAME_LEN
        || name.contains('@')
        || name.chars().any(|c| c.is_ascii_digit())
        || is_non_person_name(&name)
    {
        return None;
    }
    if tokens.len() < 2 || tokens.len() > MAX_NAME_TOKENS {
        return None;
    }
    if !tokens.iter().all(|t| t.chars().any(char::is_alphabetic)) {
        return None;
    }
    Some(name)
}

fn is_credentials(tail: &str) -> bool {
    let tokens: Vec<&str> = tail.split([',', ' ']).filter(|t| !t.is_empty()).collect();
    !tokens.is_empty()
        && tokens.len() <= 3
        && tokens.iter().all(|t| {
            let letters: String = t.chars().filter(|c| c.is_alphabetic()).collect();
            !letters.is_empty() && letters.len() <= 6 && letters.chars().all(|c| c.is_uppercase())
        })
}

/// First valid name in the card, by selector priority then document order.
pub fn extract_name(dom: &DomIndex<'_>, root: usize) -> Option<(usize, String)> {
    for selector in name_selectors() {
        for node in dom.select_within(root, selector) {
            if let Some(name) = clean_name(&dom.text(node)) {
                return Some((node, name));
            }
        }
    }
    None
}

/// Map junk titles to "Unknown"; collapse whitespace otherwise.
pub fn normalize_title(raw: &str) -> String {
    let title = collapse_whitespace(raw);
    let title = title.trim_end_matches([':', ',', ';', '-']).trim();
    if title.is_empty() {
        return UNKNOWN_ROLE.to_string();
    }
    let lower = title.to_lowercase();
    if JUNK_TITLES.iter().any(|j| lower == *j) || lower.starts_with("areas of focus") {
        return UNKNOWN_ROLE.to_string();
    }
    title.to_string()
}

fn is_title_candidate(text: &str, name: &str) -> bool {
    let digits = text.chars().filter(|c| c.is_ascii_digit()).count();
    !text.is_empty()
        && text.len() <= MAX_TITLE_LEN
        && !text.contains('@')
        && digits < 7
        && !text.eq_ignore_ascii_case(name)
        && !text.to_lowercase().contains(&name.to_lowercase())
}

/// Role title inside the card; "Unknown" when nothing usable exists.
pub fn extract_title(dom: &DomIndex<'_>, root: usize, name_node: usize, name: &str) -> String {
    for selector in title_selectors() {
        for node in dom.select_within(root, selector) {
            if node == name_node || dom.contains(node, name_node) || dom.contains(name_node, node) {
                continue;
            }
            let text = dom.text(node);
            if is_title_candidate(&text, name) {
                return normalize_title(&text);
            }
        }
    }
    UNKNOWN_ROLE.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn test_clean_name_rules() {
        assert_eq!(clean_name("  Jane   Doe "), Some("Jane Doe".into()));
        assert_eq!(clean_name("Dr. Jane Doe"), Some("Jane Doe".into()));
        assert_eq!(clean_name("Jane Doe, CPA"), Some("Jane Doe".into()));
        assert_eq!(clean_name("Madonna"), None);
        assert_eq!(clean_name("Mailing Address"), None);
        assert_eq!(clean_name("Meet Our Team Today"), None);
        assert_eq!(clean_name("Meet the Team"), None);
        assert_eq!(clean_name("Room 101 Office"), None);
        assert_eq!(clean_name("jane@x.com Doe"), None);
    }

    #[test]
    fn test_stoplist_matches_whole_words() {
        assert!(is_non_person_name("Call Us Today"));
        assert!(is_non_person_name("OUR TEAM"));
        assert!(!is_non_person_name("Pascall Usher"));
        assert!(!is_non_person_name("Four Teamsters"));
        assert_eq!(clean_name("Pascall Usher"), Some("Pascall Usher".into()));
    }

    #[test]
    fn test_find_name_node_by_normalized_name() {
        let html = r#"<main><h2>Biography</h2><div class="name">Dr. Jane  Doe</div></main>"#;
        let doc = Html::parse_document(html);
        let dom = DomIndex::new(&doc);
        let node = find_name_node(&dom, 0, "Jane Doe").unwrap();
        assert_eq!(dom.tag(node), "div");
        assert!(find_name_node(&dom, 0, "John Roe").is_none());
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("Areas of Focus:"), UNKNOWN_ROLE);
        assert_eq!(normalize_title("Coming soon"), UNKNOWN_ROLE);
        assert_eq!(normalize_title(" Managing   Partner "), "Managing Partner");
        assert_eq!(normalize_title(""), UNKNOWN_ROLE);
    }

    #[test]
    fn test_extract_name_and_title_from_card() {
        let html = r#"<div class="card">
            <h2>Our Team</h2>
            <h3>Jane Doe</h3>
            <p class="title">Managing Partner</p>
        </div>"#;
        let doc = Html::parse_document(html);
        let dom = DomIndex::new(&doc);
        let root = dom.select(&sel("div.card"))[0];
        let (node, name) = extract_name(&dom, root).unwrap();
        assert_eq!(name, "Jane Doe");
        assert_eq!(extract_title(&dom, root, node, &name), "Managing Partner");
    }

    #[test]
    fn test_title_skips_contact_lines() {
        let html = r#"<div class="card"><h3>John Doe</h3><p>20240602</p><p>john@x.com</p></div>"#;
        let doc = Html::parse_document(html);
        let dom = DomIndex::new(&doc);
        let root = dom.select(&sel("div.card"))[0];
        let (node, name) = extract_name(&dom, root).unwrap();
        assert_eq!(extract_title(&dom, root, node, &name), UNKNOWN_ROLE);
    }
}
