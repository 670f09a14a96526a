// Copyright 2026 Evidence Contacts Contributors
// SPDX-License-Identifier: Apache-2.0

//! Card root selection.
//!
//! A "card" is the subtree treated as one person's content. Hint nodes are
//! found with a broad set of person-container selectors and class-name
//! fragments; each hint then climbs at most [`MAX_ASCENT`] levels looking for
//! the nearest ancestor-or-self that repeats among its direct siblings
//! (same tag+class signature at least [`MIN_REPEAT`] times). Without such an
//! ancestor the hint itself is the root.

use super::dom::{sel, DomIndex};
use scraper::Selector;
use std::sync::OnceLock;

pub const MAX_ASCENT: usize = 4;
pub const MIN_REPEAT: usize = 3;

const PERSON_SELECTORS: &str = ".person, .team-member, .employee, .staff-member, .member-card, \
     .bio, .profile, [data-person], [data-team-member], article.person, section.team-member";

const CLASS_HINTS: &[&str] = &[
    "team-member",
    "member",
    "person",
    "people",
    "staff",
    "profile",
    "attorney",
    "employee",
    "card",
];

fn person_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| sel(PERSON_SELECTORS))
}

/// Nodes that look like person containers, in document order.
pub fn hint_nodes(dom: &DomIndex<'_>) -> Vec<usize> {
    let selector = person_selector();
    (0..dom.len())
        .filter(|&i| {
            selector.matches(&dom.element(i))
                || dom.classes(i).iter().any(|c| {
                    let c = c.to_ascii_lowercase();
                    CLASS_HINTS.iter().any(|h| c.contains(h))
                })
        })
        .collect()
}

/// Nearest ancestor-or-self (within the ascent bound) whose signature
/// repeats among its siblings; the hint itself otherwise.
pub fn card_root(dom: &DomIndex<'_>, hint: usize) -> usize {
    let mut cur = hint;
    for _ in 0..=MAX_ASCENT {
        if matches!(dom.tag(cur), "body" | "html") {
            break;
        }
        if dom.same_signature_siblings(cur) >= MIN_REPEAT {
            return cur;
        }
        match dom.parent(cur) {
            Some(p) => cur = p,
            None => break,
        }
    }
    hint
}

/// Distinct card roots in document order.
///
/// Nesting is resolved after root selection: a root enclosing two or more
/// other roots with the same signature is a list wrapper and is dropped.
/// Of the remaining roots, only the outermost are kept, so BEM-style
/// `card__name`/`card__title` parts fold into their card.
pub fn find_card_roots(dom: &DomIndex<'_>) -> Vec<usize> {
    let mut roots: Vec<usize> = hint_nodes(dom)
        .into_iter()
        .map(|h| card_root(dom, h))
        .filter(|&r| !matches!(dom.tag(r), "body" | "html"))
        .collect();
    roots.sort_unstable();
    roots.dedup();

    let wrappers: Vec<usize> = roots
        .iter()
        .copied()
        .filter(|&r| {
            let inner: Vec<String> = roots
                .iter()
                .filter(|&&o| o != r && dom.contains(r, o))
                .map(|&o| dom.signature(o))
                .collect();
            inner
                .iter()
                .enumerate()
                .any(|(i, sig)| inner[i + 1..].contains(sig))
        })
        .collect();
    let kept: Vec<usize> = roots.into_iter().filter(|r| !wrappers.contains(r)).collect();

    kept.iter()
        .copied()
        .filter(|&r| !kept.iter().any(|&o| o != r && dom.contains(o, r)))
        .collect()
}

/// Cheap person-container signal for escalation: number of card roots.
pub fn count_person_containers(html: &str) -> usize {
    let doc = scraper::Html::parse_document(html);
    let dom = DomIndex::new(&doc);
    find_card_roots(&dom).len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn test_repeating_blocks_resolve_to_themselves() {
        let html = r#"<html><body><div class="grid">
            <div class="team-member"><h3>A One</h3></div>
            <div class="team-member"><h3>B Two</h3></div>
            <div class="team-member"><h3>C Three</h3></div>
        </div></body></html>"#;
        let doc = Html::parse_document(html);
        let dom = DomIndex::new(&doc);
        let roots = find_card_roots(&dom);
        assert_eq!(roots.len(), 3);
        for r in roots {
            assert_eq!(dom.signature(r), "div.team-member");
        }
    }

    #[test]
    fn test_inner_hint_climbs_to_repeating_item() {
        let html = r#"<html><body><ul>
            <li><div class="profile-photo"></div><h3>A One</h3></li>
            <li><div class="profile-photo"></div><h3>B Two</h3></li>
            <li><div class="profile-photo"></div><h3>C Three</h3></li>
        </ul></body></html>"#;
        let doc = Html::parse_document(html);
        let dom = DomIndex::new(&doc);
        let roots = find_card_roots(&dom);
        assert_eq!(roots.len(), 3);
        assert!(roots.iter().all(|&r| dom.tag(r) == "li"));
    }

    #[test]
    fn test_single_nested_hint_keeps_outer_card() {
        let html = r#"<html><body>
            <div class="team-member"><div class="member-photo"></div><h3>A One</h3></div>
            <div class="team-member"><div class="member-photo"></div><h3>B Two</h3></div>
        </body></html>"#;
        let doc = Html::parse_document(html);
        let dom = DomIndex::new(&doc);
        let roots = find_card_roots(&dom);
        assert_eq!(roots.len(), 2);
        assert!(roots.iter().all(|&r| dom.signature(r) == "div.team-member"));
    }

    #[test]
    fn test_wrapper_with_people_class_is_dropped() {
        let html = r#"<html><body><section class="people">
            <div class="person"><h3>A One</h3></div>
            <div class="person"><h3>B Two</h3></div>
        </section></body></html>"#;
        assert_eq!(count_person_containers(html), 2);
    }

    #[test]
    fn test_bem_parts_fold_into_card() {
        let html = r#"<html><body><div class="elementor-team-member">
            <div class="elementor-team-member__content">
                <h3 class="elementor-team-member__name">A One</h3>
                <div class="elementor-team-member__position">Partner</div>
            </div></div></body></html>"#;
        let doc = Html::parse_document(html);
        let dom = DomIndex::new(&doc);
        let roots = find_card_roots(&dom);
        assert_eq!(roots.len(), 1);
        assert_eq!(dom.signature(roots[0]), "div.elementor-team-member");
    }

    #[test]
    fn test_no_hints_no_cards() {
        assert_eq!(count_person_containers("<html><body><p>hi</p></body></html>"), 0);
    }
}
