// Copyright 2026 Evidence Contacts Contributors
// SPDX-License-Identifier: Apache-2.0

//! Fast anchor sweep.
//!
//! Every `mailto:`/`tel:` anchor is paired with a name heading: first from
//! the nearest enclosing list-item-like container, then from the nearest
//! preceding heading in document order. The headless extractor runs this
//! walk in-page ([`SWEEP_SCRIPT`]) and hands back a [`SweepReport`]; the
//! static path runs the same walk over a [`DomIndex`] when no card yielded
//! a contact.

use super::dom::{sel, DomIndex};
use super::names::{clean_name, extract_title};
use crate::types::ContactType;
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

const CONTAINER_SELECTOR: &str = "li, article, [class*=list-item], [class*=card], \
     [class*=member], [class*=person], [class*=profile]";
const CONTAINER_HEADING_SELECTOR: &str = "h2, h3, h4, .list-item-content__title";
const PRECEDING_HEADING_SELECTOR: &str = "h1, h2, h3, h4";
const CHROME_SELECTOR: &str = "footer, nav, header";

/// Where a hit's heading came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingSource {
    Container,
    Preceding,
    #[default]
    None,
}

/// One contact anchor found by the sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepHit {
    /// `email` or `phone`.
    pub kind: ContactType,
    pub href: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub via: HeadingSource,
    /// CSS path of the anchor.
    #[serde(default)]
    pub path: Option<String>,
}

/// Everything the in-page sweep returns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub site_name: Option<String>,
    /// Lower-cased text of footer and contact blocks.
    #[serde(default)]
    pub footer: String,
    #[serde(default)]
    pub hits: Vec<SweepHit>,
}

/// In-page version of the sweep. Evaluates to a JSON [`SweepReport`].
pub const SWEEP_SCRIPT: &str = r#"(() => {
  const clean = (s) => (s || '').replace(/\s+/g, ' ').trim();
  const pathOf = (el) => {
    const parts = [];
    let cur = el;
    while (cur && parts.length < 3 && cur.tagName && !['HTML', 'BODY'].includes(cur.tagName)) {
      let seg = cur.tagName.toLowerCase();
      if (cur.classList && cur.classList.length) seg += '.' + cur.classList[0];
      parts.unshift(seg);
      cur = cur.parentElement;
    }
    return parts.join(' > ');
  };
  const headings = Array.from(document.querySelectorAll('h1, h2, h3, h4'));
  const precedingHeading = (el) => {
    let best = null;
    for (const h of headings) {
      if (h.compareDocumentPosition(el) & Node.DOCUMENT_POSITION_FOLLOWING) best = h; else break;
    }
    return best;
  };
  const hits = [];
  const anchors = document.querySelectorAll("a[href^='mailto:' i], a[href^='tel:' i]");
  for (const a of anchors) {
    if (a.closest('footer, nav, header')) continue;
    const href = a.getAttribute('href') || '';
    const kind = href.toLowerCase().startsWith('mailto:') ? 'email' : 'phone';
    let heading = null, role = null, via = 'none';
    const box = a.closest("li, article, [class*=list-item], [class*=card], [class*=member], [class*=person], [class*=profile]");
    if (box) {
      const h = box.querySelector('h2, h3, h4, .list-item-content__title');
      if (h && clean(h.textContent)) {
        heading = clean(h.textContent);
        via = 'container';
        const t = box.querySelector('.title, .job-title, .position, .role, .designation');
        if (t) role = clean(t.textContent);
      }
    }
    if (!heading) {
      const h = precedingHeading(a);
      if (h) { heading = clean(h.textContent); via = 'preceding'; }
    }
    hits.push({ kind, href, text: clean(a.textContent), heading, role, via, path: pathOf(a) });
  }
  const meta = document.querySelector("meta[property='og:site_name']");
  const footer = Array.from(document.querySelectorAll('footer, #footer, .footer, .site-footer, address, #contact, .contact-block'))
    .map((n) => clean(n.textContent)).join(' ').toLowerCase().slice(0, 20000);
  return {
    title: document.title || null,
    site_name: meta ? meta.getAttribute('content') : null,
    footer,
    hits,
  };
})()"#;

fn selectors() -> &'static (Selector, Selector, Selector, Selector) {
    static SELS: OnceLock<(Selector, Selector, Selector, Selector)> = OnceLock::new();
    SELS.get_or_init(|| {
        (
            sel(CONTAINER_SELECTOR),
            sel(CONTAINER_HEADING_SELECTOR),
            sel(PRECEDING_HEADING_SELECTOR),
            sel(CHROME_SELECTOR),
        )
    })
}

/// Run the sweep over a parsed document.
pub fn hits_from_dom(dom: &DomIndex<'_>) -> Vec<SweepHit> {
    hits_within_cards(dom, &[])
}

/// Sweep confined to card roots: anchors outside every card are skipped
/// and preceding-heading lookups do not leave the anchor's card. An empty
/// `cards` slice sweeps the whole page.
pub fn hits_within_cards(dom: &DomIndex<'_>, cards: &[usize]) -> Vec<SweepHit> {
    let (container_sel, container_heading, preceding_heading, chrome) = selectors();
    let mut hits = Vec::new();

    for node in 0..dom.len() {
        if dom.tag(node) != "a" {
            continue;
        }
        let Some(href) = dom.attr(node, "href") else {
            continue;
        };
        let lower = href.trim().to_ascii_lowercase();
        let kind = if lower.starts_with("mailto:") {
            ContactType::Email
        } else if lower.starts_with("tel:") {
            ContactType::Phone
        } else {
            continue;
        };
        if dom.closest(node, chrome).is_some() {
            continue;
        }
        let card = cards.iter().copied().find(|&r| dom.contains(r, node));
        if !cards.is_empty() && card.is_none() {
            continue;
        }

        let mut heading = None;
        let mut role = None;
        let mut via = HeadingSource::None;

        if let Some(container) = dom.closest(node, container_sel) {
            let found = dom
                .select_within(container, container_heading)
                .into_iter()
                .find_map(|h| clean_name(&dom.text(h)).map(|name| (h, name)));
            if let Some((h, name)) = found {
                role = Some(extract_title(dom, container, h, &name));
                heading = Some(name);
                via = HeadingSource::Container;
            }
        }
        if heading.is_none() {
            let within_card = |h: &usize| card.map_or(true, |r| dom.contains(r, *h));
            if let Some(h) = dom.preceding_match(node, preceding_heading).filter(within_card) {
                heading = Some(dom.text(h));
                via = HeadingSource::Preceding;
            }
        }

        hits.push(SweepHit {
            kind,
            href: href.trim().to_string(),
            text: dom.text(node),
            heading,
            role,
            via,
            path: Some(dom.css_path(node)),
        });
    }
    hits
}
