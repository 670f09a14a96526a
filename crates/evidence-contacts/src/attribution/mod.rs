// Copyright 2026 Evidence Contacts Contributors
// SPDX-License-Identifier: Apache-2.0

//! Contact attribution: from HTML to per-person contact records.
//!
//! Pipeline for one document:
//!
//! 1. **Card roots**: person-container hints are lifted to the nearest
//!    repeating ancestor ([`cards`]).
//! 2. **Name/title**: priority selectors inside the card only ([`names`]).
//! 3. **Channels**: phone, vCard and email per card through a prioritized
//!    strategy list; foreign email domains must pass the trust check
//!    ([`trust`]).
//! 4. **Page fallback**: when no card produced anything, contact anchors are
//!    paired with container or preceding headings ([`sweep`]).
//! 5. **Per-person cap**: at most one email and one phone per
//!    (company, person).
//!
//! All entry points are synchronous because `scraper`'s tree types are
//! `!Send`. Callers in async code pass the HTML string in and get owned
//! results back. Failures on a single card or anchor drop that candidate
//! and extraction carries on.

pub mod cards;
pub mod dom;
mod links;
pub mod names;
pub mod sweep;
pub mod trust;

pub use cards::count_person_containers;
pub use links::decode_cfemail;
pub use sweep::{hits_from_dom, hits_within_cards, HeadingSource, SweepHit, SweepReport, SWEEP_SCRIPT};
pub use trust::{SiteTally, TrustSignals, TrustVerdict, TrustWeights};

use crate::evidence::{CaptureMode, EvidenceBuilder, SEL_MAILTO, SEL_TEL, PARSER_VERSION};
use crate::normalize::{
    collapse_whitespace, email_domain, is_date_like, normalize_company, normalize_person,
    phone_digits, sanitize_email, site_host,
};
use crate::types::{validate_contact_value, Contact, ContactType, UNKNOWN_ROLE};
use dom::{sel, DomIndex};
use links::Candidate;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;
use url::Url;

const MAX_COMPANY_LEN: usize = 100;

const REVEAL_PHRASES: &[&str] = &[
    "reveal email",
    "show email",
    "click to email",
    "click to reveal",
    "email me",
];

const FOOTER_SELECTOR: &str =
    "footer, #footer, .footer, .site-footer, address, #contact, .contact-block";

const NEGATIVE_ZONES: &[&str] = &["press", "careers", "jobs", "newsroom", "news", "media"];

/// Site chrome never attributed to a profile's subject.
const CHROME_SELECTOR: &str = "header, nav, footer, aside";

const MAIN_CONTENT_SELECTOR: &str = "main, [role=main]";

/// Title words that say nothing about the company.
const GENERIC_TITLE_WORDS: &[&str] = &[
    "our", "the", "team", "people", "about", "us", "leadership", "management", "contact",
    "contacts", "staff", "meet", "home", "attorneys", "lawyers", "professionals",
];

fn footer_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| sel(FOOTER_SELECTOR))
}

fn chrome_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| sel(CHROME_SELECTOR))
}

fn main_content_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| sel(MAIN_CONTENT_SELECTOR))
}

// ── Configuration and results ────────────────────────

/// Attributor settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributorConfig {
    /// Enables Cloudflare email decoding and marker-gated free-text phones.
    pub aggressive: bool,
    pub weights: TrustWeights,
    /// Stamped into evidence; must be semver for records to verify.
    pub parser_version: String,
}

impl Default for AttributorConfig {
    fn default() -> Self {
        Self {
            aggressive: false,
            weights: TrustWeights::default(),
            parser_version: PARSER_VERSION.to_string(),
        }
    }
}

/// A named person whose card had no email or phone but linked to a
/// same-site page that may have them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileLead {
    pub company: String,
    pub person_name: String,
    pub role_title: String,
    /// Absolute profile URL.
    pub url: String,
    /// Listing page the lead was found on.
    pub source_url: String,
}

/// Output of one document extraction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageExtraction {
    pub company: String,
    pub contacts: Vec<Contact>,
    pub leads: Vec<ProfileLead>,
    /// Foreign email domains seen on the page (distinct addresses per
    /// domain), to be merged into the run's [`SiteTally`].
    pub foreign_domains: HashMap<String, usize>,
}

// ── Page-wide trust inputs ───────────────────────────

pub(crate) struct PageSignals<'t> {
    pub site: String,
    pub page_domains: HashMap<String, usize>,
    /// Lower-cased text of every footer/contact block on the page.
    pub footer_text: String,
    pub negative_zone: bool,
    pub tally: &'t SiteTally,
}

impl PageSignals<'_> {
    /// `footer_text` must not contain the candidate's own card or address.
    fn signals_for(
        &self,
        domain: &str,
        footer_text: &str,
        anchor_origin: bool,
        phone_in_card: bool,
        vcard_in_card: bool,
        reveal_phrase: bool,
    ) -> TrustSignals {
        let page_repeat = self.page_domains.get(domain).copied().unwrap_or(0);
        TrustSignals {
            anchor_origin,
            phone_in_card,
            vcard_in_card,
            reveal_phrase,
            page_repeat,
            site_repeat: self.tally.count(&self.site, domain) + page_repeat,
            footer_mention: mentions_domain(footer_text, domain),
            negative_zone: self.negative_zone,
        }
    }

    /// Page footer text with every occurrence of `email` blanked out.
    fn footer_without(&self, email: &str) -> String {
        self.footer_text.replace(email, " ")
    }

    fn foreign_domains(&self) -> HashMap<String, usize> {
        self.page_domains
            .iter()
            .filter(|(d, _)| !trust::is_same_site(&self.site, d))
            .map(|(d, n)| (d.clone(), *n))
            .collect()
    }
}

/// True when `domain` occurs in `text` as a whole host name: "gmail.com"
/// matches "jane@gmail.com" and "mail.gmail.com" but not "notgmail.com".
pub(crate) fn mentions_domain(text: &str, domain: &str) -> bool {
    if domain.is_empty() {
        return false;
    }
    let is_host_char = |c: char| c.is_alphanumeric() || c == '-';
    text.match_indices(domain).any(|(start, m)| {
        let before_ok = !text[..start].chars().next_back().is_some_and(is_host_char);
        let mut after = text[start + m.len()..].chars();
        let after_ok = match after.next() {
            None => true,
            Some('.') => !after.next().is_some_and(is_host_char),
            Some(c) => !is_host_char(c),
        };
        before_ok && after_ok
    })
}

fn domain_counts<'e>(emails: impl IntoIterator<Item = &'e str>) -> HashMap<String, usize> {
    let distinct: HashSet<&str> = emails.into_iter().collect();
    let mut counts = HashMap::new();
    for email in distinct {
        if let Some(d) = email_domain(email) {
            *counts.entry(d).or_insert(0) += 1;
        }
    }
    counts
}

fn is_negative_zone(url: &str) -> bool {
    Url::parse(url)
        .map(|u| {
            u.path()
                .to_lowercase()
                .split(['/', '-', '_'])
                .any(|seg| NEGATIVE_ZONES.contains(&seg))
        })
        .unwrap_or(false)
}

/// Per-document state shared by the link strategies.
pub(crate) struct PageContext<'d, 'a> {
    pub dom: &'d DomIndex<'a>,
    pub base: Option<Url>,
    pub aggressive: bool,
    pub page: PageSignals<'d>,
    footer_nodes: Vec<usize>,
}

impl PageContext<'_, '_> {
    pub fn absolute_url(&self, href: &str) -> Option<String> {
        let joined = match &self.base {
            Some(base) => base.join(href.trim()).ok()?,
            None => Url::parse(href.trim()).ok()?,
        };
        matches!(joined.scheme(), "http" | "https").then(|| joined.to_string())
    }

    /// Footer/contact block text that lies outside the card at `root`.
    fn footer_text_outside(&self, root: usize) -> String {
        self.footer_nodes
            .iter()
            .filter(|&&f| !self.dom.contains(root, f))
            .map(|&f| self.dom.text_excluding(f, root))
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }

    fn in_chrome(&self, node: usize) -> bool {
        self.dom.closest(node, chrome_selector()).is_some()
    }
}

// ── Attributor ───────────────────────────────────────

/// Extracts per-person contacts from HTML and sweep reports.
#[derive(Debug, Clone)]
pub struct ContactAttributor {
    config: AttributorConfig,
    evidence: EvidenceBuilder,
}

impl Default for ContactAttributor {
    fn default() -> Self {
        Self::new(AttributorConfig::default())
    }
}

impl ContactAttributor {
    pub fn new(config: AttributorConfig) -> Self {
        let evidence = EvidenceBuilder::new().with_parser_version(config.parser_version.clone());
        Self { config, evidence }
    }

    pub fn config(&self) -> &AttributorConfig {
        &self.config
    }

    /// Extract from statically fetched HTML.
    pub fn extract(&self, html: &str, source_url: &str, tally: &SiteTally) -> PageExtraction {
        self.extract_document(html, source_url, tally, CaptureMode::Static)
    }

    /// Extract from a rendered DOM snapshot (headless fallback path).
    pub fn extract_rendered(&self, html: &str, source_url: &str, tally: &SiteTally) -> PageExtraction {
        self.extract_document(html, source_url, tally, CaptureMode::Headless)
    }

    fn extract_document(
        &self,
        html: &str,
        source_url: &str,
        tally: &SiteTally,
        mode: CaptureMode,
    ) -> PageExtraction {
        let doc = Html::parse_document(html);
        let dom = DomIndex::new(&doc);
        let company = company_name(&doc, source_url);
        let ctx = self.page_context(&dom, source_url, tally);

        let mut contacts = Vec::new();
        let mut leads = Vec::new();
        let roots = cards::find_card_roots(&dom);
        tracing::debug!("{} card roots on {}", roots.len(), source_url);

        for &root in &roots {
            let (found, lead) = self.extract_card(&ctx, &company, root, source_url, mode);
            contacts.extend(found);
            leads.extend(lead);
        }

        if contacts.is_empty() {
            let hits = sweep::hits_within_cards(&dom, &roots);
            if !hits.is_empty() {
                tracing::debug!("no card contacts on {source_url}; sweeping {} anchors", hits.len());
                contacts = self.attribute_hits(&hits, &ctx.page, &company, source_url, mode);
            }
        }

        PageExtraction {
            company,
            contacts: cap_per_person(contacts),
            leads,
            foreign_domains: ctx.page.foreign_domains(),
        }
    }

    fn page_context<'d, 'a>(
        &self,
        dom: &'d DomIndex<'a>,
        source_url: &str,
        tally: &'d SiteTally,
    ) -> PageContext<'d, 'a> {
        let mut emails: Vec<String> = Vec::new();
        for i in 0..dom.len() {
            if dom.tag(i) == "a" {
                if let Some(e) = dom
                    .attr(i, "href")
                    .filter(|h| h.trim().to_ascii_lowercase().starts_with("mailto:"))
                    .and_then(sanitize_email)
                {
                    emails.push(e);
                }
            }
        }
        let body_text = if dom.is_empty() { String::new() } else { dom.text(0) };
        emails.extend(
            links::email_regex()
                .find_iter(&body_text)
                .map(|m| m.as_str().to_lowercase()),
        );

        let footer_nodes = dom.select(footer_selector());
        let footer_text = footer_nodes
            .iter()
            .map(|&i| dom.text(i))
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        PageContext {
            dom,
            base: Url::parse(source_url).ok(),
            aggressive: self.config.aggressive,
            page: PageSignals {
                site: site_host(source_url).unwrap_or_default(),
                page_domains: domain_counts(emails.iter().map(String::as_str)),
                footer_text,
                negative_zone: is_negative_zone(source_url),
                tally,
            },
            footer_nodes,
        }
    }

    fn extract_card(
        &self,
        ctx: &PageContext<'_, '_>,
        company: &str,
        root: usize,
        source_url: &str,
        mode: CaptureMode,
    ) -> (Vec<Contact>, Option<ProfileLead>) {
        let dom = ctx.dom;
        let Some((name_node, name)) = names::extract_name(dom, root) else {
            tracing::debug!("card {} has no valid name", dom.css_path(root));
            return (Vec::new(), None);
        };
        let role = names::extract_title(dom, root, name_node, &name);

        let phone = links::find_phone(ctx, root, name_node, |_| true);
        let vcard = links::find_vcard(ctx, root, &name);
        let card_text = dom.text(root).to_lowercase();
        let reveal = REVEAL_PHRASES.iter().any(|p| card_text.contains(p));
        let footer = ctx.footer_text_outside(root);

        let email = links::find_email(ctx, root, name_node, |c| {
            self.accepts(&ctx.page, &c.value, |domain| {
                ctx.page.signals_for(
                    domain,
                    &footer,
                    c.anchor,
                    phone.is_some(),
                    vcard.is_some(),
                    reveal,
                )
            })
        });

        let mut out = Vec::new();
        let found = [
            (ContactType::Email, &email),
            (ContactType::Phone, &phone),
            (ContactType::Link, &vcard),
        ];
        for (kind, cand) in found {
            if let Some(c) = cand {
                if let Some(contact) =
                    self.candidate_contact(company, &name, &role, kind, c, source_url, mode)
                {
                    out.push(contact);
                }
            }
        }

        let lead = if email.is_none() && phone.is_none() {
            profile_link(ctx, root, source_url).map(|url| ProfileLead {
                company: company.to_string(),
                person_name: name.clone(),
                role_title: role.clone(),
                url,
                source_url: source_url.to_string(),
            })
        } else {
            None
        };

        (out, lead)
    }

    /// Trust decision for one email; same-site emails always pass.
    fn accepts(
        &self,
        page: &PageSignals<'_>,
        email: &str,
        signals: impl FnOnce(&str) -> TrustSignals,
    ) -> bool {
        let Some(domain) = email_domain(email) else {
            return false;
        };
        if trust::is_same_site(&page.site, &domain) {
            return true;
        }
        let signals = signals(&domain);
        let verdict = trust::evaluate(&page.site, &domain, &signals, &self.config.weights);
        tracing::debug!("cross-domain {email} on {}: {:?}", page.site, verdict);
        verdict.is_accepted()
    }

    #[allow(clippy::too_many_arguments)]
    fn candidate_contact(
        &self,
        company: &str,
        name: &str,
        role: &str,
        kind: ContactType,
        c: &Candidate,
        source_url: &str,
        mode: CaptureMode,
    ) -> Option<Contact> {
        let evidence = self.evidence.build(mode, source_url, &c.selector, &c.quote);
        match Contact::new(company, name, role, kind, c.value.clone(), evidence) {
            Ok(contact) => Some(contact),
            Err(e) => {
                tracing::debug!("dropped {} candidate for {name}: {e}", kind.as_str());
                None
            }
        }
    }

    /// Turn anchor hits (from the in-page sweep or the static fallback)
    /// into contacts.
    fn attribute_hits(
        &self,
        hits: &[SweepHit],
        page: &PageSignals<'_>,
        company: &str,
        source_url: &str,
        mode: CaptureMode,
    ) -> Vec<Contact> {
        let headings_with_phone: HashSet<&str> = hits
            .iter()
            .filter(|h| h.kind == ContactType::Phone)
            .filter_map(|h| h.heading.as_deref())
            .collect();

        let mut out = Vec::new();
        for hit in hits {
            let Some(name) = hit.heading.as_deref().and_then(names::clean_name) else {
                tracing::debug!("sweep hit {} has no usable heading", hit.href);
                continue;
            };
            let role = hit
                .role
                .as_deref()
                .map(names::normalize_title)
                .unwrap_or_else(|| UNKNOWN_ROLE.to_string());

            let (value, suffix) = match hit.kind {
                ContactType::Email => {
                    let value = sanitize_email(&hit.href)
                        .filter(|e| validate_contact_value(ContactType::Email, e).is_ok())
                        .or_else(|| {
                            sanitize_email(&hit.text)
                                .filter(|e| validate_contact_value(ContactType::Email, e).is_ok())
                        });
                    let Some(value) = value else {
                        continue;
                    };
                    let phone_in_card = hit
                        .heading
                        .as_deref()
                        .is_some_and(|h| headings_with_phone.contains(h));
                    let trusted = self.accepts(page, &value, |domain| {
                        let footer = page.footer_without(&value);
                        page.signals_for(domain, &footer, true, phone_in_card, false, false)
                    });
                    if !trusted {
                        continue;
                    }
                    (value, SEL_MAILTO)
                }
                ContactType::Phone => {
                    let digits = phone_digits(&hit.href);
                    if validate_contact_value(ContactType::Phone, &digits).is_err()
                        || is_date_like(&digits)
                    {
                        continue;
                    }
                    (digits, SEL_TEL)
                }
                ContactType::Link => continue,
            };

            let selector = match hit.path.as_deref() {
                Some(path) if !path.is_empty() => format!("{path} {suffix}"),
                _ => suffix.to_string(),
            };
            let quote = if hit.text.trim().is_empty() {
                hit.href.clone()
            } else {
                hit.text.clone()
            };
            let evidence = self.evidence.build(mode, source_url, &selector, &quote);
            match Contact::new(company, &name, &role, hit.kind, value, evidence) {
                Ok(c) => out.push(c),
                Err(e) => tracing::debug!("dropped sweep hit for {name}: {e}"),
            }
        }
        out
    }

    /// Contacts from an in-page sweep report.
    pub fn contacts_from_sweep(
        &self,
        report: &SweepReport,
        source_url: &str,
        tally: &SiteTally,
    ) -> PageExtraction {
        let company = report
            .site_name
            .as_deref()
            .map(collapse_whitespace)
            .filter(|s| !s.is_empty())
            .or_else(|| report.title.as_deref().and_then(company_from_title))
            .unwrap_or_else(|| host_company(source_url));
        let company = truncate_chars(&company, MAX_COMPANY_LEN);

        let emails: Vec<String> = report
            .hits
            .iter()
            .filter(|h| h.kind == ContactType::Email)
            .filter_map(|h| sanitize_email(&h.href))
            .collect();
        let page = PageSignals {
            site: site_host(source_url).unwrap_or_default(),
            page_domains: domain_counts(emails.iter().map(String::as_str)),
            footer_text: report.footer.to_lowercase(),
            negative_zone: is_negative_zone(source_url),
            tally,
        };

        let contacts =
            self.attribute_hits(&report.hits, &page, &company, source_url, CaptureMode::Headless);
        PageExtraction {
            company,
            contacts: cap_per_person(contacts),
            leads: Vec::new(),
            foreign_domains: page.foreign_domains(),
        }
    }

    /// Contacts for one profile lead from its profile page.
    ///
    /// Contacts named for the lead are kept; failing that, the page's
    /// nearest trusted mailto/tel anchors are attributed to the lead.
    pub fn extract_profile(
        &self,
        html: &str,
        profile_url: &str,
        lead: &ProfileLead,
        tally: &SiteTally,
    ) -> PageExtraction {
        let mut page = self.extract(html, profile_url, tally);
        let key = normalize_person(&lead.person_name);

        let mut matched: Vec<Contact> = page
            .contacts
            .drain(..)
            .filter(|c| normalize_person(&c.person_name) == key)
            .collect();

        if matched.is_empty() {
            matched = self.lead_anchor_contacts(html, profile_url, lead, tally);
        }

        for c in &mut matched {
            c.company = lead.company.clone();
            if !c.has_known_role() && lead.role_title != UNKNOWN_ROLE {
                c.role_title = lead.role_title.clone();
            }
        }

        page.company = lead.company.clone();
        page.contacts = cap_per_person(matched);
        page.leads.clear();
        page
    }

    fn lead_anchor_contacts(
        &self,
        html: &str,
        profile_url: &str,
        lead: &ProfileLead,
        tally: &SiteTally,
    ) -> Vec<Contact> {
        let doc = Html::parse_document(html);
        let dom = DomIndex::new(&doc);
        if dom.is_empty() {
            return Vec::new();
        }
        let ctx = self.page_context(&dom, profile_url, tally);

        // Distance is measured from the lead's name on the profile page and
        // the search stays inside its main content when the page has one.
        let name_node = names::find_name_node(&dom, 0, &lead.person_name);
        let scope = match name_node {
            Some(n) => dom.closest(n, main_content_selector()),
            None => dom.select(main_content_selector()).into_iter().next(),
        }
        .unwrap_or(0);
        let origin = name_node.unwrap_or(scope);
        let usable = |c: &Candidate| c.anchor && !ctx.in_chrome(c.node);

        let phone = links::find_phone(&ctx, scope, origin, usable);
        let email = links::find_email(&ctx, scope, origin, |c| {
            usable(c)
                && self.accepts(&ctx.page, &c.value, |domain| {
                    let footer = ctx.page.footer_without(&c.value);
                    ctx.page
                        .signals_for(domain, &footer, true, phone.is_some(), false, false)
                })
        });

        [(ContactType::Email, email), (ContactType::Phone, phone)]
            .into_iter()
            .filter_map(|(kind, c)| {
                let c = c?;
                self.candidate_contact(
                    &lead.company,
                    &lead.person_name,
                    &lead.role_title,
                    kind,
                    &c,
                    profile_url,
                    CaptureMode::Static,
                )
            })
            .collect()
    }
}

// ── Helpers ──────────────────────────────────────────

/// First same-site, non-contact link inside the card.
fn profile_link(ctx: &PageContext<'_, '_>, root: usize, source_url: &str) -> Option<String> {
    let dom = ctx.dom;
    let source = crate::normalize::normalize_url_for_report(source_url);
    dom.subtree(root)
        .filter(|&i| dom.tag(i) == "a")
        .filter_map(|i| dom.attr(i, "href"))
        .filter(|h| {
            let h = h.trim().to_ascii_lowercase();
            !(h.is_empty()
                || h.starts_with('#')
                || h.starts_with("mailto:")
                || h.starts_with("tel:")
                || h.starts_with("javascript:")
                || h.split(['?', '#']).next().unwrap_or("").ends_with(".vcf"))
        })
        .filter_map(|h| ctx.absolute_url(h))
        .find(|abs| {
            site_host(abs).as_deref() == Some(ctx.page.site.as_str())
                && crate::normalize::normalize_url_for_report(abs) != source
        })
}

/// Keep at most one email and one phone per (company, person): anchor
/// over text, then known role over "Unknown", then first seen. vCard links
/// are deduplicated by value.
pub fn cap_per_person(contacts: Vec<Contact>) -> Vec<Contact> {
    let mut best: HashMap<(String, String, ContactType, Option<String>), usize> = HashMap::new();
    for (i, c) in contacts.iter().enumerate() {
        let value_key = (c.contact_type == ContactType::Link).then(|| c.contact_value.clone());
        let key = (
            normalize_company(&c.company),
            normalize_person(&c.person_name),
            c.contact_type,
            value_key,
        );
        match best.get(&key) {
            Some(&j) => {
                let cur = &contacts[j];
                let rank = |x: &Contact| (x.is_anchor_sourced(), x.has_known_role());
                if rank(c) > rank(cur) {
                    best.insert(key, i);
                }
            }
            None => {
                best.insert(key, i);
            }
        }
    }
    let keep: HashSet<usize> = best.into_values().collect();
    contacts
        .into_iter()
        .enumerate()
        .filter(|(i, _)| keep.contains(i))
        .map(|(_, c)| c)
        .collect()
}

/// Company name from `og:site_name`, the page title, or the host.
pub fn company_name(doc: &Html, source_url: &str) -> String {
    static META: OnceLock<Selector> = OnceLock::new();
    static TITLE: OnceLock<Selector> = OnceLock::new();
    let meta = META.get_or_init(|| sel("meta[property='og:site_name']"));
    let title = TITLE.get_or_init(|| sel("title"));

    let from_meta = doc
        .select(meta)
        .next()
        .and_then(|m| m.value().attr("content"))
        .map(collapse_whitespace)
        .filter(|s| !s.is_empty());
    let name = from_meta
        .or_else(|| {
            doc.select(title)
                .next()
                .and_then(|t| company_from_title(&t.text().collect::<String>()))
        })
        .unwrap_or_else(|| host_company(source_url));
    truncate_chars(&name, MAX_COMPANY_LEN)
}

fn company_from_title(title: &str) -> Option<String> {
    let title = collapse_whitespace(title);
    split_title(&title).into_iter().find(|seg| {
        !seg.is_empty()
            && !seg
                .split_whitespace()
                .all(|w| GENERIC_TITLE_WORDS.contains(&w.to_lowercase().as_str()))
    })
}

fn split_title(title: &str) -> Vec<String> {
    let mut segments = vec![title.to_string()];
    for sep in [" | ", " - ", " – ", " — ", " :: "] {
        segments = segments
            .iter()
            .flat_map(|s| s.split(sep).map(|p| p.trim().to_string()).collect::<Vec<_>>())
            .collect();
    }
    segments
}

fn host_company(source_url: &str) -> String {
    site_host(source_url).unwrap_or_else(|| source_url.to_string())
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
