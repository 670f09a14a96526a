// Copyright 2026 Evidence Contacts Contributors
// SPDX-License-Identifier: Apache-2.0

//! End-to-end attribution, deduplication and consolidation scenarios.

use chrono::{Duration, Utc};
use evidence_contacts::{
    consolidate_per_person, dedupe_contacts, AttributorConfig, CaptureMode, Contact,
    ContactAttributor, ContactType, EscalationEngine, EvidenceBuilder, FetchResult, HeadingSource,
    ProfileLead, SiteTally, SweepHit, SweepReport, VerificationStatus, UNKNOWN_ROLE,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn attributor() -> ContactAttributor {
    init_tracing();
    ContactAttributor::default()
}

fn aggressive() -> ContactAttributor {
    ContactAttributor::new(AttributorConfig {
        aggressive: true,
        ..Default::default()
    })
}

fn of_type(contacts: &[Contact], kind: ContactType) -> Vec<&Contact> {
    contacts.iter().filter(|c| c.contact_type == kind).collect()
}

// ── Attribution ──────────────────────────────────────

const TEAM_PAGE: &str = r#"<html><head><title>Team | Acme</title></head><body>
<section class="team">
  <div class="team-member"><h3>Jane Doe</h3><p class="title">CEO</p>
    <a href="mailto:jane@acme.com">Email</a><a href="tel:+1 (555) 123-4567">Call</a></div>
  <div class="team-member"><h3>John Roe</h3><p class="title">CTO</p>
    <a href="mailto:john@acme.com?subject=Hello">Email</a></div>
  <div class="team-member"><h3>Ann Lee</h3><p class="title">Areas of Focus:</p>
    <a href="mailto:%20">ann.lee@acme.com</a></div>
</section></body></html>"#;

#[test]
fn test_team_page_cards() {
    let page = attributor().extract(TEAM_PAGE, "https://acme.com/team", &SiteTally::new());
    assert_eq!(page.company, "Acme");

    let emails = of_type(&page.contacts, ContactType::Email);
    let values: Vec<&str> = emails.iter().map(|c| c.contact_value.as_str()).collect();
    assert_eq!(values, vec!["jane@acme.com", "john@acme.com", "ann.lee@acme.com"]);

    let phones = of_type(&page.contacts, ContactType::Phone);
    assert_eq!(phones.len(), 1);
    assert_eq!(phones[0].person_name, "Jane Doe");
    assert_eq!(phones[0].contact_value, "5551234567");
    assert!(phones[0].evidence.selector_or_xpath.contains("tel:"));

    let ann = emails.iter().find(|c| c.person_name == "Ann Lee").unwrap();
    assert_eq!(ann.role_title, UNKNOWN_ROLE);
    let jane = emails.iter().find(|c| c.person_name == "Jane Doe").unwrap();
    assert_eq!(jane.role_title, "CEO");
    assert!(jane.evidence.selector_or_xpath.contains("mailto:"));
    assert!(page.contacts.iter().all(|c| c.is_verified()));
}

#[test]
fn test_elementor_team_widget() {
    let html = r#"<html><head><title>Our Team - Example</title></head><body>
    <div class="elementor-team-member">
      <div class="elementor-team-member__content">
        <h3 class="elementor-team-member__name">Jane Smith</h3>
        <div class="elementor-team-member__position">Attorney</div>
        <div class="elementor-social-icons">
          <a href="mailto:jane.smith@example.com?subject=Inquiry">e</a>
          <a href="tel:+1-555-123-4567">p</a>
        </div>
      </div>
    </div></body></html>"#;
    let page = attributor().extract(html, "https://example.com/team", &SiteTally::new());
    let email = of_type(&page.contacts, ContactType::Email);
    let phone = of_type(&page.contacts, ContactType::Phone);
    assert_eq!(email.len(), 1);
    assert_eq!(email[0].contact_value, "jane.smith@example.com");
    assert_eq!(email[0].person_name, "Jane Smith");
    assert_eq!(email[0].role_title, UNKNOWN_ROLE);
    assert_eq!(phone.len(), 1);
    assert!(phone[0].contact_value.ends_with("5551234567"));
}

#[test]
fn test_vcard_must_match_person() {
    let html = r#"<html><body>
    <div class="team-member"><h3>Jane Doe</h3>
      <a href="mailto:jane@firm.com">Email</a>
      <a href="/files/john-roe.vcf">vCard</a></div>
    <div class="team-member"><h3>Mark Hall</h3>
      <a href="mailto:mark@firm.com">Email</a>
      <a href="/files/mark-hall.vcf">vCard</a></div>
    </body></html>"#;
    let page = attributor().extract(html, "https://firm.com/team", &SiteTally::new());
    let vcards = of_type(&page.contacts, ContactType::Link);
    assert_eq!(vcards.len(), 1);
    assert_eq!(vcards[0].person_name, "Mark Hall");
    assert_eq!(vcards[0].contact_value, "https://firm.com/files/mark-hall.vcf");
}

#[test]
fn test_footer_email_not_attributed() {
    let html = r#"<html><body>
    <div class="team-member"><h3>Jane Doe</h3><p class="title">Partner</p></div>
    <footer><h4>Contact Us</h4><a href="mailto:info@firm.com">info@firm.com</a></footer>
    </body></html>"#;
    let page = attributor().extract(html, "https://firm.com/team", &SiteTally::new());
    assert!(page.contacts.is_empty());
}

#[test]
fn test_mailing_address_card_skipped() {
    let html = r#"<html><body>
    <div class="team-member"><h3>Mailing Address</h3><p>PO Box 12</p>
      <a href="mailto:office@firm.com">office@firm.com</a></div>
    </body></html>"#;
    let page = attributor().extract(html, "https://firm.com/team", &SiteTally::new());
    assert!(page.contacts.is_empty());
}

#[test]
fn test_text_phone_needs_aggressive_mode_and_marker() {
    let html = r#"<html><body>
    <div class="team-member"><h3>Jane Roe</h3><p class="title">Engineer</p>
      <p>Phone: +1 (401) 555-1234</p></div>
    <div class="team-member"><h3>John Doe</h3><p class="title">Analyst</p>
      <p>Since 20240602 +1 (401) 555-9876</p></div>
    </body></html>"#;
    let url = "https://firm.com/team";

    let plain = attributor().extract(html, url, &SiteTally::new());
    assert!(of_type(&plain.contacts, ContactType::Phone).is_empty());

    let page = aggressive().extract(html, url, &SiteTally::new());
    let phones = of_type(&page.contacts, ContactType::Phone);
    assert_eq!(phones.len(), 1);
    assert_eq!(phones[0].person_name, "Jane Roe");
    assert_eq!(phones[0].contact_value, "4015551234");
    assert!(!phones[0].is_anchor_sourced());
}

#[test]
fn test_foreign_domain_without_signals_rejected() {
    let html = r#"<html><body>
    <div class="team-member"><h3>Jane Doe</h3><a href="mailto:jane@gmail.com">Email</a></div>
    </body></html>"#;
    let page = attributor().extract(html, "https://firm.com/team", &SiteTally::new());
    assert!(page.contacts.is_empty());
}

#[test]
fn test_foreign_domain_with_phone_in_card_accepted() {
    let html = r#"<html><body>
    <div class="team-member"><h3>Jane Doe</h3>
      <a href="mailto:jane@partnerlaw.org">Email</a><a href="tel:6175551234">Call</a></div>
    </body></html>"#;
    let page = attributor().extract(html, "https://firm.com/team", &SiteTally::new());
    let emails = of_type(&page.contacts, ContactType::Email);
    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0].contact_value, "jane@partnerlaw.org");
    assert_eq!(page.foreign_domains.get("partnerlaw.org"), Some(&1));
}

#[test]
fn test_cards_without_contacts_become_leads() {
    let names = ["Alice Adams", "Bob Brown", "Carol Chen", "Dan Davis", "Eve Evans", "Frank Fox"];
    let cards: String = names
        .iter()
        .map(|n| {
            let slug = n.to_lowercase().replace(' ', "-");
            format!(r#"<div class="team-member"><h3>{n}</h3><a href="/people/{slug}">Bio</a></div>"#)
        })
        .collect();
    let html = format!("<html><body><div class=\"grid\">{cards}</div></body></html>");
    let page = attributor().extract(&html, "https://firm.com/team", &SiteTally::new());
    assert!(page.contacts.is_empty());
    assert_eq!(page.leads.len(), 6);
    assert_eq!(page.leads[0].url, "https://firm.com/people/alice-adams");
    assert_eq!(page.leads[5].person_name, "Frank Fox");
}

#[test]
fn test_profile_page_attributed_to_lead() {
    let lead = ProfileLead {
        company: "Firm LLP".into(),
        person_name: "Jane Doe".into(),
        role_title: "Partner".into(),
        url: "https://firm.com/people/jane-doe".into(),
        source_url: "https://firm.com/team".into(),
    };
    let html = r#"<html><body><h1>Jane Doe</h1>
      <a href="mailto:jane@firm.com">Email me</a><a href="tel:6175551234">Call</a></body></html>"#;
    let page = attributor().extract_profile(html, &lead.url, &lead, &SiteTally::new());
    assert_eq!(page.contacts.len(), 2);
    assert!(page.contacts.iter().all(|c| c.company == "Firm LLP"));
    assert!(page.contacts.iter().all(|c| c.role_title == "Partner"));
}

#[test]
fn test_profile_page_ignores_site_chrome_emails() {
    let lead = ProfileLead {
        company: "Firm LLP".into(),
        person_name: "Jane Doe".into(),
        role_title: "Partner".into(),
        url: "https://firm.com/people/jane-doe".into(),
        source_url: "https://firm.com/team".into(),
    };

    let with_main = r#"<html><body>
      <div class="top"><a href="mailto:info@firm.com">info@firm.com</a></div>
      <main><section><div class="name">Jane Doe</div>
        <p><a href="mailto:jane@firm.com">Email Jane</a></p></section></main>
      <footer><a href="tel:6175550000">Main line</a></footer>
    </body></html>"#;
    let page = attributor().extract_profile(with_main, &lead.url, &lead, &SiteTally::new());
    let values: Vec<&str> = page.contacts.iter().map(|c| c.contact_value.as_str()).collect();
    assert_eq!(values, vec!["jane@firm.com"]);
    assert_eq!(page.contacts[0].person_name, "Jane Doe");

    let with_header = r#"<html><body>
      <header><a href="mailto:office@firm.com">Office</a></header>
      <div class="name">Jane Doe</div>
      <div><p><a href="mailto:jdoe@firm.com">Write</a></p></div>
    </body></html>"#;
    let page = attributor().extract_profile(with_header, &lead.url, &lead, &SiteTally::new());
    let values: Vec<&str> = page.contacts.iter().map(|c| c.contact_value.as_str()).collect();
    assert_eq!(values, vec!["jdoe@firm.com"]);
}

#[test]
fn test_contact_block_around_card_does_not_vouch_for_it() {
    let url = "https://firm.com/contact";
    let inside = r#"<html><body><section id="contact">
      <div class="team-member"><h3>Jane Doe</h3><a href="mailto:jane@gmail.com">jane@gmail.com</a></div>
    </section></body></html>"#;
    let page = attributor().extract(inside, url, &SiteTally::new());
    assert!(page.contacts.is_empty());

    let lookalike = r#"<html><body>
      <div class="team-member"><h3>Jane Doe</h3><a href="mailto:jane@gmail.com">Email</a></div>
      <footer>Hosted by notgmail.com</footer>
    </body></html>"#;
    let page = attributor().extract(lookalike, url, &SiteTally::new());
    assert!(page.contacts.is_empty());

    let vouched = r#"<html><body>
      <div class="team-member"><h3>Jane Doe</h3><a href="mailto:jane@partnerlaw.org">Email</a></div>
      <footer>Of counsel to partnerlaw.org</footer>
    </body></html>"#;
    let page = attributor().extract(vouched, url, &SiteTally::new());
    let emails = of_type(&page.contacts, ContactType::Email);
    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0].contact_value, "jane@partnerlaw.org");

    let report = SweepReport {
        footer: "jane doe jane@gmail.com".into(),
        hits: vec![SweepHit {
            kind: ContactType::Email,
            href: "mailto:jane@gmail.com".into(),
            text: "jane@gmail.com".into(),
            heading: Some("Jane Doe".into()),
            role: None,
            via: HeadingSource::Container,
            path: None,
        }],
        ..Default::default()
    };
    let page = attributor().contacts_from_sweep(&report, url, &SiteTally::new());
    assert!(page.contacts.is_empty());
}

#[test]
fn test_page_level_email_not_given_to_last_card() {
    let html = r#"<html><body><div class="grid">
      <div class="team-member"><h3>Amy Able</h3><a href="/people/amy-able">Bio</a></div>
      <div class="team-member"><h3>Bob Best</h3><a href="/people/bob-best">Bio</a></div>
      <div class="team-member"><h3>Zed Last</h3><a href="/people/zed-last">Bio</a></div>
    </div>
    <div class="cta"><a href="mailto:info@firm.com">Get in touch</a></div>
    </body></html>"#;
    let page = attributor().extract(html, "https://firm.com/team", &SiteTally::new());
    assert!(page.contacts.is_empty());
    assert_eq!(page.leads.len(), 3);
}

#[test]
fn test_phone_cue_must_be_a_word_next_to_the_number() {
    let url = "https://firm.com/team";
    let substring_cue = r#"<html><body>
      <div class="team-member"><h3>Jane Doe</h3><img class="hotel-photo" src="/h.jpg">
        <p>Matter reference 6175551234 closed.</p></div>
    </body></html>"#;
    let page = attributor().extract(substring_cue, url, &SiteTally::new());
    assert!(of_type(&page.contacts, ContactType::Phone).is_empty());

    let distant_cue = r#"<html><body>
      <div class="team-member"><h3>Jane Doe</h3>
        <div class="links"><span><i class="fa fa-phone"></i></span></div>
        <div><div><p>Matter reference 6175551234 closed.</p></div></div></div>
    </body></html>"#;
    let page = attributor().extract(distant_cue, url, &SiteTally::new());
    assert!(of_type(&page.contacts, ContactType::Phone).is_empty());

    let icon = r#"<html><body>
      <div class="team-member"><h3>Jane Doe</h3>
        <p><i class="fa fa-phone"></i> 617-555-1234</p></div>
    </body></html>"#;
    let page = attributor().extract(icon, url, &SiteTally::new());
    let phones = of_type(&page.contacts, ContactType::Phone);
    assert_eq!(phones.len(), 1);
    assert_eq!(phones[0].contact_value, "6175551234");
}

#[test]
fn test_static_team_page_end_to_end() {
    let html = r#"<html><body>
    <div class="team-member"><h3>Jane Doe</h3><a href="mailto:jane@firm.com">jane@firm.com</a></div>
    </body></html>"#;
    let url = "https://firm.com/team";
    let page = attributor().extract(html, url, &SiteTally::new());
    assert_eq!(page.contacts.len(), 1);
    let c = &page.contacts[0];
    assert_eq!(c.person_name, "Jane Doe");
    assert_eq!(c.contact_type, ContactType::Email);
    assert_eq!(c.verification_status, VerificationStatus::Verified);

    let fetch = FetchResult {
        url: url.into(),
        status_code: 200,
        mime: Some("text/html".into()),
        content_length: html.len(),
        html: Some(html.into()),
        blocked_by_robots: false,
    };
    let decision = EscalationEngine::new().decide(&fetch, page.contacts.len());
    assert!(!decision.escalate());
}

#[test]
fn test_sweep_report_attribution() {
    let report = SweepReport {
        title: Some("Team | Acme Corp".into()),
        site_name: None,
        footer: String::new(),
        hits: vec![
            SweepHit {
                kind: ContactType::Email,
                href: "mailto:John.Doe@Example.COM".into(),
                text: "Email John".into(),
                heading: Some("John Doe".into()),
                role: Some("Director".into()),
                via: HeadingSource::Container,
                path: Some("ul > li.member".into()),
            },
            SweepHit {
                kind: ContactType::Phone,
                href: "tel:+1 555 123 4567".into(),
                text: "+1 555 123 4567".into(),
                heading: Some("John Doe".into()),
                role: Some("Director".into()),
                via: HeadingSource::Container,
                path: Some("ul > li.member".into()),
            },
        ],
    };
    let page = attributor().contacts_from_sweep(&report, "https://acme.com/team", &SiteTally::new());
    assert_eq!(page.company, "Acme Corp");
    let email = of_type(&page.contacts, ContactType::Email);
    let phone = of_type(&page.contacts, ContactType::Phone);
    assert_eq!(email.len(), 1);
    assert_eq!(email[0].contact_value, "john.doe@example.com");
    assert!(email[0].evidence.selector_or_xpath.contains("mailto"));
    assert!(email[0].evidence.screenshot_ref.contains("headless_"));
    assert_eq!(phone.len(), 1);
    assert_eq!(phone[0].contact_value, "5551234567");
    assert!(phone[0].evidence.selector_or_xpath.contains("tel"));
}

// ── Dedupe and consolidation ─────────────────────────

fn contact(person: &str, kind: ContactType, value: &str, url: &str, selector: &str) -> Contact {
    let evidence = EvidenceBuilder::new().build(CaptureMode::Static, url, selector, value);
    Contact::new("Acme", person, "Unknown", kind, value, evidence).unwrap()
}

const ANCHOR_MAILTO: &str = "div.card a[href*='mailto:']";
const ANCHOR_TEL: &str = "div.card a[href*='tel:']";

#[test]
fn test_anchor_phone_wins_consolidation() {
    let anchor = contact("Pat Kim", ContactType::Phone, "+1 (617) 556-3867", "https://acme.com/team", ANCHOR_TEL);
    let text = contact("Pat Kim", ContactType::Phone, "617 555 0000", "https://acme.com/team", "div.card :contains-phone")
        .with_captured_at(Utc::now() + Duration::hours(1));
    let people = consolidate_per_person(&[text, anchor]);
    assert_eq!(people.len(), 1);
    assert_eq!(people[0].phone.as_deref(), Some("6175563867"));
    assert!(people[0].phone_evidence.is_some());
}

#[test]
fn test_date_like_phone_discarded() {
    let c = contact("Pat Kim", ContactType::Phone, "2023101000", "https://acme.com/team", ANCHOR_TEL);
    let people = consolidate_per_person(&[c]);
    assert_eq!(people.len(), 1);
    assert!(people[0].phone.is_none());
}

#[test]
fn test_email_prefers_name_overlap() {
    let other = contact("Ethan Bevan", ContactType::Email, "bchurchill@acme.com", "https://acme.com/team", ANCHOR_MAILTO);
    let own = contact("Ethan Bevan", ContactType::Email, "ethan.bevan@acme.com", "https://acme.com/team", ANCHOR_MAILTO);
    let people = consolidate_per_person(&[other, own]);
    assert_eq!(people[0].email.as_deref(), Some("ethan.bevan@acme.com"));
}

#[test]
fn test_semantic_path_beats_contact_page() {
    let contact_page = contact("Jane Doe", ContactType::Email, "jdoe@acme.com", "https://acme.com/contact", ANCHOR_MAILTO)
        .with_captured_at(Utc::now() + Duration::hours(1));
    let team_page = contact("Jane Doe", ContactType::Email, "j.doe@acme.com", "https://acme.com/team", ANCHOR_MAILTO);
    let people = consolidate_per_person(&[contact_page, team_page]);
    assert_eq!(people[0].email.as_deref(), Some("j.doe@acme.com"));
}

#[test]
fn test_non_toll_free_phone_preferred() {
    let toll = contact("Jane Doe", ContactType::Phone, "800-555-1234", "https://acme.com/team", ANCHOR_TEL);
    let direct = contact("Jane Doe", ContactType::Phone, "617-555-1234", "https://acme.com/team", ANCHOR_TEL);
    let people = consolidate_per_person(&[toll, direct]);
    assert_eq!(people[0].phone.as_deref(), Some("6175551234"));
}

#[test]
fn test_dedupe_anchor_outranks_text() {
    let text = contact("Jane Doe", ContactType::Email, "jane@acme.com", "https://acme.com/team", "div.card :contains('@')");
    let anchor = contact("Jane Doe", ContactType::Email, "jane@acme.com", "https://acme.com/about", ANCHOR_MAILTO);
    let out = dedupe_contacts(vec![text, anchor]);
    assert_eq!(out.len(), 1);
    assert!(out[0].is_anchor_sourced());
}

#[test]
fn test_name_punctuation_variants_merge() {
    let a = contact("J. W. Alberstadt, Jr.", ContactType::Email, "jw@acme.com", "https://acme.com/team", ANCHOR_MAILTO);
    let b = contact("J. W.Alberstadt, Jr.", ContactType::Phone, "6175551234", "https://acme.com/team", ANCHOR_TEL);
    let people = consolidate_per_person(&[a, b]);
    assert_eq!(people.len(), 1);
    assert_eq!(people[0].person_name, "J. W. Alberstadt, Jr.");
    assert!(people[0].email.is_some() && people[0].phone.is_some());
    assert_eq!(people[0].verification_status(), VerificationStatus::Verified);
}

#[test]
fn test_stoplisted_names_excluded() {
    let a = contact("Executive Team", ContactType::Email, "exec@acme.com", "https://acme.com/team", ANCHOR_MAILTO);
    let b = contact("Mailing Address", ContactType::Email, "mail@acme.com", "https://acme.com/team", ANCHOR_MAILTO);
    let c = contact("Jane Doe", ContactType::Email, "jane@acme.com", "https://acme.com/team", ANCHOR_MAILTO);
    let people = consolidate_per_person(&[a, b, c]);
    assert_eq!(people.len(), 1);
    assert_eq!(people[0].person_name, "Jane Doe");
}
