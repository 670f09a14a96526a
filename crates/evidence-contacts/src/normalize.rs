// Copyright 2026 Evidence Contacts Contributors
// SPDX-License-Identifier: Apache-2.0

//! Value normalization shared by attribution and deduplication.
//!
//! - emails: `mailto:` stripping, query removal, lower-casing
//! - phones: digit reduction, NANP country-code trimming, date-like rejection
//! - names/companies: case and whitespace folding for grouping keys
//! - URLs: canonical report form, registrable domain, semantic/listing paths

use url::Url;

/// Paths treated as dedicated people pages when ranking sources.
const SEMANTIC_PATHS: &[&str] = &["/team", "/leadership", "/our-team"];

/// Path fragments that mark a people listing page.
const LISTING_PATTERNS: &[&str] = &["team", "people", "leadership", "management"];

const TOLL_FREE_PREFIXES: &[&str] = &["800", "833", "844", "855", "866", "877", "888"];

/// Second-level labels that make a registrable domain three labels long.
const SECOND_LEVEL_SUFFIXES: &[&str] = &["co", "com", "org", "net", "ac", "gov", "edu"];

// ── Text ─────────────────────────────────────────────

/// Collapse runs of whitespace into single spaces and trim.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Grouping key for company names: lower-cased, whitespace collapsed.
pub fn normalize_company(s: &str) -> String {
    collapse_whitespace(&s.to_lowercase())
}

/// Grouping key for person names: lower-cased, punctuation replaced by
/// spaces, whitespace collapsed. "J. W.Alberstadt" → "j w alberstadt".
pub fn normalize_person(s: &str) -> String {
    let folded: String = s
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect();
    collapse_whitespace(&folded)
}

// ── Emails ───────────────────────────────────────────

/// Clean a `mailto:` href (or bare address) into a lower-cased address.
///
/// Returns `None` when nothing address-like remains.
pub fn sanitize_email(raw: &str) -> Option<String> {
    let mut s = raw.trim();
    if s.get(..7).is_some_and(|p| p.eq_ignore_ascii_case("mailto:")) {
        s = &s[7..];
    }
    let s = s.split('?').next().unwrap_or("");
    let decoded = percent_decode(s);
    let email = decoded.trim().trim_matches(|c| c == '<' || c == '>').to_lowercase();
    if email.contains('@') && !email.starts_with('@') && !email.ends_with('@') {
        Some(email)
    } else {
        None
    }
}

fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hi = (bytes[i + 1] as char).to_digit(16);
            let lo = (bytes[i + 2] as char).to_digit(16);
            if let (Some(hi), Some(lo)) = (hi, lo) {
                out.push((hi * 16 + lo) as u8);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Domain part of an email address, lower-cased.
pub fn email_domain(email: &str) -> Option<String> {
    email
        .rsplit_once('@')
        .map(|(_, d)| d.trim().to_lowercase())
        .filter(|d| !d.is_empty())
}

/// Alphanumeric tokens of an email local part ("ethan.bevan" → ["ethan", "bevan"]).
pub fn local_part_tokens(email: &str) -> Vec<String> {
    let local = email.split('@').next().unwrap_or("");
    local
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

// ── Phones ───────────────────────────────────────────

/// Reduce a phone to digits, dropping a leading NANP `1` on 11-digit numbers.
pub fn phone_digits(raw: &str) -> String {
    let raw = raw.trim();
    let raw = raw
        .strip_prefix("tel:")
        .or_else(|| raw.strip_prefix("TEL:"))
        .unwrap_or(raw);
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() == 11 && digits.starts_with('1') {
        digits[1..].to_string()
    } else {
        digits
    }
}

/// True when the first eight digits read as a `YYYYMMDD` date.
pub fn is_date_like(digits: &str) -> bool {
    if digits.len() < 8 || !digits.chars().take(8).all(|c| c.is_ascii_digit()) {
        return false;
    }
    let century = &digits[0..2];
    let month: u32 = digits[4..6].parse().unwrap_or(0);
    let day: u32 = digits[6..8].parse().unwrap_or(0);
    (century == "19" || century == "20") && (1..=12).contains(&month) && (1..=31).contains(&day)
}

/// Digit count acceptable for a person's direct phone.
pub fn is_plausible_phone(digits: &str) -> bool {
    (10..=15).contains(&digits.len()) && !is_date_like(digits)
}

/// North American toll-free prefixes (800, 833, …).
pub fn is_toll_free(digits: &str) -> bool {
    TOLL_FREE_PREFIXES.iter().any(|p| digits.starts_with(p))
}

// ── URLs ─────────────────────────────────────────────

/// Lower-cased host with a leading `www.` removed.
pub fn site_host(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    Some(host.strip_prefix("www.").unwrap_or(&host).to_string())
}

/// Canonical URL for ranking and reporting: lower-case host without `www.`,
/// no query or fragment, trailing slash trimmed except at the root.
pub fn normalize_url_for_report(url: &str) -> String {
    let Ok(parsed) = Url::parse(url.trim()) else {
        return url.trim().to_string();
    };
    let Some(host) = parsed.host_str() else {
        return url.trim().to_string();
    };
    let host = host.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    let port = parsed.port().map(|p| format!(":{p}")).unwrap_or_default();
    let mut path = parsed.path().to_string();
    while path.len() > 1 && path.ends_with('/') {
        path.pop();
    }
    if path == "/" {
        format!("{}://{host}{port}/", parsed.scheme())
    } else {
        format!("{}://{host}{port}{path}", parsed.scheme())
    }
}

/// Registrable domain: the last two labels, or three for `co.uk`-style
/// second-level suffixes.
pub fn registrable_domain(host: &str) -> String {
    let host = host.trim().trim_end_matches('.').to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
    if labels.len() <= 2 {
        return labels.join(".");
    }
    let second = labels[labels.len() - 2];
    let take = if SECOND_LEVEL_SUFFIXES.contains(&second) && labels[labels.len() - 1].len() == 2 {
        3
    } else {
        2
    };
    labels[labels.len() - take..].join(".")
}

/// Normalized Levenshtein similarity in `[0, 1]`.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        cur[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            cur[j + 1] = (prev[j + 1] + 1).min(cur[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    1.0 - prev[b.len()] as f64 / longest as f64
}

/// True for `/team`, `/leadership`, `/our-team` (and their sub-paths).
pub fn is_semantic_path(url: &str) -> bool {
    let path = Url::parse(url)
        .map(|u| u.path().to_lowercase())
        .unwrap_or_default();
    let path = path.trim_end_matches('/');
    SEMANTIC_PATHS
        .iter()
        .any(|p| path == *p || path.starts_with(&format!("{p}/")) || path.ends_with(p))
}

/// True when the URL path looks like a people listing page.
pub fn is_listing_url(url: &str) -> bool {
    let path = Url::parse(url)
        .map(|u| u.path().to_lowercase())
        .unwrap_or_default();
    LISTING_PATTERNS.iter().any(|p| path.contains(p))
}
