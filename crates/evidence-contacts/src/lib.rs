// Copyright 2026 Evidence Contacts Contributors
// SPDX-License-Identifier: Apache-2.0

//! Evidence Contacts: core library for evidence-grade contact extraction.
//!
//! Everything in this crate is synchronous and free of I/O: it takes HTML
//! strings and fetch metadata in, and hands owned contact records back out.
//! The async fetch/escalate/render shell lives in `evidence-contacts-ingest`.

pub mod attribution;
pub mod dedupe;
pub mod error;
pub mod escalation;
pub mod evidence;
pub mod normalize;
pub mod types;

pub use attribution::{
    count_person_containers, AttributorConfig, ContactAttributor, HeadingSource, PageExtraction,
    ProfileLead, SiteTally, SweepHit, SweepReport, TrustWeights, SWEEP_SCRIPT,
};
pub use dedupe::{consolidate_per_person, dedupe_contacts, PersonRecord};
pub use error::{ContactError, ContactResult};
pub use escalation::{EscalationEngine, EscalationRule, TARGET_URL_NO_CONTACTS};
pub use evidence::{CaptureMode, EvidenceBuilder, PARSER_VERSION};
pub use types::*;
