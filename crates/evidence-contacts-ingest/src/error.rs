// Copyright 2026 Evidence Contacts Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error types for the ingest pipeline.
//!
//! The `Display` strings are what lands in `IngestResult.error`.

use crate::budget::BudgetDenial;

#[derive(thiserror::Error, Debug)]
pub enum IngestError {
    #[error("blocked by robots.txt")]
    RobotsBlocked,

    #[error("HTTP {0}")]
    Http(u16),

    #[error("headless quota exceeded for {domain}: {denial}")]
    QuotaExceeded { domain: String, denial: BudgetDenial },

    #[error("headless failed: {0}")]
    Headless(String),

    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("timed out after {0}ms")]
    Timeout(u64),
}
