// Copyright 2026 Evidence Contacts Contributors
// SPDX-License-Identifier: Apache-2.0

//! Evidence Contacts ingest: the async shell around the core library.
//!
//! Robots-aware static fetching, escalation to a budgeted headless browser,
//! profile follow-ups, candidate page discovery and multi-URL runs.

pub mod budget;
pub mod config;
pub mod discovery;
pub mod error;
pub mod fetcher;
pub mod follow_up;
pub mod headless;
pub mod http_client;
pub mod pipeline;
pub mod renderer;
pub mod robots;
pub mod run;

pub use budget::{BudgetDenial, BudgetGate, BudgetSnapshot, DomainTracker, DomainUsage, HeadlessBudget};
pub use config::IngestConfig;
pub use error::IngestError;
pub use fetcher::{PageFetcher, StaticFetcher};
pub use follow_up::FollowUpBudget;
pub use headless::HeadlessExtractor;
pub use pipeline::IngestPipeline;
pub use renderer::{NoopRenderer, RenderContext, Renderer};
pub use run::{PageSummary, RunReport, RunStats};
