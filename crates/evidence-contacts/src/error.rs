// Copyright 2026 Evidence Contacts Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error types for contact model validation.

/// Errors raised while building or validating contact records.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ContactError {
    #[error("invalid email: {0}")]
    InvalidEmail(String),

    #[error("invalid phone: {0}")]
    InvalidPhone(String),

    #[error("invalid link: {0}")]
    InvalidLink(String),

    #[error("empty field: {0}")]
    EmptyField(&'static str),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("inconsistent escalation decision: escalate={escalate} with {reasons} reasons")]
    InconsistentDecision { escalate: bool, reasons: usize },
}

pub type ContactResult<T> = Result<T, ContactError>;
