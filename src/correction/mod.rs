//! Correction engine: clinician edits to the AI-proposed codes.
//!
//! A [`ReviewSession`] owns the immutable baseline, the working copy, staged
//! additions and the reason audit trail. Every mutation carries a reason from
//! the fixed taxonomy in [`crate::models::reasons`].

pub mod audit;
pub mod payload;
pub mod session;

pub use audit::*;
pub use payload::*;
pub use session::*;

use serde::Serialize;
use thiserror::Error;

use crate::models::{CodeField, FieldMode, ReasonCategory};

/// Where a rejected duplicate already lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateLocation {
    Committed,
    Pending,
}

impl DuplicateLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Committed => "committed",
            Self::Pending => "pending",
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Self::Committed => "in the list",
            Self::Pending => "pending",
        }
    }
}

impl std::fmt::Display for DuplicateLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CorrectionError {
    #[error("A reason is required to edit {}", .field.label())]
    ReasonRequired { field: CodeField },

    #[error("Unknown {category} reason: {id}")]
    UnknownReason { category: ReasonCategory, id: String },

    #[error("Code is empty")]
    EmptyCode,

    #[error("{code} is already {}", .location.describe())]
    Duplicate {
        code: String,
        location: DuplicateLocation,
    },

    #[error("{} is not being edited (currently {mode})", .field.label())]
    InvalidState { field: CodeField, mode: FieldMode },
}
