//! Remote code extraction and correction submission.

pub mod types;
pub mod client;

pub use types::*;
pub use client::*;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodingError {
    #[error("Coding service is not reachable at {0}")]
    Connection(String),

    #[error("Coding service returned error (status {status}): {body}")]
    Http { status: u16, body: String },

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Code extraction failed: {0}")]
    ExtractionRejected(String),

    #[error("Correction submission failed: {0}")]
    SubmissionFailure(String),
}
