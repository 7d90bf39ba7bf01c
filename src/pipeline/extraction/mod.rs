//! Intake: turns a report's pasted text or ordered files into one combined
//! text block, driving the remote OCR service one file at a time.

pub mod types;
pub mod ocr;
pub mod orchestrator;
pub mod selection;

pub use types::*;
pub use ocr::*;
pub use orchestrator::*;
pub use selection::*;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IntakeError {
    #[error("No input to process")]
    NoData,

    #[error("A report cannot mix pasted text and files")]
    MixedInputs,

    #[error("OCR failed for file {} ({file_name}): {message}", .file_ordinal + 1)]
    OcrFailure {
        file_ordinal: usize,
        file_name: String,
        message: String,
    },
}

/// Failures talking to the OCR service. The orchestrator folds all of them
/// into [`IntakeError::OcrFailure`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OcrServiceError {
    #[error("OCR service is not reachable at {0}")]
    Connection(String),

    #[error("OCR service returned error (status {status}): {body}")]
    Http { status: u16, body: String },

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("{0}")]
    Rejected(String),
}
