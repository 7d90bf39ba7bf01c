//! Review pipeline orchestrator.
//!
//! Single entry point that drives intake → code extraction → review session,
//! and hands a finished session to the submission service.
//!
//! Uses trait-based DI for both collaborators (OcrService, CodingService)
//! so the orchestrator remains fully testable with mock implementations.

use serde::{Deserialize, Serialize};

use crate::config::ServiceConfig;
use crate::correction::ReviewSession;
use crate::models::ReportType;
use crate::pipeline::coding::{
    AccuracySummary, CodingError, CodingService, ExtractionRequest, HttpCodingService,
};
use crate::pipeline::extraction::{
    HttpOcrService, IntakeConfig, IntakeError, IntakeOrchestrator, IntakeOutcome, IntakeProgress,
    OcrService, ReportSlot,
};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("Intake failed: {0}")]
    Intake(#[from] IntakeError),

    #[error("{0}")]
    Coding(#[from] CodingError),

    #[error("No text available for code extraction")]
    NoText,
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOptions {
    pub intake: IntakeConfig,
    /// Forward source documents to the extraction service for storage.
    pub upload_documents: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            intake: IntakeConfig::default(),
            upload_documents: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct CodingProcessor {
    intake: IntakeOrchestrator,
    coding: Box<dyn CodingService + Send + Sync>,
}

impl CodingProcessor {
    pub fn new(
        ocr: Box<dyn OcrService + Send + Sync>,
        coding: Box<dyn CodingService + Send + Sync>,
    ) -> Self {
        Self {
            intake: IntakeOrchestrator::new(ocr),
            coding,
        }
    }

    /// HTTP collaborators located by `config`.
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(
            Box::new(HttpOcrService::from_config(config)),
            Box::new(HttpCodingService::from_config(config)),
        )
    }

    pub fn ocr_available(&self, use_gpu: bool) -> bool {
        self.intake.ocr_available(use_gpu)
    }

    /// Full pipeline from the two report slots.
    ///
    /// 1. Intake both reports (OCR where files were picked)
    /// 2. Assemble the extraction request, optionally with source documents
    /// 3. Open a fresh review session on the returned codes
    ///
    /// Nothing outside the returned session is modified, so a caller that
    /// abandons a run simply drops the result.
    pub fn run(
        &self,
        hp: &ReportSlot,
        op: &ReportSlot,
        options: &RunOptions,
        progress: Option<&(dyn Fn(IntakeProgress) + Sync)>,
    ) -> Result<ReviewSession, ProcessingError> {
        let intake = self.intake.process_reports(
            &hp.inputs(),
            &op.inputs(),
            &options.intake,
            progress,
        )?;

        let request = build_request(hp, op, &intake, options.upload_documents);
        if !request.has_text() {
            return Err(ProcessingError::NoText);
        }

        let result = self.coding.extract(&request)?;
        let codes = &result.codes;

        let session = ReviewSession::new(codes.code_set())
            .with_document(codes.document_key.clone(), codes.chart_number.clone())
            .with_ai_summary(result.ai_summary.clone())
            .with_extras(codes.extras.clone())
            .with_report_texts(
                intake.hp.as_ref().map(|c| c.full_text.clone()),
                intake.op.as_ref().map(|c| c.full_text.clone()),
            );

        tracing::info!(
            session_id = %session.id(),
            document_key = session.document_key().unwrap_or("-"),
            "Extraction complete, review session ready"
        );
        Ok(session)
    }

    /// Send the session's corrections. On failure the session is left
    /// exactly as it was so the same submission can be retried.
    pub fn submit(&self, session: &mut ReviewSession) -> Result<AccuracySummary, ProcessingError> {
        let payload = session.build_submission_payload();
        let accuracy = self.coding.submit(&payload).map_err(|e| {
            tracing::warn!(session_id = %session.id(), error = %e, "Submission failed");
            e
        })?;

        session.finalize_submission();
        tracing::info!(
            session_id = %session.id(),
            percentage = accuracy.percentage,
            "Corrections submitted"
        );
        Ok(accuracy)
    }
}

fn build_request(
    hp: &ReportSlot,
    op: &ReportSlot,
    intake: &IntakeOutcome,
    upload_documents: bool,
) -> ExtractionRequest {
    let mut request = ExtractionRequest::new(
        intake.text(ReportType::Hp),
        intake.text(ReportType::Op),
        upload_documents,
    );
    for slot in [hp, op] {
        let report_type = slot.report_type();
        let files: &[_] = if slot.needs_ocr() { slot.files() } else { &[] };
        request = request.attach(report_type, files, intake.text(report_type));
    }
    request
}
