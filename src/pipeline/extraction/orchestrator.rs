use serde::Serialize;

use super::ocr::OcrService;
use super::types::{CombinedText, ExtractionUnit, IntakeConfig, IntakeProgress};
use super::IntakeError;
use crate::models::{word_count, ReportInput, ReportType, SourceFile};

/// Intake output for both report types. `None` means the slot had no input.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IntakeOutcome {
    pub hp: Option<CombinedText>,
    pub op: Option<CombinedText>,
}

impl IntakeOutcome {
    pub fn get(&self, report_type: ReportType) -> Option<&CombinedText> {
        match report_type {
            ReportType::Hp => self.hp.as_ref(),
            ReportType::Op => self.op.as_ref(),
        }
    }

    /// Combined text of a report, empty when the report was not supplied.
    pub fn text(&self, report_type: ReportType) -> &str {
        self.get(report_type)
            .map(|c| c.full_text.as_str())
            .unwrap_or("")
    }
}

/// Drives a report's intake batch against the OCR service.
///
/// Files of one batch are sent strictly one after another, in ordinal
/// order; the progress counter and unit order depend on it.
pub struct IntakeOrchestrator {
    ocr: Box<dyn OcrService + Send + Sync>,
}

impl IntakeOrchestrator {
    pub fn new(ocr: Box<dyn OcrService + Send + Sync>) -> Self {
        Self { ocr }
    }

    pub fn ocr_available(&self, use_gpu: bool) -> bool {
        self.ocr.is_available(use_gpu)
    }

    /// Turn one report's inputs into a single combined text.
    pub fn process(
        &self,
        report_type: ReportType,
        inputs: &[ReportInput],
        config: &IntakeConfig,
        progress: Option<&dyn Fn(IntakeProgress)>,
    ) -> Result<CombinedText, IntakeError> {
        if inputs.is_empty() {
            return Err(IntakeError::NoData);
        }

        let mut texts = Vec::new();
        let mut files = Vec::new();
        for input in inputs {
            match input {
                ReportInput::Text { content } => texts.push(content.as_str()),
                ReportInput::File(file) => files.push(file),
            }
        }

        if !texts.is_empty() && !files.is_empty() {
            return Err(IntakeError::MixedInputs);
        }

        if files.is_empty() {
            let text = texts
                .iter()
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join("\n\n");
            if text.is_empty() {
                return Err(IntakeError::NoData);
            }
            tracing::info!(
                report_type = report_type.as_str(),
                words = word_count(&text),
                "Using pasted text, OCR skipped"
            );
            return Ok(CombinedText::direct(&text));
        }

        files.sort_by_key(|f| f.ordinal);
        let report = |p: IntakeProgress| {
            if let Some(progress) = progress {
                progress(p);
            }
        };

        let result = self.run_ocr_batch(report_type, &files, config, &report);
        report(IntakeProgress::idle());
        result
    }

    fn run_ocr_batch(
        &self,
        report_type: ReportType,
        files: &[&SourceFile],
        config: &IntakeConfig,
        report: &dyn Fn(IntakeProgress),
    ) -> Result<CombinedText, IntakeError> {
        let total = files.len();
        let mut units = Vec::new();
        let mut total_processing_time_ms = 0.0;
        let mut engine_id = config.engine.clone();

        tracing::info!(
            report_type = report_type.as_str(),
            files = total,
            engine = %config.engine,
            use_gpu = config.use_gpu,
            "Starting OCR batch"
        );

        for (i, file) in files.iter().enumerate() {
            report(IntakeProgress {
                current: i + 1,
                total,
                report_type: Some(report_type),
            });

            let result = self
                .ocr
                .ocr_file(file, report_type, config)
                .map_err(|e| {
                    tracing::warn!(
                        report_type = report_type.as_str(),
                        file_ordinal = file.ordinal,
                        error = %e,
                        "OCR failed, aborting batch"
                    );
                    IntakeError::OcrFailure {
                        file_ordinal: file.ordinal,
                        file_name: file.name.clone(),
                        message: e.to_string(),
                    }
                })?;

            tracing::debug!(
                report_type = report_type.as_str(),
                file_ordinal = file.ordinal,
                pages = result.pages.len(),
                "OCR file complete"
            );

            engine_id = result
                .pages
                .first()
                .and_then(|p| p.engine_used.clone())
                .unwrap_or_else(|| config.engine.clone());
            total_processing_time_ms += result.total_processing_time_ms;

            for (page_index, page) in result.pages.into_iter().enumerate() {
                units.push(ExtractionUnit {
                    source_ordinal: file.ordinal,
                    source_name: file.name.clone(),
                    label: unit_label(total, file.ordinal, page_index),
                    text: page.full_text,
                    processing_time_ms: page.processing_time.unwrap_or(0.0),
                    engine_id: page.engine_used.unwrap_or_else(|| config.engine.clone()),
                });
            }
        }

        let full_text = combine_units(&units, total);

        tracing::info!(
            report_type = report_type.as_str(),
            units = units.len(),
            files = total,
            processing_ms = total_processing_time_ms,
            "OCR batch complete"
        );

        Ok(CombinedText {
            word_count: word_count(&full_text),
            full_text,
            unit_count: units.len(),
            file_count: total,
            total_processing_time_ms,
            engine_id,
        })
    }

    /// Process both report types. The two batches share no state and run on
    /// separate threads; each keeps its own sequential order. Empty slots are
    /// skipped.
    pub fn process_reports(
        &self,
        hp: &[ReportInput],
        op: &[ReportInput],
        config: &IntakeConfig,
        progress: Option<&(dyn Fn(IntakeProgress) + Sync)>,
    ) -> Result<IntakeOutcome, IntakeError> {
        if hp.is_empty() && op.is_empty() {
            return Err(IntakeError::NoData);
        }

        let run = |report_type: ReportType, inputs: &[ReportInput]| {
            self.process(
                report_type,
                inputs,
                config,
                progress.map(|p| p as &dyn Fn(IntakeProgress)),
            )
        };

        let (hp_result, op_result) = std::thread::scope(|s| {
            let hp_handle = (!hp.is_empty())
                .then(|| s.spawn(|| run(ReportType::Hp, hp)));
            let op_handle = (!op.is_empty())
                .then(|| s.spawn(|| run(ReportType::Op, op)));

            let hp_result = hp_handle.map(|h| {
                h.join()
                    .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
            });
            let op_result = op_handle.map(|h| {
                h.join()
                    .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
            });
            (hp_result, op_result)
        });

        Ok(IntakeOutcome {
            hp: hp_result.transpose()?,
            op: op_result.transpose()?,
        })
    }
}

/// Provenance label for a unit: files are numbered when the batch holds more
/// than one file, otherwise the pages of the single file are.
pub fn unit_label(file_count: usize, file_ordinal: usize, page_index: usize) -> String {
    if file_count > 1 {
        format!("File {}", file_ordinal + 1)
    } else {
        format!("Page {}", page_index + 1)
    }
}

/// Join units into one text block, each behind a delimiter banner.
///
/// A single unit from a single file is returned verbatim so OCR output is
/// indistinguishable from pasted text.
pub fn combine_units(units: &[ExtractionUnit], file_count: usize) -> String {
    if units.is_empty() {
        return String::new();
    }
    if units.len() == 1 && file_count <= 1 {
        return units[0].text.clone();
    }

    units
        .iter()
        .map(|u| {
            let source = if u.source_name.is_empty() {
                String::new()
            } else {
                format!(" ({})", u.source_name)
            };
            format!("━━━ {}{} ━━━\n{}", u.label, source, u.text)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
