//! Per-report input selection.
//!
//! A slot holds either pasted text or picked files, never both at once as
//! far as intake is concerned: the active [`InputMode`] decides which one
//! [`ReportSlot::inputs`] hands to the orchestrator.

use serde::{Deserialize, Serialize};

use crate::models::{MimeClass, ReportInput, ReportType, SourceFile};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    #[default]
    Files,
    Text,
}

/// A file as handed over by the file picker, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickedFile {
    pub name: String,
    /// MIME type reported by the picker, if any.
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl PickedFile {
    pub fn new(name: &str, mime_type: Option<&str>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            mime_type: mime_type.map(str::to_string),
            bytes,
        }
    }

    /// PDF or image, from the reported MIME type or else the file name.
    pub fn mime_class(&self) -> Option<MimeClass> {
        match self.mime_type.as_deref() {
            Some(mime) if !mime.is_empty() => MimeClass::from_mime(mime),
            _ => MimeClass::from_file_name(&self.name),
        }
    }
}

/// The user's selection for one report type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSlot {
    report_type: ReportType,
    mode: InputMode,
    text: String,
    files: Vec<SourceFile>,
}

impl ReportSlot {
    pub fn new(report_type: ReportType) -> Self {
        Self {
            report_type,
            mode: InputMode::default(),
            text: String::new(),
            files: Vec::new(),
        }
    }

    pub fn report_type(&self) -> ReportType {
        self.report_type
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: InputMode) {
        self.mode = mode;
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    /// Add picked files, returning how many were accepted.
    ///
    /// Only PDFs and images are kept. A PDF always stands alone: picking one
    /// replaces the whole selection with the first PDF picked, and picking
    /// images while a PDF is selected drops the PDF.
    pub fn add_files(&mut self, picked: Vec<PickedFile>) -> usize {
        let mut valid: Vec<(PickedFile, MimeClass)> = picked
            .into_iter()
            .filter_map(|f| f.mime_class().map(|class| (f, class)))
            .collect();

        if valid.is_empty() {
            return 0;
        }

        let accepted = if let Some(pos) = valid.iter().position(|(_, c)| *c == MimeClass::Pdf) {
            self.files.clear();
            let (pdf, class) = valid.swap_remove(pos);
            self.files.push(SourceFile::new(0, &pdf.name, class, pdf.bytes));
            1
        } else {
            if self.holds_pdf() {
                self.files.clear();
            }
            let count = valid.len();
            for (file, class) in valid {
                let ordinal = self.files.len();
                self.files.push(SourceFile::new(ordinal, &file.name, class, file.bytes));
            }
            count
        };

        tracing::debug!(
            report_type = self.report_type.as_str(),
            accepted,
            selected = self.files.len(),
            "Files added to report slot"
        );
        accepted
    }

    /// Remove one selected file. Out-of-range indices are ignored.
    pub fn remove_file(&mut self, index: usize) -> Option<SourceFile> {
        if index >= self.files.len() {
            return None;
        }
        let removed = self.files.remove(index);
        self.renumber();
        Some(removed)
    }

    /// Drop both files and pasted text.
    pub fn clear(&mut self) {
        self.files.clear();
        self.text.clear();
    }

    pub fn holds_pdf(&self) -> bool {
        self.files.iter().any(|f| f.mime_class == MimeClass::Pdf)
    }

    /// Intake batch for the active mode. Ordinals equal positions.
    pub fn inputs(&self) -> Vec<ReportInput> {
        match self.mode {
            InputMode::Files => self.files.iter().cloned().map(ReportInput::File).collect(),
            InputMode::Text => {
                let text = self.text.trim();
                if text.is_empty() {
                    Vec::new()
                } else {
                    vec![ReportInput::text(text)]
                }
            }
        }
    }

    pub fn has_data(&self) -> bool {
        match self.mode {
            InputMode::Files => !self.files.is_empty(),
            InputMode::Text => !self.text.trim().is_empty(),
        }
    }

    pub fn needs_ocr(&self) -> bool {
        self.mode == InputMode::Files && !self.files.is_empty()
    }

    fn renumber(&mut self) {
        for (i, file) in self.files.iter_mut().enumerate() {
            file.ordinal = i;
        }
    }
}
