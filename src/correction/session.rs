use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::audit::{CorrectionRecord, SingleCorrection};
use super::payload::{export_file_name, SessionExport, SubmissionPayload};
use super::{CorrectionError, DuplicateLocation};
use crate::config::DUPLICATE_HIGHLIGHT_MS;
use crate::models::{
    find_reason, normalize_code, AiSummary, ArrayField, CodeField, CodeSet, FieldMode,
    ReasonCategory, ReportType, SingleField,
};
use crate::reconcile::reconcile;

/// A duplicate the reviewer just tried to stage, kept briefly for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateHighlight {
    pub field: ArrayField,
    pub code: String,
    pub location: DuplicateLocation,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct PendingAdditions {
    sdx: Vec<String>,
    cpt: Vec<String>,
}

impl PendingAdditions {
    fn get(&self, field: ArrayField) -> &Vec<String> {
        match field {
            ArrayField::Sdx => &self.sdx,
            ArrayField::Cpt => &self.cpt,
        }
    }

    fn get_mut(&mut self, field: ArrayField) -> &mut Vec<String> {
        match field {
            ArrayField::Sdx => &mut self.sdx,
            ArrayField::Cpt => &mut self.cpt,
        }
    }
}

/// One reviewer's pass over one extraction result.
///
/// The baseline is fixed at construction: the codes as extracted go back to
/// the service untouched, a normalized copy drives editing and duplicate
/// checks. Removals hit the working copy
/// immediately; additions are staged per field and only folded into the
/// working copy when that field leaves edit mode.
#[derive(Debug, Clone)]
pub struct ReviewSession {
    id: Uuid,
    created_at: DateTime<Utc>,
    document_key: Option<String>,
    chart_number: Option<String>,
    extracted: CodeSet,
    baseline: CodeSet,
    working: CodeSet,
    pending: PendingAdditions,
    corrections: CorrectionRecord,
    modes: HashMap<CodeField, FieldMode>,
    remarks: String,
    ai_summary: AiSummary,
    extras: serde_json::Map<String, serde_json::Value>,
    hp_text: Option<String>,
    op_text: Option<String>,
    highlight: Option<DuplicateHighlight>,
    highlight_duration: chrono::Duration,
}

impl ReviewSession {
    pub fn new(extracted: CodeSet) -> Self {
        let baseline = extracted.normalized();
        let session = Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            document_key: None,
            chart_number: None,
            extracted,
            working: baseline.clone(),
            baseline,
            pending: PendingAdditions::default(),
            corrections: CorrectionRecord::default(),
            modes: CodeField::ALL
                .iter()
                .map(|f| (*f, FieldMode::Viewing))
                .collect(),
            remarks: String::new(),
            ai_summary: AiSummary::default(),
            extras: serde_json::Map::new(),
            hp_text: None,
            op_text: None,
            highlight: None,
            highlight_duration: chrono::Duration::milliseconds(DUPLICATE_HIGHLIGHT_MS as i64),
        };
        tracing::info!(
            session_id = %session.id,
            sdx = session.baseline.sdx.len(),
            cpt = session.baseline.cpt.len(),
            "Review session opened"
        );
        session
    }

    pub fn with_document(mut self, document_key: Option<String>, chart_number: Option<String>) -> Self {
        self.document_key = document_key;
        self.chart_number = chart_number;
        self
    }

    pub fn with_ai_summary(mut self, ai_summary: AiSummary) -> Self {
        self.ai_summary = ai_summary;
        self
    }

    /// Service fields the engine does not interpret (storage URLs and keys).
    pub fn with_extras(mut self, extras: serde_json::Map<String, serde_json::Value>) -> Self {
        self.extras = extras;
        self
    }

    pub fn with_report_texts(mut self, hp: Option<String>, op: Option<String>) -> Self {
        self.hp_text = hp;
        self.op_text = op;
        self
    }

    pub fn with_highlight_duration(mut self, duration: std::time::Duration) -> Self {
        self.highlight_duration = chrono::Duration::from_std(duration)
            .unwrap_or_else(|_| chrono::Duration::milliseconds(DUPLICATE_HIGHLIGHT_MS as i64));
        self
    }

    // ──────────────────────────────────────────────
    // Accessors
    // ──────────────────────────────────────────────

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn document_key(&self) -> Option<&str> {
        self.document_key.as_deref()
    }

    pub fn chart_number(&self) -> Option<&str> {
        self.chart_number.as_deref()
    }

    /// Normalized extraction result.
    pub fn baseline(&self) -> &CodeSet {
        &self.baseline
    }

    /// Extraction result exactly as the service returned it.
    pub fn extracted(&self) -> &CodeSet {
        &self.extracted
    }

    pub fn working(&self) -> &CodeSet {
        &self.working
    }

    pub fn corrections(&self) -> &CorrectionRecord {
        &self.corrections
    }

    pub fn ai_summary(&self) -> &AiSummary {
        &self.ai_summary
    }

    pub fn extras(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.extras
    }

    pub fn report_text(&self, report_type: ReportType) -> Option<&str> {
        match report_type {
            ReportType::Hp => self.hp_text.as_deref(),
            ReportType::Op => self.op_text.as_deref(),
        }
    }

    pub fn mode(&self, field: CodeField) -> FieldMode {
        self.modes.get(&field).copied().unwrap_or(FieldMode::Viewing)
    }

    /// Staged additions of a field, in staging order.
    pub fn pending(&self, field: ArrayField) -> &[String] {
        self.pending.get(field)
    }

    pub fn pending_reason(&self, field: ArrayField, code: &str) -> Option<&str> {
        let code = normalize_code(code);
        if !self.pending.get(field).contains(&code) {
            return None;
        }
        self.corrections
            .array(field)
            .additions
            .get(&code)
            .map(String::as_str)
    }

    pub fn remarks(&self) -> &str {
        &self.remarks
    }

    pub fn set_remarks(&mut self, remarks: &str) {
        self.remarks = remarks.to_string();
    }

    pub fn change_count(&self) -> usize {
        self.corrections.change_count()
    }

    pub fn has_changes(&self) -> bool {
        !self.corrections.is_empty()
    }

    /// The last rejected duplicate, until its highlight expires.
    pub fn duplicate_highlight(&self, now: DateTime<Utc>) -> Option<&DuplicateHighlight> {
        self.highlight.as_ref().filter(|h| h.expires_at > now)
    }

    // ──────────────────────────────────────────────
    // Edits
    // ──────────────────────────────────────────────

    /// Change a single-value field. Returns `false` when the normalized value
    /// equals the current one, in which case no reason is needed.
    pub fn update_single(
        &mut self,
        field: SingleField,
        value: &str,
        reason: Option<&str>,
    ) -> Result<bool, CorrectionError> {
        let new_value = normalize_code(value);
        if new_value == normalize_code(self.working.single(field)) {
            return Ok(false);
        }

        let reason = validate_reason(field.into(), ReasonCategory::Change, reason)?;
        let previous = std::mem::replace(self.working.single_mut(field), new_value.clone());

        // One entry per field: the latest change replaces any earlier one.
        *self.corrections.single_mut(field) = Some(SingleCorrection {
            old_value: previous.clone(),
            new_value: new_value.clone(),
            reason: reason.to_string(),
        });

        tracing::info!(
            session_id = %self.id,
            field = field.as_str(),
            old = %previous,
            new = %new_value,
            reason,
            "Code updated"
        );
        Ok(true)
    }

    /// Stage a code for addition. Returns the normalized code.
    pub fn stage_addition(
        &mut self,
        field: ArrayField,
        code: &str,
        reason: Option<&str>,
    ) -> Result<String, CorrectionError> {
        self.require_editing(field.into())?;

        let code = normalize_code(code);
        if code.is_empty() {
            return Err(CorrectionError::EmptyCode);
        }

        let committed = !reconcile(std::slice::from_ref(&code), self.working.array(field))
            .matches
            .is_empty();
        let location = if committed {
            Some(DuplicateLocation::Committed)
        } else if self.pending.get(field).contains(&code) {
            Some(DuplicateLocation::Pending)
        } else {
            None
        };

        if let Some(location) = location {
            tracing::debug!(
                session_id = %self.id,
                field = field.as_str(),
                code = %code,
                location = location.as_str(),
                "Duplicate addition rejected"
            );
            self.highlight = Some(DuplicateHighlight {
                field,
                code: code.clone(),
                location,
                expires_at: Utc::now() + self.highlight_duration,
            });
            return Err(CorrectionError::Duplicate { code, location });
        }

        let reason = validate_reason(field.into(), ReasonCategory::Addition, reason)?;
        self.pending.get_mut(field).push(code.clone());
        self.corrections
            .array_mut(field)
            .additions
            .insert(code.clone(), reason.to_string());

        tracing::debug!(
            session_id = %self.id,
            field = field.as_str(),
            code = %code,
            reason,
            "Addition staged"
        );
        Ok(code)
    }

    /// Drop a staged addition and its reason. Returns whether it was staged.
    pub fn unstage_addition(&mut self, field: ArrayField, code: &str) -> Result<bool, CorrectionError> {
        self.require_editing(field.into())?;

        let code = normalize_code(code);
        let pending = self.pending.get_mut(field);
        let Some(pos) = pending.iter().position(|c| *c == code) else {
            return Ok(false);
        };
        pending.remove(pos);
        self.corrections.array_mut(field).additions.remove(&code);
        Ok(true)
    }

    /// Remove a code from the working copy at once. Returns whether the code
    /// was present.
    pub fn remove_committed(
        &mut self,
        field: ArrayField,
        code: &str,
        reason: Option<&str>,
    ) -> Result<bool, CorrectionError> {
        self.require_editing(field.into())?;
        let reason = validate_reason(field.into(), ReasonCategory::Removal, reason)?;

        let code = normalize_code(code);
        let codes = self.working.array_mut(field);
        let Some(pos) = codes.iter().position(|c| *c == code) else {
            return Ok(false);
        };
        codes.remove(pos);
        self.corrections
            .array_mut(field)
            .removals
            .insert(code.clone(), reason.to_string());

        tracing::info!(
            session_id = %self.id,
            field = field.as_str(),
            code = %code,
            reason,
            "Code removed"
        );
        Ok(true)
    }

    /// Flip a field between viewing and editing. Leaving edit mode on an
    /// array field commits its staged additions.
    pub fn toggle_edit_mode(&mut self, field: CodeField) -> FieldMode {
        let next = match self.mode(field) {
            FieldMode::Viewing => FieldMode::Editing,
            FieldMode::Editing => {
                if let Some(array) = field.as_array() {
                    self.commit_pending(array);
                }
                FieldMode::Viewing
            }
        };
        self.modes.insert(field, next);
        next
    }

    fn commit_pending(&mut self, field: ArrayField) {
        let staged = std::mem::take(self.pending.get_mut(field));
        if staged.is_empty() {
            return;
        }
        tracing::info!(
            session_id = %self.id,
            field = field.as_str(),
            count = staged.len(),
            "Staged additions committed"
        );
        self.working.array_mut(field).extend(staged);
    }

    fn require_editing(&self, field: CodeField) -> Result<(), CorrectionError> {
        match self.mode(field) {
            FieldMode::Editing => Ok(()),
            mode => Err(CorrectionError::InvalidState { field, mode }),
        }
    }

    // ──────────────────────────────────────────────
    // Submission and export
    // ──────────────────────────────────────────────

    /// Everything the submission service needs. Does not touch the session.
    pub fn build_submission_payload(&self) -> SubmissionPayload {
        SubmissionPayload {
            document_key: self.document_key.clone(),
            chart_number: self.chart_number.clone(),
            baseline: self.extracted.clone(),
            working: self.working.clone(),
            corrections: self.corrections.clone(),
            remarks: self.remarks.clone(),
        }
    }

    /// Close out a successful submission: every field back to viewing, staged
    /// additions and the audit trail cleared. Baseline, working copy and
    /// remarks stay as they are.
    pub fn finalize_submission(&mut self) {
        for mode in self.modes.values_mut() {
            *mode = FieldMode::Viewing;
        }
        self.pending = PendingAdditions::default();
        self.corrections = CorrectionRecord::default();
        self.highlight = None;
        tracing::info!(session_id = %self.id, "Review session finalized");
    }

    pub fn export(&self) -> SessionExport {
        SessionExport {
            session_id: self.id,
            codes: self.working.clone(),
            ai_summary: self.ai_summary.clone(),
            remarks: self.remarks.clone(),
            edit_reasons: self.corrections.clone(),
            hp: self.hp_text.clone(),
            op: self.op_text.clone(),
            exported_at: Utc::now(),
        }
    }

    pub fn export_file_name(&self) -> String {
        export_file_name(self.chart_number.as_deref())
    }
}

/// A reason id must be present and belong to the category of the edit.
fn validate_reason(
    field: CodeField,
    category: ReasonCategory,
    reason: Option<&str>,
) -> Result<&'static str, CorrectionError> {
    let id = reason
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or(CorrectionError::ReasonRequired { field })?;
    find_reason(category, id)
        .map(|r| r.id)
        .ok_or_else(|| CorrectionError::UnknownReason {
            category,
            id: id.to_string(),
        })
}
