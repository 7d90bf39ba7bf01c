use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::audit::CorrectionRecord;
use crate::models::{AiSummary, CodeSet};

/// Body of the correction submission. Field names follow the submission
/// service: the baseline goes up as `original`, the working copy as
/// `corrected`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionPayload {
    pub document_key: Option<String>,
    pub chart_number: Option<String>,
    #[serde(rename = "original")]
    pub baseline: CodeSet,
    #[serde(rename = "corrected")]
    pub working: CodeSet,
    #[serde(rename = "edit_reasons")]
    pub corrections: CorrectionRecord,
    pub remarks: String,
}

/// Snapshot a reviewer can save locally.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionExport {
    pub session_id: Uuid,
    #[serde(rename = "icdCodes")]
    pub codes: CodeSet,
    pub ai_summary: AiSummary,
    pub remarks: String,
    pub edit_reasons: CorrectionRecord,
    pub hp: Option<String>,
    pub op: Option<String>,
    pub exported_at: DateTime<Utc>,
}

impl SessionExport {
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// `medical-codes-{chart}.json`, or `medical-codes-export.json` without a
/// chart number.
pub fn export_file_name(chart_number: Option<&str>) -> String {
    let chart = chart_number
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or("export");
    format!("medical-codes-{chart}.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_uses_service_field_names() {
        let payload = SubmissionPayload {
            document_key: Some("doc-1".into()),
            chart_number: None,
            baseline: CodeSet::default(),
            working: CodeSet {
                pdx: "K35.80".into(),
                ..Default::default()
            },
            corrections: CorrectionRecord::default(),
            remarks: "Reviewed".into(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["document_key"], "doc-1");
        assert!(json["chart_number"].is_null());
        assert_eq!(json["corrected"]["pdx"], "K35.80");
        assert_eq!(json["original"]["pdx"], "");
        assert!(json["edit_reasons"]["sdx"]["additions"].is_object());
        assert_eq!(json["remarks"], "Reviewed");
    }

    #[test]
    fn file_name_falls_back_to_export() {
        assert_eq!(export_file_name(Some("CH-1029")), "medical-codes-CH-1029.json");
        assert_eq!(export_file_name(Some(" ")), "medical-codes-export.json");
        assert_eq!(export_file_name(None), "medical-codes-export.json");
    }
}
