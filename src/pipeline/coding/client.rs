use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::types::{
    AccuracySummary, ExtractionRequest, ExtractionResponse, ExtractionResult, SubmissionResponse,
};
use super::CodingError;
use crate::config::{ExtractionEndpoint, ServiceConfig};
use crate::correction::SubmissionPayload;

/// Code extraction and correction submission (allows mocking for tests).
pub trait CodingService {
    fn extract(&self, request: &ExtractionRequest) -> Result<ExtractionResult, CodingError>;

    /// Any outcome other than a reported success is a
    /// [`CodingError::SubmissionFailure`].
    fn submit(&self, payload: &SubmissionPayload) -> Result<AccuracySummary, CodingError>;
}

impl<T: CodingService + ?Sized> CodingService for Arc<T> {
    fn extract(&self, request: &ExtractionRequest) -> Result<ExtractionResult, CodingError> {
        (**self).extract(request)
    }

    fn submit(&self, payload: &SubmissionPayload) -> Result<AccuracySummary, CodingError> {
        (**self).submit(payload)
    }
}

// ──────────────────────────────────────────────
// HttpCodingService
// ──────────────────────────────────────────────

/// JSON client for the coding backend.
pub struct HttpCodingService {
    base_url: String,
    endpoint: ExtractionEndpoint,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl HttpCodingService {
    pub fn new(base_url: &str, endpoint: ExtractionEndpoint, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Custom HTTP client unavailable, using defaults");
                reqwest::blocking::Client::new()
            });

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            endpoint,
            client,
            timeout_secs,
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(
            &config.coding_api_url,
            config.extraction_endpoint,
            config.timeout_secs,
        )
    }

    fn post_json<B: serde::Serialize>(&self, path: &str, body: &B) -> Result<(u16, String), CodingError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    CodingError::Connection(self.base_url.clone())
                } else if e.is_timeout() {
                    CodingError::Connection(format!(
                        "{} (timed out after {}s)",
                        self.base_url, self.timeout_secs
                    ))
                } else {
                    CodingError::Connection(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| CodingError::ResponseParsing(e.to_string()))?;
        Ok((status, body))
    }
}

/// Interpret an extraction response. The production and test endpoints
/// answer with the same shape.
pub fn interpret_extraction_response(status: u16, body: &str) -> Result<ExtractionResult, CodingError> {
    if !(200..300).contains(&status) {
        return Err(CodingError::Http {
            status,
            body: body.to_string(),
        });
    }

    let parsed: ExtractionResponse =
        serde_json::from_str(body).map_err(|e| CodingError::ResponseParsing(e.to_string()))?;

    if !parsed.success {
        return Err(CodingError::ExtractionRejected(
            parsed
                .error
                .unwrap_or_else(|| "ICD code extraction failed".to_string()),
        ));
    }

    let codes = parsed
        .extracted
        .ok_or_else(|| CodingError::ResponseParsing("missing extracted codes".to_string()))?;

    Ok(ExtractionResult {
        codes,
        ai_summary: parsed.ai_summary.unwrap_or_default(),
    })
}

/// Interpret a submission response. The body decides, whatever the status.
pub fn interpret_submission_response(status: u16, body: &str) -> Result<AccuracySummary, CodingError> {
    let parsed: SubmissionResponse = serde_json::from_str(body).map_err(|e| {
        CodingError::SubmissionFailure(format!("unreadable response (status {status}): {e}"))
    })?;

    if !parsed.success {
        return Err(CodingError::SubmissionFailure(
            parsed.error.unwrap_or_else(|| "Failed to submit".to_string()),
        ));
    }

    Ok(parsed.accuracy.unwrap_or_default())
}

impl CodingService for HttpCodingService {
    fn extract(&self, request: &ExtractionRequest) -> Result<ExtractionResult, CodingError> {
        tracing::info!(
            endpoint = self.endpoint.path(),
            hp_chars = request.hp_text.len(),
            op_chars = request.op_text.len(),
            upload_documents = request.upload_documents,
            "Requesting code extraction"
        );
        let (status, body) = self.post_json(self.endpoint.path(), request)?;
        interpret_extraction_response(status, &body)
    }

    fn submit(&self, payload: &SubmissionPayload) -> Result<AccuracySummary, CodingError> {
        tracing::info!(
            document_key = payload.document_key.as_deref().unwrap_or("-"),
            changes = payload.corrections.change_count(),
            "Submitting corrections"
        );
        let (status, body) = self
            .post_json("/submit-corrections", payload)
            .map_err(|e| CodingError::SubmissionFailure(e.to_string()))?;
        interpret_submission_response(status, &body)
    }
}

// ──────────────────────────────────────────────
// MockCodingService
// ──────────────────────────────────────────────

/// Mock coding backend for testing: canned answers, recorded requests.
pub struct MockCodingService {
    extraction: Result<ExtractionResult, CodingError>,
    submission: Result<AccuracySummary, CodingError>,
    extraction_requests: Mutex<Vec<ExtractionRequest>>,
    submissions: Mutex<Vec<SubmissionPayload>>,
}

impl MockCodingService {
    pub fn new(extraction: ExtractionResult) -> Self {
        Self {
            extraction: Ok(extraction),
            submission: Ok(AccuracySummary {
                percentage: 100.0,
                ..Default::default()
            }),
            extraction_requests: Mutex::new(Vec::new()),
            submissions: Mutex::new(Vec::new()),
        }
    }

    pub fn with_extraction_error(mut self, error: CodingError) -> Self {
        self.extraction = Err(error);
        self
    }

    pub fn with_accuracy(mut self, accuracy: AccuracySummary) -> Self {
        self.submission = Ok(accuracy);
        self
    }

    pub fn with_submission_failure(mut self, message: &str) -> Self {
        self.submission = Err(CodingError::SubmissionFailure(message.to_string()));
        self
    }

    pub fn extraction_requests(&self) -> Vec<ExtractionRequest> {
        self.extraction_requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn submissions(&self) -> Vec<SubmissionPayload> {
        self.submissions.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl CodingService for MockCodingService {
    fn extract(&self, request: &ExtractionRequest) -> Result<ExtractionResult, CodingError> {
        if let Ok(mut requests) = self.extraction_requests.lock() {
            requests.push(request.clone());
        }
        self.extraction.clone()
    }

    fn submit(&self, payload: &SubmissionPayload) -> Result<AccuracySummary, CodingError> {
        if let Ok(mut submissions) = self.submissions.lock() {
            submissions.push(payload.clone());
        }
        self.submission.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successful_extraction_yields_codes_and_summary() {
        let body = r#"{
            "success": true,
            "extracted": {"document_key": "k1", "pdx": "K35.80", "cpt": ["44970"]},
            "ai_summary": {"hp": "Acute appendicitis", "op": null}
        }"#;
        let result = interpret_extraction_response(200, body).unwrap();
        assert_eq!(result.codes.document_key.as_deref(), Some("k1"));
        assert_eq!(result.codes.code_set().cpt, vec!["44970".to_string()]);
        assert_eq!(result.ai_summary.hp, Some(serde_json::json!("Acute appendicitis")));
    }

    #[test]
    fn extraction_http_error_is_reported_with_status() {
        let err = interpret_extraction_response(503, "upstream down").unwrap_err();
        assert_eq!(
            err,
            CodingError::Http {
                status: 503,
                body: "upstream down".into(),
            }
        );
    }

    #[test]
    fn extraction_rejection_carries_service_message() {
        let err = interpret_extraction_response(200, r#"{"success": false, "error": "No codes found"}"#)
            .unwrap_err();
        assert_eq!(err, CodingError::ExtractionRejected("No codes found".into()));

        let err = interpret_extraction_response(200, r#"{"success": false}"#).unwrap_err();
        assert_eq!(err, CodingError::ExtractionRejected("ICD code extraction failed".into()));
    }

    #[test]
    fn extraction_without_codes_is_a_parse_error() {
        let err = interpret_extraction_response(200, r#"{"success": true}"#).unwrap_err();
        assert!(matches!(err, CodingError::ResponseParsing(_)));
    }

    #[test]
    fn submission_success_returns_accuracy() {
        let body = r#"{"success": true, "accuracy": {"percentage": 95.5, "details": {}}}"#;
        let accuracy = interpret_submission_response(200, body).unwrap();
        assert_eq!(accuracy.percentage, 95.5);
        assert_eq!(accuracy.matched_total(), 0);
    }

    #[test]
    fn submission_failures_are_all_submission_failures() {
        let err = interpret_submission_response(200, r#"{"success": false, "error": "Chart locked"}"#)
            .unwrap_err();
        assert_eq!(err, CodingError::SubmissionFailure("Chart locked".into()));

        let err = interpret_submission_response(500, r#"{"success": false}"#).unwrap_err();
        assert_eq!(err, CodingError::SubmissionFailure("Failed to submit".into()));

        let err = interpret_submission_response(502, "<html>Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, CodingError::SubmissionFailure(_)));
    }

    #[test]
    fn mock_records_requests() {
        let mock = MockCodingService::new(ExtractionResult::default());
        mock.extract(&ExtractionRequest::new("hp", "", false)).unwrap();
        assert_eq!(mock.extraction_requests().len(), 1);
        assert_eq!(mock.extraction_requests()[0].hp_text, "hp");
        assert!(mock.submissions().is_empty());
    }
}
