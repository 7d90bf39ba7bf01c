use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::blocking::multipart::{Form, Part};

use super::types::{IntakeConfig, OcrFileResult, OcrPage, OcrResponse};
use super::OcrServiceError;
use crate::models::{MimeClass, ReportType, SourceFile};

/// Remote OCR abstraction (allows mocking for tests).
pub trait OcrService {
    /// OCR a single file. Any non-success outcome is an error.
    fn ocr_file(
        &self,
        file: &SourceFile,
        report_type: ReportType,
        config: &IntakeConfig,
    ) -> Result<OcrFileResult, OcrServiceError>;

    /// Whether the service routed by `use_gpu` answers its health probe.
    fn is_available(&self, use_gpu: bool) -> bool;
}

impl<T: OcrService + ?Sized> OcrService for Arc<T> {
    fn ocr_file(
        &self,
        file: &SourceFile,
        report_type: ReportType,
        config: &IntakeConfig,
    ) -> Result<OcrFileResult, OcrServiceError> {
        (**self).ocr_file(file, report_type, config)
    }

    fn is_available(&self, use_gpu: bool) -> bool {
        (**self).is_available(use_gpu)
    }
}

// ──────────────────────────────────────────────
// HttpOcrService
// ──────────────────────────────────────────────

/// OCR service client over HTTP multipart.
///
/// Two deployments exist, a GPU host and a CPU host; each request is routed
/// by the `use_gpu` flag of its [`IntakeConfig`].
pub struct HttpOcrService {
    gpu_url: String,
    cpu_url: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl HttpOcrService {
    pub fn new(gpu_url: &str, cpu_url: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Custom HTTP client unavailable, using defaults");
                reqwest::blocking::Client::new()
            });

        Self {
            gpu_url: gpu_url.trim_end_matches('/').to_string(),
            cpu_url: cpu_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
        }
    }

    pub fn from_config(config: &crate::config::ServiceConfig) -> Self {
        Self::new(&config.gpu_ocr_url, &config.cpu_ocr_url, config.timeout_secs)
    }

    fn base_url(&self, use_gpu: bool) -> &str {
        if use_gpu {
            &self.gpu_url
        } else {
            &self.cpu_url
        }
    }

    fn map_send_error(&self, e: reqwest::Error, base_url: &str) -> OcrServiceError {
        if e.is_connect() {
            OcrServiceError::Connection(base_url.to_string())
        } else if e.is_timeout() {
            OcrServiceError::Connection(format!(
                "{base_url} (timed out after {}s)",
                self.timeout_secs
            ))
        } else {
            OcrServiceError::Connection(e.to_string())
        }
    }
}

/// MIME type sent with the multipart file part.
fn upload_mime(file: &SourceFile) -> String {
    match file.mime_class {
        MimeClass::Pdf => "application/pdf".to_string(),
        MimeClass::Image => mime_guess::from_path(&file.name)
            .first()
            .filter(|m| m.type_() == mime_guess::mime::IMAGE)
            .map(|m| m.essence_str().to_string())
            .unwrap_or_else(|| "image/png".to_string()),
    }
}

/// Interpret an OCR response body. `success: false`, an unparseable body and
/// a non-2xx status are all failures.
pub fn interpret_ocr_response(
    status: u16,
    body: &str,
    file: &SourceFile,
) -> Result<OcrFileResult, OcrServiceError> {
    let parsed: Result<OcrResponse, _> = serde_json::from_str(body);
    let is_http_success = (200..300).contains(&status);

    match parsed {
        Ok(resp) if resp.success && is_http_success => Ok(OcrFileResult {
            pages: resp.documents,
            total_processing_time_ms: resp.total_processing_time.unwrap_or(0.0),
        }),
        Ok(resp) if !resp.success => Err(OcrServiceError::Rejected(resp.error.unwrap_or_else(
            || format!("OCR failed for file {}: {}", file.ordinal + 1, file.name),
        ))),
        Ok(_) => Err(OcrServiceError::Http {
            status,
            body: body.to_string(),
        }),
        Err(_) if !is_http_success => Err(OcrServiceError::Http {
            status,
            body: body.to_string(),
        }),
        Err(e) => Err(OcrServiceError::ResponseParsing(e.to_string())),
    }
}

impl OcrService for HttpOcrService {
    fn ocr_file(
        &self,
        file: &SourceFile,
        report_type: ReportType,
        config: &IntakeConfig,
    ) -> Result<OcrFileResult, OcrServiceError> {
        let base_url = self.base_url(config.use_gpu);
        let url = format!("{base_url}/ocr/file");

        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&upload_mime(file))
            .map_err(|e| OcrServiceError::Connection(e.to_string()))?;

        let form = Form::new()
            .part("file", part)
            .text("engine", config.engine.clone())
            .text("report_type", report_type.as_str())
            .text("use_gpu", config.use_gpu.to_string());

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .map_err(|e| self.map_send_error(e, base_url))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| OcrServiceError::ResponseParsing(e.to_string()))?;

        interpret_ocr_response(status, &body, file)
    }

    fn is_available(&self, use_gpu: bool) -> bool {
        let url = format!("{}/health", self.base_url(use_gpu));
        match self.client.get(&url).send() {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "OCR health probe failed");
                false
            }
        }
    }
}

// ──────────────────────────────────────────────
// MockOcrService
// ──────────────────────────────────────────────

/// Mock OCR service for testing: scripted per file name, records call order,
/// the config each call carried and the peak number of concurrent calls.
pub struct MockOcrService {
    scripted: HashMap<String, Result<OcrFileResult, OcrServiceError>>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<(ReportType, String)>>,
    configs: Mutex<Vec<IntakeConfig>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    available: bool,
}

impl MockOcrService {
    /// Unscripted files return one page reading `"text of {name}"`.
    pub fn new() -> Self {
        Self {
            scripted: HashMap::new(),
            delays: HashMap::new(),
            calls: Mutex::new(Vec::new()),
            configs: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            available: true,
        }
    }

    pub fn with_pages(mut self, file_name: &str, pages: &[&str], total_ms: f64) -> Self {
        let pages = pages
            .iter()
            .map(|text| OcrPage {
                full_text: text.to_string(),
                engine_used: Some("mock-ocr".into()),
                processing_time: None,
            })
            .collect();
        self.scripted.insert(
            file_name.to_string(),
            Ok(OcrFileResult {
                pages,
                total_processing_time_ms: total_ms,
            }),
        );
        self
    }

    pub fn with_result(mut self, file_name: &str, result: OcrFileResult) -> Self {
        self.scripted.insert(file_name.to_string(), Ok(result));
        self
    }

    pub fn with_failure(mut self, file_name: &str, message: &str) -> Self {
        self.scripted.insert(
            file_name.to_string(),
            Err(OcrServiceError::Rejected(message.to_string())),
        );
        self
    }

    pub fn with_delay(mut self, file_name: &str, delay: Duration) -> Self {
        self.delays.insert(file_name.to_string(), delay);
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// File names in the order they were submitted.
    pub fn calls(&self) -> Vec<(ReportType, String)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Intake config of each call, in the same order as [`Self::calls`].
    pub fn configs(&self) -> Vec<IntakeConfig> {
        self.configs.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Default for MockOcrService {
    fn default() -> Self {
        Self::new()
    }
}

impl OcrService for MockOcrService {
    fn ocr_file(
        &self,
        file: &SourceFile,
        report_type: ReportType,
        config: &IntakeConfig,
    ) -> Result<OcrFileResult, OcrServiceError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((report_type, file.name.clone()));
            if let Ok(mut configs) = self.configs.lock() {
                configs.push(config.clone());
            }
        }

        if let Some(delay) = self.delays.get(&file.name) {
            std::thread::sleep(*delay);
        }

        let result = match self.scripted.get(&file.name) {
            Some(result) => result.clone(),
            None => Ok(OcrFileResult {
                pages: vec![OcrPage {
                    full_text: format!("text of {}", file.name),
                    engine_used: Some("mock-ocr".into()),
                    processing_time: None,
                }],
                total_processing_time_ms: 10.0,
            }),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn is_available(&self, _use_gpu: bool) -> bool {
        self.available
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf(name: &str) -> SourceFile {
        SourceFile::new(1, name, MimeClass::Pdf, vec![0x25, 0x50, 0x44, 0x46])
    }

    #[test]
    fn success_body_yields_pages() {
        let body = r#"{"success": true, "documents": [{"full_text": "a"}, {"full_text": "b"}], "total_processing_time": 42.0}"#;
        let result = interpret_ocr_response(200, body, &pdf("x.pdf")).unwrap();
        assert_eq!(result.pages.len(), 2);
        assert_eq!(result.total_processing_time_ms, 42.0);
    }

    #[test]
    fn unsuccessful_body_is_rejected_with_service_message() {
        let body = r#"{"success": false, "error": "Unreadable scan"}"#;
        let err = interpret_ocr_response(200, body, &pdf("x.pdf")).unwrap_err();
        assert_eq!(err, OcrServiceError::Rejected("Unreadable scan".into()));
    }

    #[test]
    fn unsuccessful_body_without_message_gets_default() {
        let err = interpret_ocr_response(500, r#"{"success": false}"#, &pdf("op.pdf")).unwrap_err();
        assert_eq!(err, OcrServiceError::Rejected("OCR failed for file 2: op.pdf".into()));
    }

    #[test]
    fn non_json_error_status_is_http_error() {
        let err = interpret_ocr_response(502, "Bad Gateway", &pdf("x.pdf")).unwrap_err();
        assert!(matches!(err, OcrServiceError::Http { status: 502, .. }));
    }

    #[test]
    fn non_json_ok_status_is_parse_error() {
        let err = interpret_ocr_response(200, "<html>", &pdf("x.pdf")).unwrap_err();
        assert!(matches!(err, OcrServiceError::ResponseParsing(_)));
    }

    #[test]
    fn upload_mime_follows_class_and_name() {
        assert_eq!(upload_mime(&pdf("a.pdf")), "application/pdf");
        let jpg = SourceFile::new(0, "page.jpg", MimeClass::Image, vec![]);
        assert_eq!(upload_mime(&jpg), "image/jpeg");
        let unnamed = SourceFile::new(0, "capture", MimeClass::Image, vec![]);
        assert_eq!(upload_mime(&unnamed), "image/png");
    }

    #[test]
    fn http_service_routes_by_gpu_flag() {
        let service = HttpOcrService::new("http://gpu:7000/", "http://cpu:8001", 30);
        assert_eq!(service.base_url(true), "http://gpu:7000");
        assert_eq!(service.base_url(false), "http://cpu:8001");
    }

    #[test]
    fn mock_records_calls_and_scripts() {
        let mock = MockOcrService::new()
            .with_pages("a.png", &["first"], 5.0)
            .with_failure("b.png", "boom");
        let config = IntakeConfig::default();
        let a = SourceFile::new(0, "a.png", MimeClass::Image, vec![]);
        let b = SourceFile::new(1, "b.png", MimeClass::Image, vec![]);

        assert_eq!(mock.ocr_file(&a, ReportType::Hp, &config).unwrap().pages[0].full_text, "first");
        assert!(mock.ocr_file(&b, ReportType::Hp, &config).is_err());
        assert_eq!(
            mock.calls(),
            vec![(ReportType::Hp, "a.png".to_string()), (ReportType::Hp, "b.png".to_string())]
        );
        assert_eq!(mock.max_in_flight(), 1);
    }

    #[test]
    fn mock_availability() {
        assert!(MockOcrService::new().is_available(true));
        assert!(!MockOcrService::new().unavailable().is_available(false));
    }
}
