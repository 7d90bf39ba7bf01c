use serde::{Deserialize, Serialize};

/// Application-level constants
pub const APP_NAME: &str = "MedExtract";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// OCR engine requested when the caller does not pick one.
pub const DEFAULT_OCR_ENGINE: &str = "tesseract";

/// Engine id reported for pasted text that never went through OCR.
pub const DIRECT_TEXT_ENGINE: &str = "direct-text";

/// How long a rejected duplicate code stays highlighted (advisory display only).
pub const DUPLICATE_HIGHLIGHT_MS: u64 = 2_000;

const DEFAULT_GPU_OCR_URL: &str = "http://localhost:7000";
const DEFAULT_CPU_OCR_URL: &str = "http://localhost:8001";
const DEFAULT_CODING_API_URL: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "medextract_lib=debug,info"
    } else {
        "medextract_lib=info,warn"
    }
}

/// Which code-extraction endpoint to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionEndpoint {
    Production,
    Test,
}

impl ExtractionEndpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Self::Production => "/extract-codes",
            Self::Test => "/extract-codes-test",
        }
    }
}

/// Locations of the three collaborator services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub gpu_ocr_url: String,
    pub cpu_ocr_url: String,
    pub coding_api_url: String,
    pub timeout_secs: u64,
    pub extraction_endpoint: ExtractionEndpoint,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            gpu_ocr_url: DEFAULT_GPU_OCR_URL.into(),
            cpu_ocr_url: DEFAULT_CPU_OCR_URL.into(),
            coding_api_url: DEFAULT_CODING_API_URL.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            extraction_endpoint: ExtractionEndpoint::Production,
        }
    }
}

impl ServiceConfig {
    /// Read `MEDEXTRACT_*` environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let timeout_secs = match lookup("MEDEXTRACT_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "Invalid MEDEXTRACT_TIMEOUT_SECS, using default");
                defaults.timeout_secs
            }),
            None => defaults.timeout_secs,
        };

        let extraction_endpoint = match lookup("MEDEXTRACT_USE_TEST_ENDPOINT").as_deref() {
            Some("1") | Some("true") | Some("yes") => ExtractionEndpoint::Test,
            _ => ExtractionEndpoint::Production,
        };

        Self {
            gpu_ocr_url: lookup("MEDEXTRACT_GPU_OCR_URL").unwrap_or(defaults.gpu_ocr_url),
            cpu_ocr_url: lookup("MEDEXTRACT_CPU_OCR_URL").unwrap_or(defaults.cpu_ocr_url),
            coding_api_url: lookup("MEDEXTRACT_CODING_API_URL")
                .unwrap_or(defaults.coding_api_url),
            timeout_secs,
            extraction_endpoint,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn app_name_is_medextract() {
        assert_eq!(APP_NAME, "MedExtract");
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = ServiceConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config.gpu_ocr_url, DEFAULT_GPU_OCR_URL);
        assert_eq!(config.cpu_ocr_url, DEFAULT_CPU_OCR_URL);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.extraction_endpoint, ExtractionEndpoint::Production);
    }

    #[test]
    fn environment_overrides_urls_and_endpoint() {
        let config = ServiceConfig::from_lookup(lookup_from(&[
            ("MEDEXTRACT_CODING_API_URL", "https://coding.example"),
            ("MEDEXTRACT_USE_TEST_ENDPOINT", "true"),
            ("MEDEXTRACT_TIMEOUT_SECS", "45"),
        ]));
        assert_eq!(config.coding_api_url, "https://coding.example");
        assert_eq!(config.extraction_endpoint, ExtractionEndpoint::Test);
        assert_eq!(config.timeout_secs, 45);
    }

    #[test]
    fn invalid_timeout_falls_back() {
        let config =
            ServiceConfig::from_lookup(lookup_from(&[("MEDEXTRACT_TIMEOUT_SECS", "soon")]));
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn endpoint_paths() {
        assert_eq!(ExtractionEndpoint::Production.path(), "/extract-codes");
        assert_eq!(ExtractionEndpoint::Test.path(), "/extract-codes-test");
    }

    #[test]
    fn duplicate_highlight_is_two_seconds() {
        assert_eq!(DUPLICATE_HIGHLIGHT_MS, 2_000);
    }
}
