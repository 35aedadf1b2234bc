//! OCR fallback engine.
//!
//! OCR itself is an external service; this module owns only the seam. The
//! `OcrEngine` trait keeps the pipeline loosely coupled to whichever engine
//! is deployed, and `RemoteOcr` is the HTTP client for the configured
//! endpoint.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use docstash_core::{AppConfig, Error};
use serde::Deserialize;

/// Image-based text recognition seam.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Recognize text in a document or image file. An empty string is a
    /// valid result (a blank page is not an error).
    async fn recognize(&self, path: &Path) -> Result<String, Error>;
}

/// Response body of the remote OCR endpoint.
#[derive(Debug, Deserialize)]
struct OcrResponse {
    text: String,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP client for a remote OCR engine.
///
/// Posts raw file bytes to `{base_url}/ocr` and reads back recognized text.
pub struct RemoteOcr {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl RemoteOcr {
    pub fn new(base_url: String, api_key: Option<String>, timeout: Duration) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .use_rustls_tls()
            .build()
            .map_err(|e| Error::Ocr(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_string(), api_key })
    }

    /// Build the engine from application configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        Self::new(config.ocr_url.clone(), config.ocr_api_key.clone(), config.ocr_timeout())
    }
}

#[async_trait]
impl OcrEngine for RemoteOcr {
    async fn recognize(&self, path: &Path) -> Result<String, Error> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("document");

        let mut request = self
            .http
            .post(format!("{}/ocr", self.base_url))
            .header("Content-Type", "application/octet-stream")
            .header("X-File-Name", file_name)
            .body(bytes);

        if let Some(key) = &self.api_key {
            request = request.header("X-Api-Key", key);
        }

        let response = request.send().await.map_err(|e| Error::Ocr(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Ocr(format!("engine returned status {}", status.as_u16())));
        }

        let body: OcrResponse = response.json().await.map_err(|e| Error::Ocr(format!("invalid response: {e}")))?;

        if let Some(message) = body.error {
            return Err(Error::Ocr(message));
        }

        Ok(body.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let ocr = RemoteOcr::new("http://localhost:8000/".into(), None, Duration::from_secs(5)).unwrap();
        assert_eq!(ocr.base_url, "http://localhost:8000");
    }

    #[test]
    fn test_from_config() {
        let config = AppConfig { ocr_api_key: Some("key".into()), ..Default::default() };
        let ocr = RemoteOcr::from_config(&config).unwrap();
        assert_eq!(ocr.base_url, "http://localhost:8000");
        assert_eq!(ocr.api_key.as_deref(), Some("key"));
    }

    #[tokio::test]
    async fn test_recognize_missing_file_errors() {
        let ocr = RemoteOcr::new("http://localhost:8000".into(), None, Duration::from_secs(5)).unwrap();
        let result = ocr.recognize(Path::new("/nonexistent/scan.png")).await;
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
