//! Cache-integrated extraction pipeline.
//!
//! The pipeline consults the content-addressed cache before running any
//! strategy and writes successful results back, so a byte-identical upload
//! under any path is served without re-extraction. No lock spans the
//! check/extract/write sequence: two concurrent callers for the same new
//! file may both extract, and the last write wins. That duplicates work but
//! never produces incorrect output.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use docstash_core::{AppConfig, CacheService};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ocr::OcrEngine;
use crate::pdf::PdfText;

/// Extensions routed straight to OCR.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tiff", "bmp"];

/// Which strategy produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractMethod {
    Structured,
    Ocr,
    #[default]
    None,
}

/// Outcome of one extraction request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Extraction {
    pub text: String,
    pub method: ExtractMethod,
    #[serde(default)]
    pub page_count: Option<u32>,
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub from_cache: bool,
    #[serde(default)]
    pub extract_ms: Option<u64>,
}

impl Extraction {
    fn failure(error: impl Into<String>) -> Self {
        Self {
            text: String::new(),
            method: ExtractMethod::None,
            page_count: None,
            success: false,
            error: Some(error.into()),
            from_cache: false,
            extract_ms: None,
        }
    }

    fn success(text: String, method: ExtractMethod, page_count: Option<u32>) -> Self {
        Self { text, method, page_count, success: true, error: None, from_cache: false, extract_ms: None }
    }

    fn to_payload(&self) -> Option<Value> {
        serde_json::to_value(self).ok()
    }

    fn from_payload(value: Value) -> Option<Self> {
        serde_json::from_value(value).ok()
    }
}

/// Two-strategy extraction with a write-through cache in front.
pub struct ExtractionPipeline {
    cache: Arc<CacheService>,
    ocr: Arc<dyn OcrEngine>,
    pdf: PdfText,
    min_text_len: usize,
    ttl_hours: u64,
    max_file_size_bytes: u64,
}

impl ExtractionPipeline {
    pub fn new(cache: Arc<CacheService>, ocr: Arc<dyn OcrEngine>, config: &AppConfig) -> Self {
        Self {
            cache,
            ocr,
            pdf: PdfText::new(),
            min_text_len: config.min_text_len,
            ttl_hours: config.cache_ttl_hours,
            max_file_size_bytes: config.max_file_size_bytes(),
        }
    }

    /// Extract text from one document.
    ///
    /// Cache hit returns immediately with `from_cache = true` and no
    /// strategy invoked. On a miss the result is written back only when
    /// extraction succeeded with non-empty text, so transient failures are
    /// never pinned in the cache.
    pub async fn extract(&self, path: &Path) -> Extraction {
        if let Some(cached) = self.cache.get(path).await {
            match Extraction::from_payload(cached) {
                Some(mut result) => {
                    result.from_cache = true;
                    return result;
                }
                None => {
                    tracing::warn!(path = %path.display(), "cached payload has unexpected shape, re-extracting");
                }
            }
        }

        let started = Instant::now();
        let mut result = self.run_strategies(path).await;
        result.extract_ms = Some(started.elapsed().as_millis() as u64);

        if result.success && !result.text.is_empty() {
            if let Some(payload) = result.to_payload() {
                self.cache.set(path, &payload, self.ttl_hours).await;
            }
        }

        result
    }

    /// Extract text from several documents, keyed by file name.
    pub async fn extract_many(&self, paths: &[PathBuf]) -> Vec<(String, Extraction)> {
        let mut results = Vec::with_capacity(paths.len());

        for path in paths {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string();
            results.push((name, self.extract(path).await));
        }

        results
    }

    async fn run_strategies(&self, path: &Path) -> Extraction {
        let size = match tokio::fs::metadata(path).await {
            Ok(meta) => meta.len(),
            Err(e) => return Extraction::failure(format!("cannot read file: {e}")),
        };
        if size > self.max_file_size_bytes {
            return Extraction::failure(format!(
                "file too large: {size} bytes exceeds {}",
                self.max_file_size_bytes
            ));
        }

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default().to_lowercase();

        match extension.as_str() {
            "pdf" => self.extract_pdf(path).await,
            ext if IMAGE_EXTENSIONS.contains(&ext) => self.ocr_fallback(path, None).await,
            ext => Extraction::failure(format!("unsupported document format: .{ext}")),
        }
    }

    async fn extract_pdf(&self, path: &Path) -> Extraction {
        match self.pdf.extract_file(path) {
            Ok(output) if output.text.trim().len() > self.min_text_len => {
                Extraction::success(output.text, ExtractMethod::Structured, Some(output.page_count))
            }
            Ok(output) => {
                tracing::debug!(
                    path = %path.display(),
                    chars = output.text.trim().len(),
                    "text layer too thin, falling back to OCR"
                );
                self.ocr_fallback(path, Some(output.page_count)).await
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "structured parse failed, falling back to OCR");
                self.ocr_fallback(path, None).await
            }
        }
    }

    async fn ocr_fallback(&self, path: &Path, page_count: Option<u32>) -> Extraction {
        match self.ocr.recognize(path).await {
            // An empty recognition is still a success; blank pages exist.
            Ok(text) => Extraction::success(text, ExtractMethod::Ocr, page_count),
            Err(e) => Extraction::failure(format!("all extraction strategies failed: {e}")),
        }
    }
}
