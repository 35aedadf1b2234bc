//! Document text extraction with write-through caching.
//!
//! ### Strategy order
//! - Structured parse of the PDF's embedded text layer (fast, exact).
//! - OCR fallback through a remote engine when the text layer is missing
//!   or too thin (slow, approximate).
//!
//! ### Caching
//! - Every extraction is preceded by a content-addressed cache lookup and
//!   followed, on success, by a write-back. A cache failure never blocks
//!   extraction; it only removes the speed benefit.

pub mod ocr;
pub mod pdf;
pub mod pipeline;

pub use ocr::{OcrEngine, RemoteOcr};
pub use pdf::{PdfOutput, PdfText};
pub use pipeline::{ExtractMethod, Extraction, ExtractionPipeline};
