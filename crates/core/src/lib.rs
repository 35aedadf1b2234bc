//! Core types and shared functionality for docstash.
//!
//! This crate provides:
//! - Content-addressed extraction cache with file and Redis backends
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheService, CacheStats};
pub use config::AppConfig;
pub use error::Error;
