//! # ocr2md
//!
//! Convert PDF and image documents to Markdown using the Mistral OCR API.
//!
//! ## Why this crate?
//!
//! Classic text extraction loses everything a scanned or laid-out document
//! carries: figures, tables, reading order. The Mistral OCR service returns
//! per-page Markdown with embedded figures as base64 image records; this
//! crate owns the plumbing around that service — typing the input file,
//! driving the upload/OCR cycle, and stitching the per-page output into one
//! portable Markdown document with every image placeholder resolved.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF / image / camera snapshot
//!  │
//!  ├─ 1. Input     detect file kind (extension, then magic bytes)
//!  ├─ 2. Upload    POST /v1/files (purpose=ocr), fetch signed URL
//!  ├─ 3. OCR       POST /v1/ocr with mistral-ocr-latest
//!  ├─ 4. Cleanup   DELETE the provider-side upload (always)
//!  └─ 5. Assemble  resolve ![id](id) placeholders, join pages
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ocr2md::{convert, OcrConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads MISTRAL_API_KEY; or set the key explicitly via the builder.
//!     let config = OcrConfig::from_env()?;
//!     let output = convert("document.pdf", &config).await?;
//!     println!("{}", output.markdown);
//!     eprintln!("{} pages, {} images", output.stats.page_count, output.stats.image_count);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `ocr2md` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! ocr2md = { version = "0.2", default-features = false }
//! ```
//!
//! ## The assembler contract
//!
//! [`assemble::resolve_page_images`] and [`assemble::assemble`] are pure
//! functions over the OCR response — deterministic, allocation-only, safe to
//! call concurrently. They are exposed directly so callers holding an
//! [`api::OcrResponse`] from elsewhere can reuse the assembly logic without
//! touching the network code.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod api;
pub mod assemble;
pub mod config;
pub mod convert;
pub mod error;
pub mod extract;
pub mod input;
pub mod output;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use api::{DocumentSource, OcrClient, OcrImage, OcrPage, OcrResponse};
pub use assemble::{assemble, resolve_page_images};
pub use config::{OcrConfig, OcrConfigBuilder, API_KEY_ENV, DEFAULT_MODEL};
pub use convert::{convert, convert_source, convert_sync, convert_to_file, write_atomic};
pub use error::Ocr2MdError;
pub use extract::{assemble_with_links, export_images};
pub use input::{FileKind, InputSource, ResolvedInput};
pub use output::{ConversionOutput, ConversionStats, SourceInfo};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
