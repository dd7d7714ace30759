//! Error types for the ocr2md library.
//!
//! The original taxonomy behind this tool collapsed every failure into one
//! generic "conversion failed" message. Here the split that actually matters
//! to a caller is kept explicit:
//!
//! * **Configuration / credentials missing** ([`Ocr2MdError::MissingApiKey`],
//!   [`Ocr2MdError::ApiAuth`], [`Ocr2MdError::InvalidConfig`]) — retrying the
//!   same call can never succeed; the user must fix their setup.
//!
//! * **Conversion failed, try again** ([`Ocr2MdError::OcrFailed`],
//!   [`Ocr2MdError::RateLimited`], [`Ocr2MdError::ApiTimeout`],
//!   [`Ocr2MdError::UploadFailed`]) — the input was fine; the provider or the
//!   network was not. [`Ocr2MdError::is_retryable`] encodes the distinction.
//!
//! No automatic retry happens inside the library; callers decide.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the ocr2md library.
#[derive(Debug, Error)]
pub enum Ocr2MdError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file's type could not be determined from its extension or its
    /// leading bytes, or the type is one the OCR service does not accept.
    ///
    /// The original implementation silently fell back to a generic extension
    /// here; this crate treats an undetectable type as a hard error instead.
    #[error("Unsupported file type for '{path}': {detail}\nSupported: PDF, PNG, JPEG, TIFF, BMP.")]
    UnsupportedFileType { path: PathBuf, detail: String },

    /// Reading the input file failed for a reason other than a missing file
    /// or missing permissions (a directory path, an I/O fault, ...).
    #[error("Failed to read input file '{path}': {source}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input was empty (zero bytes).
    #[error("Input '{name}' is empty")]
    EmptyInput { name: String },

    // ── Configuration errors ──────────────────────────────────────────────
    /// No API key was provided to the configuration.
    #[error("Missing Mistral API key.\n{hint}")]
    MissingApiKey { hint: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── OCR provider errors ───────────────────────────────────────────────
    /// The provider rejected the credentials (HTTP 401/403).
    #[error("Authentication failed against the OCR service: {detail}\nCheck that MISTRAL_API_KEY is valid.")]
    ApiAuth { detail: String },

    /// The provider returned HTTP 429 — caller should back off.
    #[error("Rate limit exceeded by the OCR service")]
    RateLimited { retry_after_secs: Option<u64> },

    /// An API call timed out. `stage` names the pipeline step ("upload",
    /// "signed-url", "ocr").
    #[error("OCR service call timed out after {secs}s during {stage}")]
    ApiTimeout { stage: &'static str, secs: u64 },

    /// The multipart file upload failed.
    #[error("Failed to upload '{file_name}' to the OCR service: {reason}")]
    UploadFailed { file_name: String, reason: String },

    /// Fetching the signed download URL for an uploaded file failed.
    #[error("Failed to obtain a signed URL for uploaded file '{file_id}': {reason}")]
    SignedUrlFailed { file_id: String, reason: String },

    /// The OCR call itself failed with a non-success status.
    #[error("OCR processing failed (HTTP {status}): {detail}\nThe input was accepted but not converted; try again.")]
    OcrFailed { status: u16, detail: String },

    /// The provider answered 2xx but the body did not match the expected shape.
    #[error("Unexpected response from the OCR service: {detail}")]
    InvalidResponse { detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output Markdown file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not write an exported image file.
    #[error("Failed to export image '{id}' to '{path}': {source}")]
    ImageExportFailed {
        id: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Ocr2MdError {
    /// Whether retrying the same call with the same input could plausibly
    /// succeed. Credential and input-shape errors are permanent.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Ocr2MdError::RateLimited { .. }
                | Ocr2MdError::ApiTimeout { .. }
                | Ocr2MdError::UploadFailed { .. }
                | Ocr2MdError::SignedUrlFailed { .. }
                | Ocr2MdError::OcrFailed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_type_display() {
        let e = Ocr2MdError::UnsupportedFileType {
            path: PathBuf::from("notes.xyz"),
            detail: "unknown extension 'xyz'".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("notes.xyz"), "got: {msg}");
        assert!(msg.contains("Supported"));
    }

    #[test]
    fn missing_api_key_is_not_retryable() {
        let e = Ocr2MdError::MissingApiKey {
            hint: "set MISTRAL_API_KEY".into(),
        };
        assert!(!e.is_retryable());
        assert!(e.to_string().contains("MISTRAL_API_KEY")); // hint surfaces
    }

    #[test]
    fn auth_error_is_not_retryable() {
        let e = Ocr2MdError::ApiAuth {
            detail: "invalid key".into(),
        };
        assert!(!e.is_retryable());
        assert!(e.to_string().contains("invalid key"));
    }

    #[test]
    fn ocr_failed_is_retryable() {
        let e = Ocr2MdError::OcrFailed {
            status: 503,
            detail: "backend overloaded".into(),
        };
        assert!(e.is_retryable());
        assert!(e.to_string().contains("503"));
        assert!(e.to_string().contains("try again"));
    }

    #[test]
    fn timeout_display_names_stage() {
        let e = Ocr2MdError::ApiTimeout {
            stage: "upload",
            secs: 120,
        };
        assert!(e.to_string().contains("120s"));
        assert!(e.to_string().contains("upload"));
    }

    #[test]
    fn rate_limited_display() {
        let e = Ocr2MdError::RateLimited {
            retry_after_secs: Some(30),
        };
        assert!(e.to_string().contains("Rate limit"));
        assert!(e.is_retryable());
    }
}
