//! Conversion entry points: resolve input, call the OCR service, assemble.
//!
//! The pipeline is one request/response cycle per document:
//!
//! 1. Resolve the input to typed bytes ([`crate::input`])
//! 2. Upload to the provider and fetch a signed URL ([`crate::api`])
//! 3. Run OCR against the signed URL
//! 4. Delete the provider-side copy (best-effort, success or failure)
//! 5. Assemble the per-page Markdown ([`crate::assemble`])
//!
//! Nothing is retained between calls; concurrent conversions with separate
//! configs are independent.

use crate::api::{DocumentSource, OcrClient, OcrResponse};
use crate::assemble::assemble;
use crate::config::OcrConfig;
use crate::error::Ocr2MdError;
use crate::input::{self, InputSource, ResolvedInput};
use crate::output::{ConversionOutput, ConversionStats, SourceInfo};
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Convert a local PDF or image file to Markdown.
///
/// This is the primary entry point for the library.
///
/// # Errors
/// - [`Ocr2MdError::FileNotFound`] / [`Ocr2MdError::PermissionDenied`] for
///   unreadable paths
/// - [`Ocr2MdError::UnsupportedFileType`] when the type cannot be determined
/// - [`Ocr2MdError::ApiAuth`] / [`Ocr2MdError::OcrFailed`] and friends for
///   provider failures (see [`Ocr2MdError::is_retryable`])
pub async fn convert(
    input_path: impl AsRef<Path>,
    config: &OcrConfig,
) -> Result<ConversionOutput, Ocr2MdError> {
    let path = input_path.as_ref();
    info!("Starting conversion: {}", path.display());

    let bytes = input::read_local(path).await?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .to_string();
    let kind = input::detect_kind(&file_name, &bytes)?;

    convert_resolved(ResolvedInput { bytes, file_name, kind }, config).await
}

/// Convert an in-memory input source (upload buffer or camera snapshot).
pub async fn convert_source(
    source: InputSource,
    config: &OcrConfig,
) -> Result<ConversionOutput, Ocr2MdError> {
    convert_resolved(source.resolve()?, config).await
}

/// Convert a local file and write the Markdown to `output_path`.
///
/// The write is atomic (temp file in the target directory, then rename) so a
/// failed run never leaves a partial document behind.
pub async fn convert_to_file(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &OcrConfig,
) -> Result<ConversionStats, Ocr2MdError> {
    let output = convert(input_path, config).await?;
    write_atomic(output_path.as_ref(), &output.markdown).await?;
    Ok(output.stats)
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input_path: impl AsRef<Path>,
    config: &OcrConfig,
) -> Result<ConversionOutput, Ocr2MdError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Ocr2MdError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(convert(input_path, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn convert_resolved(
    resolved: ResolvedInput,
    config: &OcrConfig,
) -> Result<ConversionOutput, Ocr2MdError> {
    let total_start = Instant::now();
    let client = OcrClient::new(config)?;

    let source = SourceInfo {
        file_name: resolved.file_name.clone(),
        kind: resolved.kind,
        size_bytes: resolved.bytes.len() as u64,
    };

    // ── Upload ───────────────────────────────────────────────────────────
    if let Some(ref cb) = config.progress_callback {
        cb.on_upload_start(&resolved.file_name, resolved.bytes.len());
    }
    let upload_start = Instant::now();
    let uploaded = client.upload(&resolved.file_name, resolved.bytes).await?;
    let upload_ms = upload_start.elapsed().as_millis() as u64;
    if let Some(ref cb) = config.progress_callback {
        cb.on_upload_complete(&uploaded.id);
    }

    // ── OCR, with the provider-side copy deleted no matter what ─────────
    if let Some(ref cb) = config.progress_callback {
        cb.on_ocr_start(&config.model);
    }
    let ocr_start = Instant::now();
    let ocr_result = run_ocr(&client, &uploaded.id, resolved.kind.is_pdf(), config).await;
    let ocr_ms = ocr_start.elapsed().as_millis() as u64;

    if let Err(e) = client.delete_file(&uploaded.id).await {
        warn!("Could not delete uploaded file {}: {}", uploaded.id, e);
    }
    let response = ocr_result?;

    if let Some(ref cb) = config.progress_callback {
        cb.on_ocr_complete(response.pages.len());
    }

    // ── Assemble ─────────────────────────────────────────────────────────
    let markdown = assemble(&response.pages);
    if let Some(ref cb) = config.progress_callback {
        let total = response.pages.len();
        for (i, page) in response.pages.iter().enumerate() {
            cb.on_page_assembled(i + 1, total, page.markdown.len());
        }
    }

    let image_count: usize = response.pages.iter().map(|p| p.images.len()).sum();
    let resolved_images: usize = response
        .pages
        .iter()
        .flat_map(|p| &p.images)
        .filter(|i| i.image_base64.is_some())
        .count();

    let stats = ConversionStats {
        page_count: response.pages.len(),
        image_count,
        resolved_images,
        bytes_uploaded: source.size_bytes,
        upload_ms,
        ocr_ms,
        total_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion complete: {} pages, {} images, {}ms total",
        stats.page_count, stats.image_count, stats.total_ms
    );

    Ok(ConversionOutput {
        markdown,
        pages: response.pages,
        source,
        stats,
    })
}

/// Signed URL + OCR call, isolated so the caller can delete the uploaded
/// file whether or not this succeeded.
async fn run_ocr(
    client: &OcrClient,
    file_id: &str,
    is_pdf: bool,
    config: &OcrConfig,
) -> Result<OcrResponse, Ocr2MdError> {
    let signed = client
        .signed_url(file_id, config.signed_url_expiry_hours)
        .await?;

    let document = if is_pdf {
        DocumentSource::DocumentUrl {
            document_url: signed.url,
        }
    } else {
        DocumentSource::ImageUrl {
            image_url: signed.url,
        }
    };

    client
        .process(&document, &config.model, config.include_images)
        .await
}

/// Write `contents` to `path` atomically.
///
/// The document is staged in a temp file inside the destination directory
/// and renamed into place, so an interrupted write never leaves a partial
/// file behind. Parent directories are created as needed.
pub async fn write_atomic(path: &Path, contents: &str) -> Result<(), Ocr2MdError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };

    tokio::fs::create_dir_all(&parent)
        .await
        .map_err(|e| Ocr2MdError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    let target = path.to_path_buf();
    let contents = contents.to_owned();
    tokio::task::spawn_blocking(move || -> Result<(), Ocr2MdError> {
        use std::io::Write;
        let mut tmp = tempfile::NamedTempFile::new_in(&parent).map_err(|e| {
            Ocr2MdError::OutputWriteFailed {
                path: target.clone(),
                source: e,
            }
        })?;
        tmp.write_all(contents.as_bytes())
            .map_err(|e| Ocr2MdError::OutputWriteFailed {
                path: target.clone(),
                source: e,
            })?;
        tmp.persist(&target)
            .map_err(|e| Ocr2MdError::OutputWriteFailed {
                path: target.clone(),
                source: e.error,
            })?;
        Ok(())
    })
    .await
    .map_err(|e| Ocr2MdError::Internal(format!("Write task panicked: {e}")))?
}
