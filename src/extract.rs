//! Image export: write inline OCR image payloads to files on disk.
//!
//! Inline base64 keeps the Markdown self-contained but bloats it badly — a
//! scanned page with three figures can exceed a megabyte of text. For callers
//! that prefer a conventional layout, this module decodes each payload into a
//! file named after its placeholder id and produces a document whose image
//! tags point at those files instead.
//!
//! The file naming must agree between [`export_images`] and
//! [`assemble_with_links`]; both go through [`image_file_name`], with a page
//! prefix added when the same id shows up on more than one page.

use crate::api::{OcrImage, OcrPage};
use crate::assemble::resolve_page_images;
use crate::error::Ocr2MdError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, info};

/// Split an encoded payload into its declared MIME type and base64 body.
///
/// Provider payloads are data URIs (`data:image/jpeg;base64,…`); a bare
/// base64 string is accepted too and reported with no MIME type.
fn split_data_uri(payload: &str) -> (Option<&str>, &str) {
    if let Some(rest) = payload.strip_prefix("data:") {
        if let Some((mime, body)) = rest.split_once(";base64,") {
            return (Some(mime), body);
        }
    }
    (None, payload)
}

fn extension_for_mime(mime: &str) -> Option<&'static str> {
    match mime {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/tiff" => Some("tiff"),
        "image/bmp" => Some("bmp"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// File name an image record exports to.
///
/// Provider ids usually already carry an extension (`img-0.jpeg`); when one
/// does not, the extension comes from the payload's declared MIME type, with
/// `.img` as the last resort.
pub fn image_file_name(img: &OcrImage) -> String {
    if Path::new(&img.id).extension().is_some() {
        return img.id.clone();
    }
    let ext = img
        .image_base64
        .as_deref()
        .and_then(|p| split_data_uri(p).0)
        .and_then(extension_for_mime)
        .unwrap_or("img");
    format!("{}.{}", img.id, ext)
}

/// Ids that appear on more than one page.
///
/// Placeholder ids are only unique within a page; providers routinely emit
/// `img-0` on every page. A flat export directory would silently overwrite
/// those, so any id seen on multiple pages gets a page prefix instead.
fn cross_page_ids(pages: &[OcrPage]) -> BTreeSet<String> {
    let mut seen = BTreeSet::new();
    let mut shared = BTreeSet::new();
    for page in pages {
        let on_page: BTreeSet<&str> = page.images.iter().map(|i| i.id.as_str()).collect();
        for id in on_page {
            if !seen.insert(id.to_string()) {
                shared.insert(id.to_string());
            }
        }
    }
    shared
}

/// Export file name for `img` on the page with `page_index`.
///
/// Unambiguous ids keep their bare [`image_file_name`]; ids repeated across
/// pages are prefixed with the page number so each page's bytes land in a
/// distinct file.
fn export_file_name(page_index: usize, img: &OcrImage, shared: &BTreeSet<String>) -> String {
    let base = image_file_name(img);
    if shared.contains(&img.id) {
        format!("p{}-{}", page_index + 1, base)
    } else {
        base
    }
}

/// Decode an image payload into raw bytes.
fn decode_payload(id: &str, payload: &str) -> Result<Vec<u8>, Ocr2MdError> {
    let (_, body) = split_data_uri(payload);
    STANDARD
        .decode(body.trim())
        .map_err(|e| Ocr2MdError::InvalidResponse {
            detail: format!("image '{id}' payload is not valid base64: {e}"),
        })
}

/// Write every image payload in `pages` to `dir`, creating it if needed.
///
/// Records without a payload are skipped. Returns the number of files
/// written.
pub async fn export_images(pages: &[OcrPage], dir: &Path) -> Result<usize, Ocr2MdError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| Ocr2MdError::ImageExportFailed {
            id: "<dir>".into(),
            path: dir.to_path_buf(),
            source: e,
        })?;

    let shared = cross_page_ids(pages);
    let mut written = 0usize;
    for page in pages {
        for img in &page.images {
            let Some(ref payload) = img.image_base64 else {
                continue;
            };
            let bytes = decode_payload(&img.id, payload)?;
            let path = dir.join(export_file_name(page.index, img, &shared));
            tokio::fs::write(&path, &bytes).await.map_err(|e| {
                Ocr2MdError::ImageExportFailed {
                    id: img.id.clone(),
                    path: path.clone(),
                    source: e,
                }
            })?;
            debug!("Exported {} ({} bytes)", path.display(), bytes.len());
            written += 1;
        }
    }

    info!("Exported {} images to {}", written, dir.display());
    Ok(written)
}

/// Assemble the document with image tags pointing at exported files.
///
/// `dir_prefix` is the path prefix written into each link, typically the
/// directory passed to [`export_images`] relative to the Markdown file.
/// Placeholder scoping and page joining match [`crate::assemble::assemble`]
/// exactly; only the substituted target differs.
pub fn assemble_with_links(pages: &[OcrPage], dir_prefix: &str) -> String {
    let prefix = dir_prefix.trim_end_matches('/');
    let shared = cross_page_ids(pages);
    let mut fragments: Vec<String> = Vec::with_capacity(pages.len());

    for page in pages {
        let mut links: BTreeMap<String, String> = BTreeMap::new();
        for img in &page.images {
            if img.image_base64.is_some() {
                links.insert(
                    img.id.clone(),
                    format!("{}/{}", prefix, export_file_name(page.index, img, &shared)),
                );
            }
        }
        fragments.push(resolve_page_images(&page.markdown, &links));
    }

    fragments.join("\n\n")
}
