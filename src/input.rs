//! Input resolution: normalise the three input sources to typed bytes.
//!
//! The tool accepts an uploaded PDF, an uploaded image, or a camera snapshot.
//! All three collapse here into one [`ResolvedInput`] — bytes plus a file
//! name plus a [`FileKind`] — before anything touches the network, so the
//! rest of the pipeline has a single code path.
//!
//! Type detection tries the file extension first and falls back to magic
//! bytes. A file whose type cannot be determined is a hard error
//! ([`crate::error::Ocr2MdError::UnsupportedFileType`]); guessing a generic
//! extension and letting the provider reject it later produces far worse
//! diagnostics.

use crate::error::Ocr2MdError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File types the OCR service accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Pdf,
    Png,
    Jpeg,
    Tiff,
    Bmp,
}

impl FileKind {
    /// Canonical extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            FileKind::Pdf => "pdf",
            FileKind::Png => "png",
            FileKind::Jpeg => "jpg",
            FileKind::Tiff => "tiff",
            FileKind::Bmp => "bmp",
        }
    }

    /// MIME type for the upload.
    pub fn mime(&self) -> &'static str {
        match self {
            FileKind::Pdf => "application/pdf",
            FileKind::Png => "image/png",
            FileKind::Jpeg => "image/jpeg",
            FileKind::Tiff => "image/tiff",
            FileKind::Bmp => "image/bmp",
        }
    }

    /// Whether the OCR request must use the `document_url` form (PDF) or the
    /// `image_url` form (everything else).
    pub fn is_pdf(&self) -> bool {
        matches!(self, FileKind::Pdf)
    }

    fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(FileKind::Pdf),
            "png" => Some(FileKind::Png),
            "jpg" | "jpeg" => Some(FileKind::Jpeg),
            "tif" | "tiff" => Some(FileKind::Tiff),
            "bmp" => Some(FileKind::Bmp),
            _ => None,
        }
    }

    fn from_magic(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"%PDF") {
            Some(FileKind::Pdf)
        } else if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
            Some(FileKind::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(FileKind::Jpeg)
        } else if bytes.starts_with(b"II*\0") || bytes.starts_with(b"MM\0*") {
            Some(FileKind::Tiff)
        } else if bytes.starts_with(b"BM") {
            Some(FileKind::Bmp)
        } else {
            None
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Where the document came from.
///
/// `CameraImage` carries raw sensor bytes with no meaningful file name;
/// the others keep the name the user supplied so it can label the upload.
#[derive(Debug, Clone)]
pub enum InputSource {
    UploadedPdf { bytes: Vec<u8>, file_name: String },
    UploadedImage { bytes: Vec<u8>, file_name: String },
    CameraImage { bytes: Vec<u8> },
}

/// The common form every input source resolves to.
#[derive(Debug, Clone)]
pub struct ResolvedInput {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub kind: FileKind,
}

impl InputSource {
    /// Resolve the source into typed bytes, detecting and validating the
    /// file kind once.
    pub fn resolve(self) -> Result<ResolvedInput, Ocr2MdError> {
        match self {
            InputSource::UploadedPdf { bytes, file_name } => {
                let kind = detect_kind(&file_name, &bytes)?;
                if !kind.is_pdf() {
                    return Err(Ocr2MdError::UnsupportedFileType {
                        path: PathBuf::from(&file_name),
                        detail: format!("expected a PDF, detected '{kind}'"),
                    });
                }
                Ok(ResolvedInput {
                    bytes,
                    file_name,
                    kind,
                })
            }
            InputSource::UploadedImage { bytes, file_name } => {
                let kind = detect_kind(&file_name, &bytes)?;
                if kind.is_pdf() {
                    return Err(Ocr2MdError::UnsupportedFileType {
                        path: PathBuf::from(&file_name),
                        detail: "expected an image, detected 'pdf'".into(),
                    });
                }
                Ok(ResolvedInput {
                    bytes,
                    file_name,
                    kind,
                })
            }
            InputSource::CameraImage { bytes } => {
                // No declared name; magic bytes are the only signal.
                let kind = FileKind::from_magic(&bytes).ok_or_else(|| {
                    Ocr2MdError::UnsupportedFileType {
                        path: PathBuf::from("<camera>"),
                        detail: "snapshot bytes match no supported image format".into(),
                    }
                })?;
                let file_name = format!("camera-snapshot.{}", kind.extension());
                Ok(ResolvedInput {
                    bytes,
                    file_name,
                    kind,
                })
            }
        }
    }
}

/// Detect the kind of a named byte buffer: extension first, magic fallback.
pub fn detect_kind(file_name: &str, bytes: &[u8]) -> Result<FileKind, Ocr2MdError> {
    if bytes.is_empty() {
        return Err(Ocr2MdError::EmptyInput {
            name: file_name.to_string(),
        });
    }

    let by_ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .and_then(FileKind::from_extension);

    if let Some(kind) = by_ext {
        debug!("Detected '{}' as {} by extension", file_name, kind);
        return Ok(kind);
    }

    if let Some(kind) = FileKind::from_magic(bytes) {
        debug!("Detected '{}' as {} by magic bytes", file_name, kind);
        return Ok(kind);
    }

    Err(Ocr2MdError::UnsupportedFileType {
        path: PathBuf::from(file_name),
        detail: "neither the extension nor the leading bytes match a supported format".into(),
    })
}

/// Read a local file, mapping I/O failures to the input error taxonomy.
pub async fn read_local(path: &Path) -> Result<Vec<u8>, Ocr2MdError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(bytes),
        Err(e) => Err(match e.kind() {
            std::io::ErrorKind::NotFound => Ocr2MdError::FileNotFound {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => Ocr2MdError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => Ocr2MdError::InputReadFailed {
                path: path.to_path_buf(),
                source: e,
            },
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PDF: &[u8] = b"%PDF-1.7 fake";
    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00];

    #[test]
    fn extension_wins_over_magic() {
        // Declared extension takes priority even if bytes disagree.
        let kind = detect_kind("scan.png", PDF).unwrap();
        assert_eq!(kind, FileKind::Png);
    }

    #[test]
    fn magic_fallback_when_extension_unknown() {
        assert_eq!(detect_kind("upload.tmp", PDF).unwrap(), FileKind::Pdf);
        assert_eq!(detect_kind("upload", PNG).unwrap(), FileKind::Png);
        assert_eq!(detect_kind("blob.bin", JPEG).unwrap(), FileKind::Jpeg);
    }

    #[test]
    fn tiff_both_byte_orders() {
        assert_eq!(detect_kind("x", b"II*\0rest").unwrap(), FileKind::Tiff);
        assert_eq!(detect_kind("x", b"MM\0*rest").unwrap(), FileKind::Tiff);
    }

    #[test]
    fn undetectable_type_is_a_hard_error() {
        let err = detect_kind("mystery.dat", b"\x00\x01\x02\x03").unwrap_err();
        assert!(matches!(err, Ocr2MdError::UnsupportedFileType { .. }));
    }

    #[test]
    fn empty_input_is_rejected() {
        let err = detect_kind("empty.pdf", b"").unwrap_err();
        assert!(matches!(err, Ocr2MdError::EmptyInput { .. }));
    }

    #[test]
    fn uploaded_pdf_must_be_pdf() {
        let err = InputSource::UploadedPdf {
            bytes: PNG.to_vec(),
            file_name: "not-a-pdf.png".into(),
        }
        .resolve()
        .unwrap_err();
        assert!(matches!(err, Ocr2MdError::UnsupportedFileType { .. }));
    }

    #[test]
    fn uploaded_image_must_not_be_pdf() {
        let err = InputSource::UploadedImage {
            bytes: PDF.to_vec(),
            file_name: "sneaky.pdf".into(),
        }
        .resolve()
        .unwrap_err();
        assert!(matches!(err, Ocr2MdError::UnsupportedFileType { .. }));
    }

    #[test]
    fn camera_snapshot_detects_by_magic_only() {
        let resolved = InputSource::CameraImage {
            bytes: JPEG.to_vec(),
        }
        .resolve()
        .unwrap();
        assert_eq!(resolved.kind, FileKind::Jpeg);
        assert_eq!(resolved.file_name, "camera-snapshot.jpg");
    }

    #[test]
    fn camera_snapshot_with_garbage_bytes_fails() {
        let err = InputSource::CameraImage {
            bytes: vec![0u8; 16],
        }
        .resolve()
        .unwrap_err();
        assert!(matches!(err, Ocr2MdError::UnsupportedFileType { .. }));
    }

    #[test]
    fn jpeg_extension_variants() {
        assert_eq!(detect_kind("a.jpeg", JPEG).unwrap(), FileKind::Jpeg);
        assert_eq!(detect_kind("a.JPG", JPEG).unwrap(), FileKind::Jpeg);
    }

    #[tokio::test]
    async fn read_local_missing_file() {
        let err = read_local(Path::new("/definitely/not/here.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, Ocr2MdError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn read_local_directory_is_not_reported_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_local(dir.path()).await.unwrap_err();
        assert!(matches!(err, Ocr2MdError::InputReadFailed { .. }));
    }
}
