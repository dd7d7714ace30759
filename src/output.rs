//! Output types returned by the conversion entry points.

use crate::api::OcrPage;
use crate::input::FileKind;
use serde::{Deserialize, Serialize};

/// Result of a successful conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// The assembled Markdown document: per-page fragments with inline
    /// images substituted, joined by blank lines.
    pub markdown: String,

    /// Raw per-page OCR output, placeholders unresolved. Kept so callers can
    /// re-assemble with different image handling (e.g. exported files) or
    /// inspect individual pages.
    pub pages: Vec<OcrPage>,

    /// What was converted.
    pub source: SourceInfo,

    /// Timing and size statistics.
    pub stats: ConversionStats,
}

/// Description of the resolved input document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceInfo {
    /// File name used for the provider upload.
    pub file_name: String,
    /// Detected file kind.
    pub kind: FileKind,
    /// Input size in bytes.
    pub size_bytes: u64,
}

/// Statistics for one conversion run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Pages in the OCR response.
    pub page_count: usize,
    /// Image records across all pages.
    pub image_count: usize,
    /// Image placeholders actually resolved (records carrying a payload).
    pub resolved_images: usize,
    /// Bytes uploaded to the provider.
    pub bytes_uploaded: u64,
    /// Wall-clock time of the multipart upload.
    pub upload_ms: u64,
    /// Wall-clock time of the OCR call itself.
    pub ocr_ms: u64,
    /// End-to-end wall-clock time including assembly.
    pub total_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_round_trips_through_json() {
        let output = ConversionOutput {
            markdown: "# Doc\n".into(),
            pages: vec![OcrPage {
                index: 0,
                markdown: "# Doc".into(),
                images: vec![],
                dimensions: None,
            }],
            source: SourceInfo {
                file_name: "scan.pdf".into(),
                kind: FileKind::Pdf,
                size_bytes: 1024,
            },
            stats: ConversionStats {
                page_count: 1,
                ..Default::default()
            },
        };

        let json = serde_json::to_string(&output).unwrap();
        assert!(json.contains("\"kind\":\"pdf\""));
        let back: ConversionOutput = serde_json::from_str(&json).unwrap();
        assert_eq!(back.pages.len(), 1);
        assert_eq!(back.source.file_name, "scan.pdf");
    }
}
