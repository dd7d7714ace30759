//! Mistral OCR HTTP client and wire types.
//!
//! The provider flow is three calls, mirroring what its SDK does:
//!
//! 1. `POST /v1/files` — multipart upload with `purpose=ocr`
//! 2. `GET  /v1/files/{id}/url` — short-lived signed URL for the upload
//! 3. `POST /v1/ocr` — run the model against the signed URL
//!
//! plus `DELETE /v1/files/{id}` to drop the provider-side copy once the
//! response is in hand. The client holds no state beyond the HTTP pool and
//! the credentials; retry/backoff is deliberately left to callers.
//!
//! All response types derive `Serialize` as well as `Deserialize` so the CLI
//! can round-trip them into `--json` output.

use crate::config::OcrConfig;
use crate::error::Ocr2MdError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Document reference accepted by the `/v1/ocr` endpoint.
///
/// PDFs go through `document_url`, raster images through `image_url`; the
/// provider rejects a mismatch, so [`crate::input::FileKind`] decides which
/// variant to build.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DocumentSource {
    DocumentUrl { document_url: String },
    ImageUrl { image_url: String },
}

/// Handle returned by the file-upload endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedFile {
    pub id: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(rename = "bytes", default)]
    pub size_bytes: Option<u64>,
}

/// Signed, expiring download URL for an uploaded file.
#[derive(Debug, Clone, Deserialize)]
pub struct SignedUrl {
    pub url: String,
}

/// One unit of OCR output for one physical page of the source document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrPage {
    /// 0-indexed position within the source document.
    pub index: usize,
    /// Markdown text containing zero or more `![id](id)` placeholders.
    pub markdown: String,
    /// Image records belonging to this page, in document order.
    #[serde(default)]
    pub images: Vec<OcrImage>,
    #[serde(default)]
    pub dimensions: Option<PageDimensions>,
}

/// An image embedded in a page, keyed by the placeholder id in that page's
/// Markdown.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrImage {
    /// Identifier unique within its page, e.g. `img-0.jpeg`.
    pub id: String,
    /// Data-URI-ready base64 payload. `None` when inline images were not
    /// requested.
    #[serde(default)]
    pub image_base64: Option<String>,
    #[serde(default)]
    pub top_left_x: Option<i64>,
    #[serde(default)]
    pub top_left_y: Option<i64>,
    #[serde(default)]
    pub bottom_right_x: Option<i64>,
    #[serde(default)]
    pub bottom_right_y: Option<i64>,
}

/// Pixel dimensions of the rasterised page as reported by the provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageDimensions {
    pub dpi: u32,
    pub height: u32,
    pub width: u32,
}

/// Provider-reported usage for one OCR run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct UsageInfo {
    #[serde(default)]
    pub pages_processed: usize,
    #[serde(default)]
    pub doc_size_bytes: Option<u64>,
}

/// Full response of the `/v1/ocr` endpoint: an ordered sequence of pages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrResponse {
    pub pages: Vec<OcrPage>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub usage_info: Option<UsageInfo>,
}

/// Thin client over the Mistral OCR REST API.
pub struct OcrClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    upload_timeout: Duration,
    api_timeout: Duration,
}

impl OcrClient {
    /// Build a client from a validated configuration.
    pub fn new(config: &OcrConfig) -> Result<Self, Ocr2MdError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| Ocr2MdError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            upload_timeout: Duration::from_secs(config.upload_timeout_secs),
            api_timeout: Duration::from_secs(config.api_timeout_secs),
        })
    }

    /// Upload file bytes for OCR processing; returns the provider-side handle.
    pub async fn upload(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedFile, Ocr2MdError> {
        let size = bytes.len();
        info!("Uploading '{}' ({} bytes)", file_name, size);

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("application/octet-stream")
            .map_err(|e| Ocr2MdError::Internal(format!("multipart part: {e}")))?;
        let form = reqwest::multipart::Form::new()
            .text("purpose", "ocr")
            .part("file", part);

        let response = self
            .http
            .post(format!("{}/v1/files", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(self.upload_timeout)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.transport_error(e, "upload"))?;

        let response = check_status(response, "upload").await.map_err(|e| {
            if let Ocr2MdError::OcrFailed { status, detail } = e {
                Ocr2MdError::UploadFailed {
                    file_name: file_name.to_string(),
                    reason: format!("HTTP {status}: {detail}"),
                }
            } else {
                e
            }
        })?;

        let uploaded: UploadedFile = decode_body(response).await?;
        debug!("Uploaded as file id {}", uploaded.id);
        Ok(uploaded)
    }

    /// Fetch a signed URL for a previously uploaded file.
    pub async fn signed_url(
        &self,
        file_id: &str,
        expiry_hours: u32,
    ) -> Result<SignedUrl, Ocr2MdError> {
        let response = self
            .http
            .get(format!("{}/v1/files/{}/url", self.base_url, file_id))
            .query(&[("expiry", expiry_hours)])
            .bearer_auth(&self.api_key)
            .timeout(self.api_timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(e, "signed-url"))?;

        let response = check_status(response, "signed-url").await.map_err(|e| {
            if let Ocr2MdError::OcrFailed { status, detail } = e {
                Ocr2MdError::SignedUrlFailed {
                    file_id: file_id.to_string(),
                    reason: format!("HTTP {status}: {detail}"),
                }
            } else {
                e
            }
        })?;

        decode_body(response).await
    }

    /// Run OCR against a document reference.
    pub async fn process(
        &self,
        document: &DocumentSource,
        model: &str,
        include_images: bool,
    ) -> Result<OcrResponse, Ocr2MdError> {
        info!("Running OCR with model '{}'", model);

        let body = serde_json::json!({
            "model": model,
            "document": document,
            "include_image_base64": include_images,
        });

        let response = self
            .http
            .post(format!("{}/v1/ocr", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(self.api_timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e, "ocr"))?;

        let response = check_status(response, "ocr").await?;
        let ocr: OcrResponse = decode_body(response).await?;
        info!("OCR returned {} pages", ocr.pages.len());
        Ok(ocr)
    }

    /// Delete a previously uploaded file from the provider.
    ///
    /// The conversion pipeline calls this best-effort after OCR so the
    /// transient copy does not linger server-side; failures are logged by the
    /// caller, never fatal.
    pub async fn delete_file(&self, file_id: &str) -> Result<(), Ocr2MdError> {
        let response = self
            .http
            .delete(format!("{}/v1/files/{}", self.base_url, file_id))
            .bearer_auth(&self.api_key)
            .timeout(self.api_timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(e, "delete"))?;

        if !response.status().is_success() {
            warn!(
                "Provider refused to delete file {}: HTTP {}",
                file_id,
                response.status()
            );
        }
        Ok(())
    }

    fn transport_error(&self, e: reqwest::Error, stage: &'static str) -> Ocr2MdError {
        if e.is_timeout() {
            let secs = if stage == "upload" {
                self.upload_timeout.as_secs()
            } else {
                self.api_timeout.as_secs()
            };
            Ocr2MdError::ApiTimeout { stage, secs }
        } else {
            Ocr2MdError::OcrFailed {
                status: 0,
                detail: format!("{stage}: {e}"),
            }
        }
    }
}

/// Map a non-2xx response to the error taxonomy, reading the body for detail.
async fn check_status(
    response: reqwest::Response,
    stage: &'static str,
) -> Result<reqwest::Response, Ocr2MdError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        return Err(Ocr2MdError::RateLimited { retry_after_secs });
    }

    let detail = body_excerpt(response).await;

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(Ocr2MdError::ApiAuth { detail });
    }

    Err(Ocr2MdError::OcrFailed {
        status: status.as_u16(),
        detail: format!("{stage}: {detail}"),
    })
}

/// Deserialize a 2xx body, surfacing shape mismatches as `InvalidResponse`.
async fn decode_body<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, Ocr2MdError> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| Ocr2MdError::InvalidResponse {
            detail: format!("reading body: {e}"),
        })?;
    serde_json::from_slice(&bytes).map_err(|e| Ocr2MdError::InvalidResponse {
        detail: e.to_string(),
    })
}

/// First part of an error body, for human-readable messages.
async fn body_excerpt(response: reqwest::Response) -> String {
    match response.text().await {
        Ok(text) if !text.trim().is_empty() => {
            let mut t = text.trim().to_string();
            if t.len() > 300 {
                t.truncate(297);
                t.push_str("...");
            }
            t
        }
        _ => "(empty body)".to_string(),
    }
}
