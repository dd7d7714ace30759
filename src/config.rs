//! Configuration for document-to-Markdown conversion.
//!
//! Credentials and endpoint knobs live in one explicit [`OcrConfig`] value,
//! built via [`OcrConfigBuilder`] and validated once. The pipeline itself
//! never reads ambient environment state; [`OcrConfig::from_env`] is the
//! single place `MISTRAL_API_KEY` is consulted, and only when the caller
//! opts in.

use crate::error::Ocr2MdError;
use crate::progress::ProgressCallback;
use std::fmt;

/// Environment variable holding the Mistral API key, read only by
/// [`OcrConfig::from_env`].
pub const API_KEY_ENV: &str = "MISTRAL_API_KEY";

/// Default OCR model identifier.
pub const DEFAULT_MODEL: &str = "mistral-ocr-latest";

/// Configuration for one or more conversions.
///
/// # Example
/// ```rust
/// use ocr2md::OcrConfig;
///
/// let config = OcrConfig::builder()
///     .api_key("sk-test")
///     .model("mistral-ocr-latest")
///     .include_images(true)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct OcrConfig {
    /// Mistral API key. Required; validated non-empty at build time.
    pub api_key: String,

    /// API base URL. Default: `https://api.mistral.ai`. Overridable so tests
    /// can point the client at a local stub server.
    pub base_url: String,

    /// OCR model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// Ask the provider to inline base64 image payloads. Default: true.
    ///
    /// When false the response carries image records without payloads and
    /// placeholders pass through the assembler unresolved.
    pub include_images: bool,

    /// Signed-URL lifetime in hours for the uploaded file. Default: 1.
    ///
    /// The URL only needs to survive the single OCR call that follows it,
    /// so the minimum the provider accepts is the right default.
    pub signed_url_expiry_hours: u32,

    /// Timeout for the multipart upload in seconds. Default: 120.
    pub upload_timeout_secs: u64,

    /// Timeout for the OCR call (and other small API calls) in seconds.
    /// Default: 300. OCR of a large PDF is the slow step; the provider
    /// processes every page before answering.
    pub api_timeout_secs: u64,

    /// Optional stage-progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.mistral.ai".to_string(),
            model: DEFAULT_MODEL.to_string(),
            include_images: true,
            signed_url_expiry_hours: 1,
            upload_timeout_secs: 120,
            api_timeout_secs: 300,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for OcrConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OcrConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("include_images", &self.include_images)
            .field("signed_url_expiry_hours", &self.signed_url_expiry_hours)
            .field("upload_timeout_secs", &self.upload_timeout_secs)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn callback>"),
            )
            .finish()
    }
}

/// Keep the first four characters so keys remain distinguishable in logs
/// without being usable.
fn redact(key: &str) -> String {
    if key.is_empty() {
        "<unset>".to_string()
    } else if key.len() <= 4 {
        "****".to_string()
    } else {
        format!("{}****", &key[..4])
    }
}

impl OcrConfig {
    /// Create a new builder.
    pub fn builder() -> OcrConfigBuilder {
        OcrConfigBuilder {
            config: Self::default(),
        }
    }

    /// Build a default configuration with the API key taken from
    /// `MISTRAL_API_KEY`.
    ///
    /// # Errors
    /// [`Ocr2MdError::MissingApiKey`] when the variable is unset or empty.
    pub fn from_env() -> Result<Self, Ocr2MdError> {
        let key = std::env::var(API_KEY_ENV).unwrap_or_default();
        Self::builder().api_key(key).build()
    }
}

/// Builder for [`OcrConfig`].
#[derive(Debug)]
pub struct OcrConfigBuilder {
    config: OcrConfig,
}

impl OcrConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn include_images(mut self, v: bool) -> Self {
        self.config.include_images = v;
        self
    }

    pub fn signed_url_expiry_hours(mut self, hours: u32) -> Self {
        self.config.signed_url_expiry_hours = hours.max(1);
        self
    }

    pub fn upload_timeout_secs(mut self, secs: u64) -> Self {
        self.config.upload_timeout_secs = secs.max(1);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs.max(1);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<OcrConfig, Ocr2MdError> {
        let c = &self.config;
        if c.api_key.trim().is_empty() {
            return Err(Ocr2MdError::MissingApiKey {
                hint: format!(
                    "Pass one with OcrConfig::builder().api_key(..) or set {API_KEY_ENV}."
                ),
            });
        }
        if c.base_url.trim().is_empty() {
            return Err(Ocr2MdError::InvalidConfig("base_url must not be empty".into()));
        }
        if c.model.trim().is_empty() {
            return Err(Ocr2MdError::InvalidConfig("model must not be empty".into()));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let config = OcrConfig::builder().api_key("sk-test").build().unwrap();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.base_url, "https://api.mistral.ai");
        assert!(config.include_images);
        assert_eq!(config.signed_url_expiry_hours, 1);
    }

    #[test]
    fn missing_api_key_is_rejected() {
        let err = OcrConfig::builder().build().unwrap_err();
        assert!(matches!(err, Ocr2MdError::MissingApiKey { .. }));

        let err = OcrConfig::builder().api_key("   ").build().unwrap_err();
        assert!(matches!(err, Ocr2MdError::MissingApiKey { .. }));
    }

    #[test]
    fn empty_model_is_rejected() {
        let err = OcrConfig::builder()
            .api_key("sk-test")
            .model("")
            .build()
            .unwrap_err();
        assert!(matches!(err, Ocr2MdError::InvalidConfig(_)));
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = OcrConfig::builder()
            .api_key("sk-very-secret-key")
            .build()
            .unwrap();
        let dbg = format!("{:?}", config);
        assert!(!dbg.contains("very-secret"), "got: {dbg}");
        assert!(dbg.contains("sk-v****"));
    }

    #[test]
    fn expiry_floor_is_one_hour() {
        let config = OcrConfig::builder()
            .api_key("k")
            .signed_url_expiry_hours(0)
            .build()
            .unwrap();
        assert_eq!(config.signed_url_expiry_hours, 1);
    }
}
