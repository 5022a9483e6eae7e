//! Configuration types for watermarking and compression downloads.
//!
//! Each flow has its own config struct, [`WatermarkConfig`] and
//! [`CompressionConfig`], built through a consuming builder. Everything an
//! operation needs (locale, CSRF token, session cookie, retry cap) travels
//! in these structs; nothing is read from process-wide state once the
//! config is built.

use crate::error::DocstampError;
use crate::progress::WatermarkCallback;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

// ── Watermark ────────────────────────────────────────────────────────────

/// Configuration for stamping a PDF.
///
/// # Example
/// ```rust
/// use docstamp::{Language, WatermarkConfig};
///
/// let config = WatermarkConfig::builder()
///     .language(Language::Zh)
///     .user("张工")
///     .build()
///     .unwrap();
/// assert_eq!(config.language, Language::Zh);
/// ```
#[derive(Clone)]
pub struct WatermarkConfig {
    /// Language of the label text. Default: [`Language::En`].
    pub language: Language,

    /// Name shown on the second label line. Default: None, which prints the
    /// localised "Current User" placeholder.
    pub user: Option<String>,

    /// Explicit TrueType/OpenType font for the label. When None the font is
    /// taken from `DOCSTAMP_FONT` or a list of common system fonts.
    pub font_path: Option<PathBuf>,

    /// Fixed label timestamp. None means "local time when stamping starts".
    pub timestamp: Option<NaiveDateTime>,

    /// Which source pages end up in the output. Default: all pages.
    pub pages: PageSelection,

    /// How page rasters are embedded in the output. Default: lossless.
    pub encoding: ImageEncoding,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Leave pages that fail to render out of the output instead of aborting.
    /// Default: false.
    pub skip_failed_pages: bool,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Per-page progress events.
    pub progress_callback: Option<WatermarkCallback>,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            language: Language::default(),
            user: None,
            font_path: None,
            timestamp: None,
            pages: PageSelection::default(),
            encoding: ImageEncoding::default(),
            password: None,
            skip_failed_pages: false,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for WatermarkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatermarkConfig")
            .field("language", &self.language)
            .field("user", &self.user)
            .field("font_path", &self.font_path)
            .field("timestamp", &self.timestamp)
            .field("pages", &self.pages)
            .field("encoding", &self.encoding)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("skip_failed_pages", &self.skip_failed_pages)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn WatermarkProgressCallback>"),
            )
            .finish()
    }
}

impl WatermarkConfig {
    /// Create a new builder for `WatermarkConfig`.
    pub fn builder() -> WatermarkConfigBuilder {
        WatermarkConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`WatermarkConfig`].
#[derive(Debug)]
pub struct WatermarkConfigBuilder {
    config: WatermarkConfig,
}

impl WatermarkConfigBuilder {
    pub fn language(mut self, language: Language) -> Self {
        self.config.language = language;
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.config.user = Some(user.into());
        self
    }

    pub fn font_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.font_path = Some(path.into());
        self
    }

    pub fn timestamp(mut self, ts: NaiveDateTime) -> Self {
        self.config.timestamp = Some(ts);
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn encoding(mut self, encoding: ImageEncoding) -> Self {
        self.config.encoding = encoding;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn skip_failed_pages(mut self, v: bool) -> Self {
        self.config.skip_failed_pages = v;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs.max(1);
        self
    }

    pub fn progress_callback(mut self, cb: WatermarkCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<WatermarkConfig, DocstampError> {
        if let ImageEncoding::Jpeg { quality } = self.config.encoding {
            if !(1..=100).contains(&quality) {
                return Err(DocstampError::InvalidConfig(format!(
                    "JPEG quality must be 1–100, got {quality}"
                )));
            }
        }
        if let Some(ref user) = self.config.user {
            if user.trim().is_empty() {
                return Err(DocstampError::InvalidConfig(
                    "Watermark user name must not be blank".into(),
                ));
            }
        }
        Ok(self.config)
    }
}

// ── Compression download ─────────────────────────────────────────────────

/// Configuration for talking to the compression service.
///
/// The CSRF token and session cookie are the credentials a browser would
/// have carried implicitly; here they are passed in explicitly.
#[derive(Clone)]
pub struct CompressionConfig {
    /// Server origin, e.g. `https://parts.example.com`. No trailing path.
    pub base_url: String,

    /// CSRF token sent as `X-CSRFToken` and `csrfmiddlewaretoken`.
    pub csrf_token: Option<String>,

    /// Value of the server's session cookie (`sessionid`).
    pub session_cookie: Option<String>,

    /// Per-request timeout in seconds. Default: 30.
    pub request_timeout_secs: u64,

    /// Fixed-interval re-poll policy used while waiting for completion.
    pub poll: PollPolicy,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            csrf_token: None,
            session_cookie: None,
            request_timeout_secs: 30,
            poll: PollPolicy::default(),
        }
    }
}

impl fmt::Debug for CompressionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompressionConfig")
            .field("base_url", &self.base_url)
            .field("csrf_token", &self.csrf_token.as_ref().map(|_| "<redacted>"))
            .field(
                "session_cookie",
                &self.session_cookie.as_ref().map(|_| "<redacted>"),
            )
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("poll", &self.poll)
            .finish()
    }
}

impl CompressionConfig {
    /// Create a new builder for `CompressionConfig`.
    pub fn builder(base_url: impl Into<String>) -> CompressionConfigBuilder {
        CompressionConfigBuilder {
            config: Self {
                base_url: base_url.into(),
                ..Self::default()
            },
        }
    }

    /// Absolute URL for a server path such as `/async_compression/start/`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// Builder for [`CompressionConfig`].
#[derive(Debug)]
pub struct CompressionConfigBuilder {
    config: CompressionConfig,
}

impl CompressionConfigBuilder {
    pub fn csrf_token(mut self, token: impl Into<String>) -> Self {
        self.config.csrf_token = Some(token.into());
        self
    }

    pub fn session_cookie(mut self, value: impl Into<String>) -> Self {
        self.config.session_cookie = Some(value.into());
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs.max(1);
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll.interval = interval;
        self
    }

    pub fn max_poll_retries(mut self, n: u32) -> Self {
        self.config.poll.max_retries = n;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<CompressionConfig, DocstampError> {
        let c = &self.config;
        if !(c.base_url.starts_with("http://") || c.base_url.starts_with("https://")) {
            return Err(DocstampError::InvalidConfig(format!(
                "Base URL must start with http:// or https://, got '{}'",
                c.base_url
            )));
        }
        c.poll.validate()?;
        Ok(self.config)
    }
}

/// Fixed-interval, bounded re-poll policy. No backoff, no jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay between re-polls. Default: 2 s.
    pub interval: Duration,
    /// Re-polls allowed after the first not-ready answer. Default: 10.
    pub max_retries: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_retries: 10,
        }
    }
}

impl PollPolicy {
    pub fn validate(&self) -> Result<(), DocstampError> {
        if self.interval.is_zero() {
            return Err(DocstampError::InvalidConfig(
                "Poll interval must be greater than zero".into(),
            ));
        }
        if self.max_retries == 0 {
            return Err(DocstampError::InvalidConfig(
                "Max poll retries must be ≥ 1".into(),
            ));
        }
        Ok(())
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// The two supported label / request languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Zh,
}

impl Language {
    /// Pick a language from a locale tag such as `zh-CN`, `zh_TW.UTF-8` or
    /// `en-US`. Anything that is not Chinese falls back to English.
    pub fn from_locale(tag: &str) -> Self {
        if tag.trim().to_ascii_lowercase().starts_with("zh") {
            Language::Zh
        } else {
            Language::En
        }
    }

    /// Detect the language from `LC_ALL`, `LC_MESSAGES` or `LANG`.
    pub fn from_env() -> Self {
        ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .filter_map(|k| std::env::var(k).ok())
            .find(|v| !v.is_empty())
            .map(|v| Self::from_locale(&v))
            .unwrap_or_default()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Zh => "zh",
        }
    }
}

/// How each stamped page raster is stored in the output PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImageEncoding {
    /// Flate-compressed RGB samples. Pixel-exact, larger files. (default)
    #[default]
    Lossless,
    /// Baseline JPEG at the given quality (1–100). Much smaller, lossy.
    Jpeg { quality: u8 },
}

/// Specifies which pages of the PDF to stamp.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum PageSelection {
    /// All pages (default).
    #[default]
    All,
    /// A single page (1-indexed).
    Single(usize),
    /// A contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into a sorted, deduplicated list of 0-indexed page numbers.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Single(p) => {
                if *p >= 1 && *p <= total_pages {
                    vec![p - 1]
                } else {
                    vec![]
                }
            }
            PageSelection::Range(start, end) => {
                let s = (*start).max(1) - 1;
                let e = (*end).min(total_pages);
                (s..e).collect()
            }
            PageSelection::Set(pages) => pages
                .iter()
                .filter(|&&p| p >= 1 && p <= total_pages)
                .map(|p| p - 1)
                .collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_from_locale() {
        assert_eq!(Language::from_locale("zh-CN"), Language::Zh);
        assert_eq!(Language::from_locale("ZH_tw.UTF-8"), Language::Zh);
        assert_eq!(Language::from_locale("en-US"), Language::En);
        assert_eq!(Language::from_locale("de"), Language::En);
        assert_eq!(Language::from_locale(""), Language::En);
    }

    #[test]
    fn language_serialises_lowercase() {
        assert_eq!(serde_json::to_string(&Language::Zh).unwrap(), "\"zh\"");
        assert_eq!(Language::En.as_str(), "en");
    }

    #[test]
    fn page_selection_to_indices() {
        assert_eq!(PageSelection::All.to_indices(3), vec![0, 1, 2]);
        assert_eq!(PageSelection::Single(3).to_indices(5), vec![2]);
        assert_eq!(PageSelection::Single(6).to_indices(5), Vec::<usize>::new());
        assert_eq!(PageSelection::Range(2, 4).to_indices(5), vec![1, 2, 3]);
        assert_eq!(PageSelection::Range(4, 9).to_indices(5), vec![3, 4]);
        assert_eq!(
            PageSelection::Set(vec![3, 1, 3]).to_indices(5),
            vec![0, 2]
        );
    }

    #[test]
    fn watermark_builder_rejects_bad_jpeg_quality() {
        let err = WatermarkConfig::builder()
            .encoding(ImageEncoding::Jpeg { quality: 0 })
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("JPEG quality"));
    }

    #[test]
    fn watermark_builder_rejects_blank_user() {
        assert!(WatermarkConfig::builder().user("   ").build().is_err());
    }

    #[test]
    fn watermark_debug_lists_fields_and_redacts_password() {
        let cfg = WatermarkConfig::builder()
            .download_timeout_secs(45)
            .password("hunter2")
            .build()
            .unwrap();
        let dbg = format!("{cfg:?}");
        assert!(dbg.contains("download_timeout_secs: 45"), "got: {dbg}");
        assert!(!dbg.contains("hunter2"));
    }

    #[test]
    fn compression_defaults_match_poll_contract() {
        let cfg = CompressionConfig::builder("https://example.com/")
            .build()
            .unwrap();
        assert_eq!(cfg.poll.interval, Duration::from_secs(2));
        assert_eq!(cfg.poll.max_retries, 10);
        assert_eq!(
            cfg.endpoint("/async_compression/start/"),
            "https://example.com/async_compression/start/"
        );
    }

    #[test]
    fn compression_builder_validates() {
        assert!(CompressionConfig::builder("example.com").build().is_err());
        assert!(CompressionConfig::builder("http://x")
            .max_poll_retries(0)
            .build()
            .is_err());
        assert!(CompressionConfig::builder("http://x")
            .poll_interval(Duration::ZERO)
            .build()
            .is_err());
    }

    #[test]
    fn debug_redacts_credentials() {
        let cfg = CompressionConfig::builder("http://x")
            .csrf_token("secret-token")
            .session_cookie("secret-session")
            .build()
            .unwrap();
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("secret-token"));
        assert!(!dbg.contains("secret-session"));
    }
}
