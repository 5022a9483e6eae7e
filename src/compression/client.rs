//! reqwest implementation of [`CompressionService`].
//!
//! The endpoints sit behind a session login and CSRF protection. A browser
//! sends the session cookie and token implicitly; here they are passed in
//! through [`CompressionConfig`] and attached to every request:
//!
//! * the session cookie and a `csrftoken` cookie go into a cookie jar
//!   scoped to the base URL,
//! * `X-CSRFToken` and `Referer` headers accompany every POST,
//! * the download form additionally carries `csrfmiddlewaretoken`.

use super::{
    CompressionService, DownloadedArchive, FileType, JobHandle, ProgressResponse,
    ProgressSnapshot, RefusalResponse, StartBody, StartRequest, StartResponse, DOWNLOAD_PATH,
    PROGRESS_PATH, START_PATH,
};
use crate::config::CompressionConfig;
use crate::error::DocstampError;
use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::Regex;
use reqwest::header::{HeaderMap, CONTENT_DISPOSITION, CONTENT_TYPE, REFERER};
use reqwest::{RequestBuilder, Response, Url};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const CSRF_HEADER: &str = "X-CSRFToken";
const SESSION_COOKIE: &str = "sessionid";
const CSRF_COOKIE: &str = "csrftoken";

/// HTTP client for the compression endpoints.
#[derive(Debug, Clone)]
pub struct HttpCompressionClient {
    http: reqwest::Client,
    config: CompressionConfig,
}

impl HttpCompressionClient {
    /// Build a client whose cookie jar already holds the configured
    /// session and CSRF cookies.
    pub fn new(config: CompressionConfig) -> Result<Self, DocstampError> {
        let base = Url::parse(&config.base_url).map_err(|e| DocstampError::InvalidConfig(
            format!("Base URL '{}' is not a valid URL: {e}", config.base_url),
        ))?;

        let jar = Arc::new(reqwest::cookie::Jar::default());
        if let Some(ref session) = config.session_cookie {
            jar.add_cookie_str(&format!("{SESSION_COOKIE}={session}; Path=/"), &base);
        }
        if let Some(ref token) = config.csrf_token {
            jar.add_cookie_str(&format!("{CSRF_COOKIE}={token}; Path=/"), &base);
        }

        let http = reqwest::Client::builder()
            .cookie_provider(jar)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("docstamp/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DocstampError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &CompressionConfig {
        &self.config
    }

    /// Attach the CSRF header and a same-origin referer.
    fn credentialed(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.header(REFERER, self.config.endpoint("/"));
        match self.config.csrf_token {
            Some(ref token) => builder.header(CSRF_HEADER, token),
            None => builder,
        }
    }

    async fn send(&self, endpoint: &str, builder: RequestBuilder) -> Result<Response, DocstampError> {
        let response = builder
            .send()
            .await
            .map_err(|e| self.transport_error(endpoint, e))?;

        let status = response.status();
        debug!("{} → HTTP {}", endpoint, status.as_u16());
        if !status.is_success() {
            return Err(DocstampError::HttpStatus {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    fn transport_error(&self, endpoint: &str, e: reqwest::Error) -> DocstampError {
        if e.is_timeout() {
            DocstampError::RequestTimeout {
                endpoint: endpoint.to_string(),
                secs: self.config.request_timeout_secs,
            }
        } else {
            DocstampError::Transport {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            }
        }
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        response: Response,
    ) -> Result<T, DocstampError> {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(endpoint, e))?;
        serde_json::from_slice(&bytes).map_err(|e| DocstampError::ProtocolError {
            endpoint: endpoint.to_string(),
            detail: format!("invalid JSON: {e}"),
        })
    }
}

impl CompressionService for HttpCompressionClient {
    async fn start(&self, request: &StartRequest) -> Result<JobHandle, DocstampError> {
        if request.product_ids.is_empty() {
            return Err(DocstampError::InvalidInput {
                input: String::new(),
                reason: "no product ids selected".into(),
            });
        }

        let body = StartBody {
            product_ids: request.joined_ids(),
            file_type: request.file_type,
            language: request.language.as_str(),
        };
        let builder = self
            .credentialed(self.http.post(self.config.endpoint(START_PATH)))
            .json(&body);

        let response = self.send(START_PATH, builder).await?;
        let parsed: StartResponse = self.read_json(START_PATH, response).await?;
        let handle = parsed.into_handle()?;
        info!(
            "Compression job {} started for {} product(s)",
            handle,
            request.product_ids.len()
        );
        Ok(handle)
    }

    async fn progress(&self, handle: &JobHandle) -> Result<ProgressSnapshot, DocstampError> {
        let builder = self
            .http
            .get(self.config.endpoint(PROGRESS_PATH))
            .query(&[("task_id", handle.as_str())]);

        let response = self.send(PROGRESS_PATH, builder).await?;
        let parsed: ProgressResponse = self.read_json(PROGRESS_PATH, response).await?;
        parsed.into_snapshot()
    }

    async fn download(
        &self,
        handle: &JobHandle,
        file_type: FileType,
    ) -> Result<DownloadedArchive, DocstampError> {
        let mut form: Vec<(&str, &str)> = Vec::with_capacity(3);
        if let Some(ref token) = self.config.csrf_token {
            form.push(("csrfmiddlewaretoken", token));
        }
        form.push(("task_id", handle.as_str()));
        form.push(("file_type", file_type.as_str()));

        let builder = self
            .credentialed(self.http.post(self.config.endpoint(DOWNLOAD_PATH)))
            .form(&form);
        let response = self.send(DOWNLOAD_PATH, builder).await?;

        let headers = response.headers().clone();
        let content_type = header_str(&headers, CONTENT_TYPE.as_str());

        // The endpoint answers refusals with a 200 JSON body, not a file.
        if content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("application/json"))
        {
            let refusal: RefusalResponse = self.read_json(DOWNLOAD_PATH, response).await?;
            return Err(DocstampError::DownloadRejected {
                message: refusal
                    .message
                    .unwrap_or_else(|| "no reason given".to_string()),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(DOWNLOAD_PATH, e))?
            .to_vec();

        let filename = header_str(&headers, CONTENT_DISPOSITION.as_str())
            .and_then(|cd| filename_from_disposition(&cd))
            .unwrap_or_else(|| fallback_filename(handle, file_type));

        info!("Downloaded {} ({} bytes)", filename, bytes.len());
        Ok(DownloadedArchive {
            filename,
            bytes,
            content_type,
        })
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Name used when the server sends no usable `Content-Disposition`.
pub fn fallback_filename(handle: &JobHandle, file_type: FileType) -> String {
    sanitize_filename(&format!("{}_{}.zip", handle, file_type.as_str()))
        .unwrap_or_else(|| "download.zip".to_string())
}

static RE_FILENAME_EXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)filename\*\s*=\s*[A-Za-z0-9_-]+'[^']*'([^;]+)"#).unwrap()
});

static RE_FILENAME_QUOTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)filename\s*=\s*"([^"]*)""#).unwrap());

static RE_FILENAME_BARE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)filename\s*=\s*([^;"\s]+)"#).unwrap());

/// Extract the file name from a `Content-Disposition` header value.
///
/// `filename*=UTF-8''…` wins over `filename="…"`, which wins over a bare
/// `filename=…`. Directory components are stripped.
pub fn filename_from_disposition(value: &str) -> Option<String> {
    if let Some(c) = RE_FILENAME_EXT.captures(value) {
        let decoded = percent_decode_str(c[1].trim()).decode_utf8_lossy();
        if let Some(name) = sanitize_filename(&decoded) {
            return Some(name);
        }
    }
    if let Some(c) = RE_FILENAME_QUOTED.captures(value) {
        if let Some(name) = sanitize_filename(&c[1]) {
            return Some(name);
        }
    }
    RE_FILENAME_BARE
        .captures(value)
        .and_then(|c| sanitize_filename(&c[1]))
}

fn sanitize_filename(raw: &str) -> Option<String> {
    let name = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .trim()
        .trim_start_matches('.');
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
