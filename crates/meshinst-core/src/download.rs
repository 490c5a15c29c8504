//! Release archive download.
//!
//! Builds the platform-specific release URL and fetches it through an
//! [`HttpFetch`] capability. [`CurlFetcher`] is the libcurl-backed implementation.

use crate::platform::Platform;
use std::fmt;
use std::io::{self, Cursor, Read};
use std::str;
use thiserror::Error;
use url::Url;

/// Download failure. Network errors and bad statuses are kept apart in the
/// message but share this one category.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("invalid release URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("download {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: io::Error,
    },
    #[error("download {url}: bad status: {status}")]
    BadStatus { url: String, status: String },
    #[error("no istioctl release for host platform {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },
}

/// An open response body. Dropping it closes it.
pub struct ResponseBody(Box<dyn Read + Send>);

impl ResponseBody {
    pub fn new(reader: impl Read + Send + 'static) -> Self {
        Self(Box::new(reader))
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self::new(Cursor::new(bytes))
    }
}

impl Read for ResponseBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ResponseBody(..)")
    }
}

/// Result of an HTTP GET: status and the (still open) body.
#[derive(Debug)]
pub struct HttpResponse {
    pub code: u32,
    /// Status as the server sent it, e.g. `404 Not Found`.
    pub status: String,
    pub body: ResponseBody,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code)
    }
}

/// Blocking HTTP GET capability.
pub trait HttpFetch {
    /// Performs a GET. Only transport failures are errors; any status is returned as-is.
    fn get(&self, url: &str) -> io::Result<HttpResponse>;
}

/// libcurl-backed fetcher. Follows redirects (release hosts redirect to a CDN).
///
/// No timeouts are configured; the transfer is bounded only by libcurl and OS defaults.
#[derive(Debug, Clone, Default)]
pub struct CurlFetcher;

impl CurlFetcher {
    pub fn new() -> Self {
        Self
    }
}

impl HttpFetch for CurlFetcher {
    fn get(&self, url: &str) -> io::Result<HttpResponse> {
        let mut body: Vec<u8> = Vec::new();
        let mut status_line = String::new();

        let mut easy = curl::easy::Easy::new();
        easy.url(url).map_err(io::Error::other)?;
        easy.follow_location(true).map_err(io::Error::other)?;
        easy.max_redirections(10).map_err(io::Error::other)?;

        {
            let mut transfer = easy.transfer();
            // After redirects, the last status line seen is the final one.
            transfer
                .header_function(|data| {
                    if let Ok(s) = str::from_utf8(data) {
                        if s.starts_with("HTTP/") {
                            status_line = s.trim_end().to_string();
                        }
                    }
                    true
                })
                .map_err(io::Error::other)?;
            transfer
                .write_function(|data| {
                    body.extend_from_slice(data);
                    Ok(data.len())
                })
                .map_err(io::Error::other)?;
            transfer.perform().map_err(io::Error::other)?;
        }

        let code = easy.response_code().map_err(io::Error::other)?;
        Ok(HttpResponse {
            code,
            status: status_text(&status_line, code),
            body: ResponseBody::from_bytes(body),
        })
    }
}

/// `HTTP/1.1 404 Not Found` -> `404 Not Found`; falls back to the bare code.
fn status_text(status_line: &str, code: u32) -> String {
    match status_line.split_once(' ') {
        Some((_, rest)) if !rest.trim().is_empty() => rest.trim().to_string(),
        _ => code.to_string(),
    }
}

/// Canonical release archive URL: `<base>/<version>/<asset>`.
pub fn release_url(base: &str, platform: &Platform, version: &str) -> Result<Url, DownloadError> {
    let mut url = Url::parse(base).map_err(|source| DownloadError::InvalidUrl {
        url: base.to_string(),
        source,
    })?;
    url.path_segments_mut()
        .map_err(|_| DownloadError::InvalidUrl {
            url: base.to_string(),
            source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
        })?
        .pop_if_empty()
        .push(version)
        .push(&platform.asset_name(version));
    Ok(url)
}

/// Fetches the release archive for `platform`/`version`.
///
/// A non-2xx response is a [`DownloadError::BadStatus`]; its body is closed
/// before returning. On success the caller owns (and closes) the body.
pub fn download_binary(
    http: &dyn HttpFetch,
    base: &str,
    platform: &Platform,
    version: &str,
) -> Result<ResponseBody, DownloadError> {
    let url = release_url(base, platform, version)?;
    tracing::info!(url = %url, "downloading istioctl release");

    let resp = http.get(url.as_str()).map_err(|source| DownloadError::Network {
        url: url.to_string(),
        source,
    })?;

    if !resp.is_success() {
        return Err(DownloadError::BadStatus {
            url: url.to_string(),
            status: resp.status,
        });
    }

    Ok(resp.body)
}
