//! Remote document retrieval.
//!
//! [`UrlFetcher`] is the seam between the extractor and the network. The
//! default fetcher downloads `http(s)` URLs with a blocking `reqwest` client
//! (feature `url`) and reads `file://` URLs from the local filesystem. Every
//! transport failure, including a non-success HTTP status, is an `Io` error.

use crate::{ExtractumError, Result};
use std::path::PathBuf;

/// Response of a [`UrlFetcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedDocument {
    pub bytes: Vec<u8>,
    /// `Content-Type` declared by the server, parameters included.
    pub content_type: Option<String>,
    /// URL after redirects.
    pub final_url: String,
}

/// Downloads the document behind a URL.
///
/// # Example
///
/// ```rust
/// use extractum::{FetchedDocument, Result, UrlFetcher};
///
/// struct StaticFetcher;
///
/// impl UrlFetcher for StaticFetcher {
///     fn fetch(&self, url: &str) -> Result<FetchedDocument> {
///         Ok(FetchedDocument {
///             bytes: b"hello".to_vec(),
///             content_type: Some("text/plain".to_string()),
///             final_url: url.to_string(),
///         })
///     }
/// }
/// ```
pub trait UrlFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<FetchedDocument>;
}

/// Scheme of `url`, lowercased.
fn scheme(url: &str) -> Option<String> {
    let (scheme, _) = url.split_once("://")?;
    let valid = !scheme.is_empty()
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then(|| scheme.to_ascii_lowercase())
}

#[cfg(feature = "url")]
fn file_url_to_path(url: &str) -> Result<PathBuf> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|e| ExtractumError::invalid_argument(format!("Invalid URL '{}': {}", url, e)))?;
    parsed
        .to_file_path()
        .map_err(|_| ExtractumError::invalid_argument(format!("URL does not name a local file: {}", url)))
}

#[cfg(not(feature = "url"))]
fn file_url_to_path(url: &str) -> Result<PathBuf> {
    let rest = &url["file://".len()..];
    let path = rest.strip_prefix("localhost").unwrap_or(rest);
    if !path.starts_with('/') {
        return Err(ExtractumError::invalid_argument(format!(
            "URL does not name a local file: {}",
            url
        )));
    }
    Ok(PathBuf::from(path))
}

fn fetch_file(url: &str) -> Result<FetchedDocument> {
    let path = file_url_to_path(url)?;
    let bytes = std::fs::read(&path).map_err(|e| {
        ExtractumError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to read {}: {}", path.display(), e),
        ))
    })?;
    Ok(FetchedDocument {
        bytes,
        content_type: None,
        final_url: url.to_string(),
    })
}

/// Fetcher for `file://` URLs only.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileFetcher;

impl UrlFetcher for FileFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedDocument> {
        match scheme(url).as_deref() {
            Some("file") => fetch_file(url),
            Some(other) => Err(ExtractumError::io(format!(
                "Cannot fetch '{}' URLs: remote fetching is not compiled in",
                other
            ))),
            None => Err(ExtractumError::invalid_argument(format!("Invalid URL: {}", url))),
        }
    }
}

#[cfg(feature = "url")]
pub use http::HttpFetcher;

#[cfg(feature = "url")]
mod http {
    use super::{FetchedDocument, UrlFetcher, fetch_file, scheme};
    use crate::{ExtractumError, Result};
    use once_cell::sync::OnceCell;
    use reqwest::blocking::Client;
    use reqwest::header::CONTENT_TYPE;
    use std::time::Duration;

    const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    /// Blocking HTTP(S) fetcher backed by `reqwest` with rustls.
    ///
    /// The client is built on first use, so constructing an
    /// [`Extractor`](crate::Extractor) never touches TLS setup.
    #[derive(Debug)]
    pub struct HttpFetcher {
        timeout: Duration,
        client: OnceCell<Client>,
    }

    impl HttpFetcher {
        pub fn new() -> Self {
            Self::with_timeout(DEFAULT_TIMEOUT)
        }

        /// Fetcher whose requests fail after `timeout`.
        pub fn with_timeout(timeout: Duration) -> Self {
            Self {
                timeout,
                client: OnceCell::new(),
            }
        }

        fn client(&self) -> Result<&Client> {
            self.client.get_or_try_init(|| {
                Ok(Client::builder()
                    .user_agent(concat!("extractum/", env!("CARGO_PKG_VERSION")))
                    .timeout(self.timeout)
                    .build()?)
            })
        }

        fn fetch_http(&self, url: &str) -> Result<FetchedDocument> {
            let response = self.client()?.get(url).send()?;
            let status = response.status();
            if !status.is_success() {
                return Err(ExtractumError::io(format!("GET {} returned {}", url, status)));
            }

            let final_url = response.url().to_string();
            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);
            let bytes = response.bytes()?.to_vec();

            tracing::debug!(url, final_url = %final_url, size_bytes = bytes.len(), content_type = ?content_type, "fetched URL");
            Ok(FetchedDocument {
                bytes,
                content_type,
                final_url,
            })
        }
    }

    impl Default for HttpFetcher {
        fn default() -> Self {
            Self::new()
        }
    }

    impl UrlFetcher for HttpFetcher {
        fn fetch(&self, url: &str) -> Result<FetchedDocument> {
            match scheme(url).as_deref() {
                Some("http") | Some("https") => self.fetch_http(url),
                Some("file") => fetch_file(url),
                Some(other) => Err(ExtractumError::invalid_argument(format!(
                    "Unsupported URL scheme '{}' in {}",
                    other, url
                ))),
                None => Err(ExtractumError::invalid_argument(format!("Invalid URL: {}", url))),
            }
        }
    }
}

/// Fetcher used by [`Extractor::new`](crate::Extractor::new).
pub fn default_fetcher() -> std::sync::Arc<dyn UrlFetcher> {
    #[cfg(feature = "url")]
    {
        std::sync::Arc::new(HttpFetcher::new())
    }
    #[cfg(not(feature = "url"))]
    {
        std::sync::Arc::new(FileFetcher)
    }
}

/// Last path segment of a URL, used as a file-name hint for MIME detection.
pub fn url_file_name(url: &str) -> Option<PathBuf> {
    let without_fragment = url.split('#').next()?;
    let without_query = without_fragment.split('?').next()?;
    let after_scheme = without_query.split_once("://").map_or(without_query, |(_, rest)| rest);
    let (_, path) = after_scheme.split_once('/')?;
    let name = path.rsplit('/').next()?;
    (!name.is_empty()).then(|| PathBuf::from(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme() {
        assert_eq!(scheme("HTTPS://example.com/a.pdf").as_deref(), Some("https"));
        assert_eq!(scheme("file:///tmp/a.txt").as_deref(), Some("file"));
        assert_eq!(scheme("not a url"), None);
        assert_eq!(scheme("://missing"), None);
    }

    #[test]
    fn test_url_file_name() {
        assert_eq!(
            url_file_name("https://example.com/docs/report.pdf?download=1#page=2"),
            Some(PathBuf::from("report.pdf"))
        );
        assert_eq!(url_file_name("https://example.com/"), None);
        assert_eq!(url_file_name("https://example.com"), None);
        assert_eq!(url_file_name("file:///tmp/notes.txt"), Some(PathBuf::from("notes.txt")));
    }

    #[test]
    fn test_file_fetcher_reads_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.txt");
        std::fs::write(&path, "hello from disk").unwrap();

        let url = format!("file://{}", path.display());
        let fetched = FileFetcher.fetch(&url).unwrap();
        assert_eq!(fetched.bytes, b"hello from disk");
        assert_eq!(fetched.content_type, None);
        assert_eq!(fetched.final_url, url);
    }

    #[test]
    fn test_missing_local_file_is_io() {
        let err = FileFetcher.fetch("file:///nonexistent/extractum/missing.txt").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Io);
    }

    #[test]
    fn test_invalid_url_is_invalid_argument() {
        let err = FileFetcher.fetch("just some words").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidArgument);
    }

    #[cfg(feature = "url")]
    #[test]
    fn test_http_fetcher_rejects_unknown_scheme() {
        let err = HttpFetcher::new().fetch("gopher://example.com/doc").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidArgument);
    }

    #[cfg(feature = "url")]
    #[test]
    fn test_http_fetcher_connection_failure_is_io() {
        let fetcher = HttpFetcher::with_timeout(std::time::Duration::from_secs(2));
        let err = fetcher.fetch("http://127.0.0.1:9/unreachable.txt").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Io);
    }
}
