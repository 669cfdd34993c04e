use std::fs;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, USER_AGENT};
use sha2::{Digest, Sha256};

use crate::error::FetchError;
use crate::storage::write_text;

/// Source of raw page HTML.
///
/// The crawl only depends on this seam, so tests drive it with canned pages.
pub trait Fetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// On-disk HTML cache keyed by the SHA-256 of the URL.
#[derive(Debug, Clone)]
pub struct HtmlCache {
    dir: PathBuf,
    ttl: Duration,
}

impl HtmlCache {
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            ttl,
        }
    }

    fn path_for(&self, url: &str) -> PathBuf {
        let digest = Sha256::digest(url.as_bytes());
        let name: String = digest.iter().map(|b| format!("{b:02x}")).collect();
        self.dir.join(format!("{name}.html"))
    }

    /// Cached body for `url`, if present and younger than the TTL.
    pub fn load(&self, url: &str) -> Option<String> {
        let path = self.path_for(url);
        let modified = fs::metadata(&path).and_then(|m| m.modified()).ok()?;
        let age = SystemTime::now().duration_since(modified).unwrap_or_default();
        if age > self.ttl {
            return None;
        }
        match fs::read_to_string(&path) {
            Ok(body) => Some(body),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not read HTML cache entry");
                None
            }
        }
    }

    pub fn store(&self, url: &str, body: &str) {
        if let Err(e) = write_text(&self.path_for(url), body) {
            tracing::warn!(url, error = %e, "could not write HTML cache entry");
        }
    }
}

/// Blocking HTTP fetcher with a per-request timeout and optional cache.
pub struct HttpFetcher {
    client: Client,
    cache: Option<HtmlCache>,
}

impl HttpFetcher {
    pub fn new(
        timeout: Duration,
        user_agent: &str,
        cache: Option<HtmlCache>,
    ) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        if let Ok(ua) = HeaderValue::from_str(user_agent) {
            headers.insert(USER_AGENT, ua);
        }
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("pt-BR,pt;q=0.9"));
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|source| FetchError::Transport {
                url: String::new(),
                source,
            })?;
        Ok(Self { client, cache })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        if let Some(body) = self.cache.as_ref().and_then(|c| c.load(url)) {
            tracing::debug!(url, "cache hit");
            return Ok(body);
        }

        let transport = |source| FetchError::Transport {
            url: url.to_string(),
            source,
        };
        let response = self.client.get(url).send().map_err(transport)?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.text().map_err(transport)?;

        if let Some(cache) = &self.cache {
            cache.store(url, &body);
        }
        Ok(body)
    }
}
