//! On-demand retrieval of a single declaration from live source text.
//!
//! A `Fetcher` reads raw file contents through a [`RawSource`], runs the shared
//! extraction on it and reports a typed outcome. Failures stop here: nothing
//! returned by this module is an error the caller has to propagate.

use crate::extract::{extract, Extraction};
use crate::highlight::{HighlightedToken, Highlighter};
use crate::scanner::Declaration;
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed with HTTP status {status}")]
    Status { url: String, status: u16 },
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("could not read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("fetch of {path} was cancelled")]
    Cancelled { path: String },
}

impl FetchError {
    /// Whether trying again could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Status { status, .. } => *status >= 500 || *status == 429,
            FetchError::Transport { .. } => true,
            FetchError::Io { .. } | FetchError::Cancelled { .. } => false,
        }
    }
}

/// Somewhere raw file contents can be read from, by project-relative path.
pub trait RawSource: Send + Sync {
    fn fetch_raw(&self, path: &str) -> Result<String, FetchError>;
}

/// Raw files served over HTTP, e.g. `https://raw.githubusercontent.com/<owner>/<repo>/<rev>`.
pub struct HttpSource {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, Duration::from_secs(30))
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }

    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl RawSource for HttpSource {
    fn fetch_raw(&self, path: &str) -> Result<String, FetchError> {
        let url = self.url_for(path);
        match self.agent.get(&url).call() {
            Ok(response) => response.into_string().map_err(|e| FetchError::Transport {
                url,
                message: e.to_string(),
            }),
            Err(ureq::Error::Status(status, _)) => Err(FetchError::Status { url, status }),
            Err(ureq::Error::Transport(transport)) => Err(FetchError::Transport {
                url,
                message: transport.to_string(),
            }),
        }
    }
}

/// Raw files read from a local checkout.
pub struct LocalSource {
    root: PathBuf,
}

impl LocalSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl RawSource for LocalSource {
    fn fetch_raw(&self, path: &str) -> Result<String, FetchError> {
        let full = self.root.join(path);
        fs::read_to_string(&full).map_err(|source| FetchError::Io { path: full, source })
    }
}

/// Outcome of fetching one declaration.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LiveSource {
    Found {
        declaration: Declaration,
        tokens: Vec<HighlightedToken>,
    },
    /// The file was fetched but holds no declaration with that name.
    NotFound { path: String, name: String },
    FetchFailed { path: String, message: String },
}

impl LiveSource {
    fn from_extraction(extraction: Extraction, path: &str, name: &str) -> Self {
        match extraction.declaration {
            Some(declaration) => LiveSource::Found {
                declaration,
                tokens: extraction.tokens,
            },
            None => LiveSource::NotFound {
                path: path.to_string(),
                name: name.to_string(),
            },
        }
    }
}

/// Cancellation flag for a single request. Clones share the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One declaration to fetch, with its own cancellation token.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub path: String,
    pub name: String,
    token: CancelToken,
}

impl FetchRequest {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            token: CancelToken::new(),
        }
    }

    /// A handle that cancels this request only.
    pub fn cancel_token(&self) -> CancelToken {
        self.token.clone()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }
}

/// Delay before the first retry. Each further retry waits twice as long.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(250);

/// Fetches declarations independently of each other.
///
/// Each request gets its own retry budget and its own [`CancelToken`].
/// `Fetcher::cancel` additionally cancels every request that has not started
/// an attempt yet.
pub struct Fetcher<S> {
    source: S,
    retries: u32,
    retry_delay: Duration,
    cancelled: AtomicBool,
}

impl<S: RawSource> Fetcher<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            retries: 0,
            retry_delay: DEFAULT_RETRY_DELAY,
            cancelled: AtomicBool::new(false),
        }
    }

    /// Number of extra attempts after a transient failure.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Delay before the first retry; it doubles for each later one.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Cancels every pending fetch of this fetcher.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Fetches `path` and extracts `name` from it.
    pub fn fetch(&self, path: &str, name: &str, highlighter: &Highlighter<'_>) -> LiveSource {
        self.fetch_request(&FetchRequest::new(path, name), highlighter)
    }

    /// Fetches one request, honouring its own cancellation token.
    pub fn fetch_request(
        &self,
        request: &FetchRequest,
        highlighter: &Highlighter<'_>,
    ) -> LiveSource {
        let (path, name) = (request.path.as_str(), request.name.as_str());
        match self.fetch_text(path, &request.token) {
            Ok(raw) => LiveSource::from_extraction(extract(&raw, path, name, highlighter), path, name),
            Err(error) => {
                warn!("could not fetch {}: {}", path, error);
                LiveSource::FetchFailed {
                    path: path.to_string(),
                    message: error.to_string(),
                }
            }
        }
    }

    /// Runs every request in parallel. Results come back in request order.
    pub fn fetch_all(
        &self,
        requests: &[FetchRequest],
        highlighter: &Highlighter<'_>,
    ) -> Vec<LiveSource> {
        requests
            .par_iter()
            .map(|request| self.fetch_request(request, highlighter))
            .collect()
    }

    /// Wait before retry number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.retry_delay
            .saturating_mul(1u32 << attempt.saturating_sub(1).min(16))
    }

    fn fetch_text(&self, path: &str, token: &CancelToken) -> Result<String, FetchError> {
        let mut attempt = 0;
        loop {
            if self.is_cancelled() || token.is_cancelled() {
                return Err(FetchError::Cancelled {
                    path: path.to_string(),
                });
            }
            match self.source.fetch_raw(path) {
                Ok(text) => return Ok(text),
                Err(error) if error.is_transient() && attempt < self.retries => {
                    attempt += 1;
                    let delay = self.backoff(attempt);
                    debug!(
                        "retrying {} in {:?} (attempt {}): {}",
                        path,
                        delay,
                        attempt + 1,
                        error
                    );
                    thread::sleep(delay);
                }
                Err(error) => return Err(error),
            }
        }
    }
}
