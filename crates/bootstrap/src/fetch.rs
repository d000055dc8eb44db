// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Body fetching

use chrono::{DateTime, Utc};

/// A fetched body plus the metadata the loader judges it by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedBody {
    pub bytes: Vec<u8>,
    pub last_modified: Option<DateTime<Utc>>,
}

impl FetchedBody {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            last_modified: None,
        }
    }
}

/// Fetches one URL. Implementations report failures as messages; the
/// loader wraps them into stage-typed errors.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<FetchedBody, String>;
}

/// HTTP(S) fetcher. Non-2xx statuses are failures.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpFetcher;

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedBody, String> {
        tracing::debug!(%url, "fetching");
        let mut response = ureq::get(url).call().map_err(|e| e.to_string())?;

        let last_modified = response
            .headers()
            .get("last-modified")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| DateTime::parse_from_rfc2822(value).ok())
            .map(|value| value.with_timezone(&Utc));

        let bytes = response
            .body_mut()
            .read_to_vec()
            .map_err(|e| e.to_string())?;

        Ok(FetchedBody {
            bytes,
            last_modified,
        })
    }
}

/// Scripted fetcher recording every request, for tests.
#[cfg(any(test, feature = "test-support"))]
#[derive(Clone, Default)]
pub struct FakeFetcher {
    inner: std::sync::Arc<parking_lot::Mutex<FakeFetcherState>>,
}

#[cfg(any(test, feature = "test-support"))]
#[derive(Default)]
struct FakeFetcherState {
    responses: std::collections::HashMap<String, Result<FetchedBody, String>>,
    fetched: Vec<String>,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(&self, url: impl Into<String>, body: FetchedBody) {
        self.inner.lock().responses.insert(url.into(), Ok(body));
    }

    pub fn serve_bytes(&self, url: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.serve(url, FetchedBody::new(bytes));
    }

    pub fn fail(&self, url: impl Into<String>, message: impl Into<String>) {
        self.inner
            .lock()
            .responses
            .insert(url.into(), Err(message.into()));
    }

    /// URLs fetched so far, in order.
    pub fn fetched(&self) -> Vec<String> {
        self.inner.lock().fetched.clone()
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Fetcher for FakeFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedBody, String> {
        let mut state = self.inner.lock();
        state.fetched.push(url.to_string());
        state
            .responses
            .get(url)
            .cloned()
            .unwrap_or_else(|| Err(format!("404 not found: {}", url)))
    }
}
