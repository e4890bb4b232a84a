//! Upstream music catalog: search, audio download and lyric lookup.
//!
//! The resolver and proxy only see the [`Catalog`] trait; [`api::Mp3ApiClient`]
//! is the HTTP implementation used in production.

pub mod api;
pub mod models;

#[cfg(test)]
pub mod fake;

use axum::body::Bytes;
use std::future::Future;
use std::time::Duration;

pub use api::Mp3ApiClient;
pub use models::{Candidate, LyricSource, TimedSentence, TimedWord};

/// Any failure talking to the catalog, with the HTTP status when there was one.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct CatalogError {
    pub status: Option<u16>,
    message: String,
}

impl CatalogError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    #[allow(dead_code)]
    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn timed_out(what: &str, limit: Duration) -> Self {
        Self::new(format!("{what} timed out after {}s", limit.as_secs()))
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(e: reqwest::Error) -> Self {
        Self {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }
}

pub trait Catalog: Send + Sync + 'static {
    fn search(
        &self,
        text: &str,
    ) -> impl Future<Output = Result<Vec<Candidate>, CatalogError>> + Send;

    /// Download the full audio body for a song id.
    fn fetch_audio(&self, id: &str) -> impl Future<Output = Result<Bytes, CatalogError>> + Send;

    fn fetch_lyric(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<LyricSource, CatalogError>> + Send;

    /// Fetch the document behind a [`LyricSource::File`] URL.
    fn fetch_lyric_file(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<String, CatalogError>> + Send;
}

/// Bound a catalog call; an elapsed timer becomes a [`CatalogError`].
pub async fn with_timeout<T>(
    what: &str,
    limit: Duration,
    call: impl Future<Output = Result<T, CatalogError>>,
) -> Result<T, CatalogError> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(CatalogError::timed_out(what, limit)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_with_timeout_elapses() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, CatalogError>(())
        };
        let err = with_timeout("search", Duration::from_secs(15), slow)
            .await
            .unwrap_err();
        assert_eq!(err.status, None);
        assert_eq!(err.to_string(), "search timed out after 15s");
    }

    #[tokio::test]
    async fn test_with_timeout_passes_result_through() {
        let fast = async { Err::<(), _>(CatalogError::with_status(404, "gone")) };
        let err = with_timeout("lyric", Duration::from_secs(1), fast)
            .await
            .unwrap_err();
        assert_eq!(err.status, Some(404));
    }
}
