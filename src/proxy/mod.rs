//! Audio and lyric passthrough for song ids handed out by the resolver.

use crate::cache::FetchCache;
use crate::catalog::{Catalog, CatalogError, LyricSource, with_timeout};
use crate::config::Timeouts;
use crate::lyrics;
use axum::body::Bytes;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum LyricError {
    #[error("no lyric available for {0}")]
    Unavailable(String),
    #[error("lyric lookup for {id} failed: {source}")]
    Upstream {
        id: String,
        #[source]
        source: CatalogError,
    },
}

pub struct Proxy<C> {
    catalog: Arc<C>,
    cache: Arc<FetchCache>,
    timeouts: Timeouts,
}

impl<C> Clone for Proxy<C> {
    fn clone(&self) -> Self {
        Self {
            catalog: Arc::clone(&self.catalog),
            cache: Arc::clone(&self.cache),
            timeouts: self.timeouts,
        }
    }
}

impl<C: Catalog> Proxy<C> {
    pub fn new(catalog: Arc<C>, cache: Arc<FetchCache>, timeouts: Timeouts) -> Self {
        Self {
            catalog,
            cache,
            timeouts,
        }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn cache(&self) -> &FetchCache {
        &self.cache
    }

    /// Audio bytes for `id`, downloading and caching them on a miss.
    ///
    /// The cache lock is never held while the download is in flight, so two
    /// concurrent misses for one id may both download; the second `put` just
    /// overwrites the first.
    pub async fn audio(&self, id: &str) -> Result<Bytes, CatalogError> {
        if let Some(bytes) = self.cache.get(id) {
            debug!(id, bytes = bytes.len(), "audio cache hit");
            return Ok(bytes);
        }

        let bytes = with_timeout(
            "audio download",
            self.timeouts.download,
            self.catalog.fetch_audio(id),
        )
        .await?;
        info!(id, bytes = bytes.len(), "downloaded audio");
        self.cache.put(id, bytes.clone());
        Ok(bytes)
    }

    /// Lyric text for `id`: the upstream LRC file as-is, or LRC rendered from
    /// word timings.
    pub async fn lyric(&self, id: &str) -> Result<String, LyricError> {
        let source = with_timeout(
            "lyric lookup",
            self.timeouts.lyric,
            self.catalog.fetch_lyric(id),
        )
        .await
        .map_err(|source| LyricError::Upstream {
            id: id.to_string(),
            source,
        })?;

        match source {
            LyricSource::File(url) => {
                debug!(id, %url, "fetching lyric file");
                with_timeout(
                    "lyric file",
                    self.timeouts.lyric,
                    self.catalog.fetch_lyric_file(&url),
                )
                .await
                .map_err(|source| LyricError::Upstream {
                    id: id.to_string(),
                    source,
                })
            }
            LyricSource::TimedSentences(sentences) => Ok(lyrics::render(&sentences)),
            LyricSource::Unavailable => Err(LyricError::Unavailable(id.to_string())),
        }
    }
}
