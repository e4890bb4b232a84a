//! Turn a free-text (song, artist) query into one playable catalog song.

use crate::catalog::{Candidate, Catalog, CatalogError, with_timeout};
use crate::config::Timeouts;
use crate::normalize;
use crate::proxy::Proxy;
use serde::Serialize;
use tracing::{info, warn};

/// How many search hits are probed before giving up.
pub const MAX_CANDIDATES: usize = 3;

const UNKNOWN_ARTIST: &str = "Unknown";

/// What the device receives. `audio_url` and `lyric_url` are relative; the
/// device prepends its own base URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionResult {
    pub title: String,
    pub artist: String,
    pub audio_url: String,
    pub lyric_url: String,
    pub thumbnail: String,
    pub duration: u64,
    pub language: String,
}

impl ResolutionResult {
    fn from_candidate(c: &Candidate, id: &str, song: &str, artist: Option<&str>) -> Self {
        let id = urlencoding::encode(id);
        Self {
            title: c.title.clone().unwrap_or_else(|| song.to_string()),
            artist: c
                .artists
                .clone()
                .or_else(|| artist.map(str::to_string))
                .unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
            audio_url: format!("/proxy_audio?id={id}"),
            lyric_url: format!("/proxy_lyric?id={id}"),
            thumbnail: c.thumbnail.clone().unwrap_or_default(),
            duration: c.duration_seconds.unwrap_or(0),
            language: "unknown".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The catalog returned no hits. Carries the query as searched.
    #[error("no catalog match for {title:?} by {artist:?}")]
    NotFound { title: String, artist: String },
    #[error("catalog search failed: {0}")]
    Search(#[source] CatalogError),
    /// Hits existed but none of the probed candidates could be downloaded.
    #[error("could not download audio for any of {probed} candidate(s)")]
    NoPlayableCandidate { probed: usize },
}

pub struct Resolver<C> {
    proxy: Proxy<C>,
    timeouts: Timeouts,
}

impl<C> Clone for Resolver<C> {
    fn clone(&self) -> Self {
        Self {
            proxy: self.proxy.clone(),
            timeouts: self.timeouts,
        }
    }
}

impl<C: Catalog> Resolver<C> {
    /// Audio is materialized through `proxy`, so resolver prefetches and
    /// proxy requests share one cache.
    pub fn new(proxy: Proxy<C>, timeouts: Timeouts) -> Self {
        Self { proxy, timeouts }
    }

    pub async fn resolve(
        &self,
        song: &str,
        artist: Option<&str>,
    ) -> Result<ResolutionResult, ResolveError> {
        let song = normalize::repair_mojibake(song);
        let artist = artist.map(str::trim).filter(|a| !a.is_empty());
        let query = match artist {
            Some(a) => format!("{song} {a}"),
            None => song.clone(),
        };

        info!(%query, "searching catalog");
        let candidates = with_timeout(
            "search",
            self.timeouts.search,
            self.proxy.catalog().search(&query),
        )
        .await
        .map_err(ResolveError::Search)?;

        if candidates.is_empty() {
            return Err(ResolveError::NotFound {
                title: song,
                artist: artist.unwrap_or(UNKNOWN_ARTIST).to_string(),
            });
        }

        let top = &candidates[..candidates.len().min(MAX_CANDIDATES)];
        for candidate in top {
            let Some(id) = candidate.id.as_deref() else {
                continue;
            };
            match self.proxy.audio(id).await {
                Ok(_) => {
                    let result = ResolutionResult::from_candidate(candidate, id, &song, artist);
                    info!(id, title = %result.title, "resolved");
                    return Ok(result);
                }
                Err(e) => {
                    warn!(
                        id,
                        status = ?e.status,
                        error = %e,
                        "candidate audio failed, trying next"
                    );
                }
            }
        }

        Err(ResolveError::NoPlayableCandidate { probed: top.len() })
    }
}
