//! HTTP surface for the device: resolve, audio/lyric proxy and health.

use crate::cache::FetchCache;
use crate::catalog::Catalog;
use crate::config::Timeouts;
use crate::proxy::{LyricError, Proxy};
use crate::resolve::{ResolveError, Resolver};
use anyhow::Context;
use axum::Router;
use axum::extract::{Query, State};
use axum::http::header::{ACCEPT_RANGES, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

pub struct AppState<C> {
    resolver: Resolver<C>,
    proxy: Proxy<C>,
}

impl<C> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            resolver: self.resolver.clone(),
            proxy: self.proxy.clone(),
        }
    }
}

impl<C: Catalog> AppState<C> {
    pub fn new(catalog: C, cache: Arc<FetchCache>, timeouts: Timeouts) -> Self {
        let proxy = Proxy::new(Arc::new(catalog), cache, timeouts);
        Self {
            resolver: Resolver::new(proxy.clone(), timeouts),
            proxy,
        }
    }

    pub fn resolver(&self) -> &Resolver<C> {
        &self.resolver
    }

    pub fn proxy(&self) -> &Proxy<C> {
        &self.proxy
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ResolveParams {
    pub song: Option<String>,
    pub artist: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct IdParams {
    pub id: Option<String>,
}

impl IdParams {
    fn id(&self) -> Option<&str> {
        self.id.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

pub fn router<C: Catalog>(state: AppState<C>) -> Router {
    Router::new()
        .route("/resolve", get(resolve_song::<C>))
        // Path baked into the device firmware.
        .route("/stream_pcm", get(resolve_song::<C>))
        .route("/proxy_audio", get(proxy_audio::<C>))
        .route("/proxy_lyric", get(proxy_lyric::<C>))
        .route("/health", get(health::<C>))
        .with_state(state)
}

pub async fn serve<C: Catalog>(state: AppState<C>, addr: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    info!(%addr, "songproxy listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server")?;

    info!("songproxy stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutting down"),
        Err(e) => {
            warn!(error = %e, "cannot listen for ctrl-c; running until killed");
            std::future::pending::<()>().await;
        }
    }
}

async fn resolve_song<C: Catalog>(
    State(state): State<AppState<C>>,
    Query(params): Query<ResolveParams>,
) -> Response {
    let Some(song) = params.song.as_deref().filter(|s| !s.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Missing song parameter" })),
        )
            .into_response();
    };

    match state.resolver.resolve(song, params.artist.as_deref()).await {
        Ok(result) => Json(result).into_response(),
        Err(e @ ResolveError::NotFound { .. }) => {
            info!(%song, error = %e, "song not found");
            e.into_response()
        }
        Err(e) => {
            warn!(%song, error = %e, "resolve failed");
            e.into_response()
        }
    }
}

impl IntoResponse for ResolveError {
    fn into_response(self) -> Response {
        match self {
            ResolveError::NotFound { title, artist } => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Song not found", "title": title, "artist": artist })),
            )
                .into_response(),
            ResolveError::NoPlayableCandidate { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Failed to process any songs",
                    "detail": "Could not download audio for any of the search results."
                })),
            )
                .into_response(),
            ResolveError::Search(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error" })),
            )
                .into_response(),
        }
    }
}

async fn proxy_audio<C: Catalog>(
    State(state): State<AppState<C>>,
    Query(params): Query<IdParams>,
) -> Response {
    let Some(id) = params.id() else {
        return (StatusCode::BAD_REQUEST, "Missing id parameter").into_response();
    };

    match state.proxy.audio(id).await {
        Ok(bytes) => {
            info!(id, bytes = bytes.len(), "serving audio");
            let mut headers = HeaderMap::new();
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("audio/mpeg"));
            headers.insert(CONTENT_LENGTH, HeaderValue::from(bytes.len()));
            headers.insert(ACCEPT_RANGES, HeaderValue::from_static("bytes"));
            headers.insert(CACHE_CONTROL, HeaderValue::from_static("public, max-age=86400"));
            (headers, bytes).into_response()
        }
        Err(e) => {
            warn!(id, status = ?e.status, error = %e, "proxy audio failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to proxy audio").into_response()
        }
    }
}

async fn proxy_lyric<C: Catalog>(
    State(state): State<AppState<C>>,
    Query(params): Query<IdParams>,
) -> Response {
    let not_found = || (StatusCode::NOT_FOUND, "Lyric not found").into_response();
    let Some(id) = params.id() else {
        return not_found();
    };

    match state.proxy.lyric(id).await {
        Ok(text) => ([(CONTENT_TYPE, "text/plain; charset=utf-8")], text).into_response(),
        Err(e @ LyricError::Unavailable(_)) => {
            info!(error = %e, "lyric missing");
            not_found()
        }
        Err(e) => {
            warn!(error = %e, "proxy lyric failed");
            not_found()
        }
    }
}

async fn health<C: Catalog>(State(state): State<AppState<C>>) -> Json<serde_json::Value> {
    let cache = state.proxy.cache();
    Json(json!({
        "status": "ok",
        "cache_size": cache.len(),
        "cache_capacity": cache.capacity(),
        "cached_songs": cache.keys(),
    }))
}
