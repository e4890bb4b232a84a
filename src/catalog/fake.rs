//! Scripted in-memory catalog for tests.

use crate::catalog::models::{Candidate, LyricSource};
use crate::catalog::{Catalog, CatalogError};
use axum::body::Bytes;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

/// Far beyond any configured limit.
const STALL: Duration = Duration::from_secs(3600);

#[derive(Debug, Default)]
pub struct FakeCatalog {
    pub results: Vec<Candidate>,
    pub search_fails: bool,
    /// Ids without an entry fail to download.
    pub audio: HashMap<String, Bytes>,
    pub lyrics: HashMap<String, LyricSource>,
    pub files: HashMap<String, String>,
    /// Song ids and file URLs whose calls never answer in time.
    pub stalled: HashSet<String>,
    pub searches: Mutex<Vec<String>>,
    pub audio_calls: Mutex<Vec<String>>,
}

impl FakeCatalog {
    pub fn with_results(results: Vec<Candidate>) -> Self {
        Self {
            results,
            ..Self::default()
        }
    }

    pub fn audio(mut self, id: &str, body: &[u8]) -> Self {
        self.audio.insert(id.to_string(), Bytes::copy_from_slice(body));
        self
    }

    pub fn lyric(mut self, id: &str, source: LyricSource) -> Self {
        self.lyrics.insert(id.to_string(), source);
        self
    }

    pub fn file(mut self, url: &str, body: &str) -> Self {
        self.files.insert(url.to_string(), body.to_string());
        self
    }

    pub fn stall(mut self, key: &str) -> Self {
        self.stalled.insert(key.to_string());
        self
    }

    async fn maybe_stall(&self, key: &str) {
        if self.stalled.contains(key) {
            tokio::time::sleep(STALL).await;
        }
    }

    pub fn audio_calls(&self) -> Vec<String> {
        self.audio_calls.lock().unwrap().clone()
    }

    pub fn searches(&self) -> Vec<String> {
        self.searches.lock().unwrap().clone()
    }
}

pub fn candidate(id: &str, title: &str, artists: &str) -> Candidate {
    Candidate {
        id: Some(id.to_string()),
        title: Some(title.to_string()),
        artists: Some(artists.to_string()),
        thumbnail: Some(format!("https://img.example/{id}.jpg")),
        duration_seconds: Some(240),
    }
}

impl Catalog for FakeCatalog {
    async fn search(&self, text: &str) -> Result<Vec<Candidate>, CatalogError> {
        self.searches.lock().unwrap().push(text.to_string());
        if self.search_fails {
            return Err(CatalogError::with_status(502, "bad gateway"));
        }
        Ok(self.results.clone())
    }

    async fn fetch_audio(&self, id: &str) -> Result<Bytes, CatalogError> {
        self.audio_calls.lock().unwrap().push(id.to_string());
        self.maybe_stall(id).await;
        self.audio
            .get(id)
            .cloned()
            .ok_or_else(|| CatalogError::with_status(404, format!("no stream for {id}")))
    }

    async fn fetch_lyric(&self, id: &str) -> Result<LyricSource, CatalogError> {
        self.maybe_stall(id).await;
        self.lyrics
            .get(id)
            .cloned()
            .ok_or_else(|| CatalogError::with_status(500, "lyric service down"))
    }

    async fn fetch_lyric_file(&self, url: &str) -> Result<String, CatalogError> {
        self.maybe_stall(url).await;
        self.files
            .get(url)
            .cloned()
            .ok_or_else(|| CatalogError::with_status(404, format!("no file at {url}")))
    }
}
