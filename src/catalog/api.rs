use crate::catalog::{Candidate, Catalog, CatalogError, LyricSource, TimedSentence, TimedWord};
use anyhow::Context;
use axum::body::Bytes;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use std::sync::Arc;

#[derive(Debug)]
struct Inner {
    http: reqwest::Client,
    base_url: String,
    quality: String,
}

/// HTTP client for the ZingMp3 "mp3-api" service.
#[derive(Debug, Clone)]
pub struct Mp3ApiClient {
    inner: Arc<Inner>,
}

impl Mp3ApiClient {
    const USER_AGENT: &'static str = concat!("songproxy/", env!("CARGO_PKG_VERSION"));

    pub fn new(base_url: &str, quality: &str) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(Self::USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));

        // Timeouts are applied per call by the resolver and proxy.
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("build reqwest client")?;

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url: base_url.trim_end_matches('/').to_string(),
                quality: quality.to_string(),
            }),
        })
    }

    pub async fn search_raw(&self, text: &str) -> Result<serde_json::Value, CatalogError> {
        let url = format!(
            "{}/api/search?q={}",
            self.inner.base_url,
            urlencoding::encode(text)
        );
        self.get_json(&url).await
    }

    pub async fn lyric_raw(&self, id: &str) -> Result<serde_json::Value, CatalogError> {
        let url = format!(
            "{}/api/lyric?id={}",
            self.inner.base_url,
            urlencoding::encode(id)
        );
        self.get_json(&url).await
    }

    async fn get_json(&self, url: &str) -> Result<serde_json::Value, CatalogError> {
        let v = self
            .inner
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(v)
    }
}

impl Catalog for Mp3ApiClient {
    async fn search(&self, text: &str) -> Result<Vec<Candidate>, CatalogError> {
        let v = self.search_raw(text).await?;
        Ok(extract_candidates(&v))
    }

    async fn fetch_audio(&self, id: &str) -> Result<Bytes, CatalogError> {
        // The stream endpoint redirects to the CDN; reqwest follows it.
        let url = format!(
            "{}/api/song/stream?id={}&quality={}",
            self.inner.base_url,
            urlencoding::encode(id),
            urlencoding::encode(&self.inner.quality)
        );
        let body = self
            .inner
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        if body.is_empty() {
            return Err(CatalogError::new(format!("empty audio body for {id}")));
        }
        Ok(body)
    }

    async fn fetch_lyric(&self, id: &str) -> Result<LyricSource, CatalogError> {
        let v = self.lyric_raw(id).await?;
        Ok(extract_lyric_source(&v))
    }

    async fn fetch_lyric_file(&self, url: &str) -> Result<String, CatalogError> {
        let text = self
            .inner
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(text)
    }
}

/// Envelope payload when `err == 0`, otherwise `None`.
fn ok_data(v: &serde_json::Value) -> Option<&serde_json::Value> {
    if v.get("err").and_then(|e| e.as_i64()) != Some(0) {
        return None;
    }
    v.get("data").filter(|d| !d.is_null())
}

/// Non-empty string field.
fn str_field(v: &serde_json::Value, key: &str) -> Option<String> {
    v.get(key)
        .and_then(|x| x.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

fn extract_candidates(v: &serde_json::Value) -> Vec<Candidate> {
    let Some(songs) = ok_data(v)
        .and_then(|d| d.get("songs"))
        .and_then(|s| s.as_array())
    else {
        return Vec::new();
    };

    songs
        .iter()
        .map(|s| Candidate {
            id: str_field(s, "encodeId"),
            title: str_field(s, "title"),
            artists: str_field(s, "artistsNames"),
            thumbnail: str_field(s, "thumbnail").or_else(|| str_field(s, "thumbnailM")),
            duration_seconds: s.get("duration").and_then(|d| d.as_u64()),
        })
        .collect()
}

fn extract_lyric_source(v: &serde_json::Value) -> LyricSource {
    let Some(data) = ok_data(v) else {
        return LyricSource::Unavailable;
    };

    if let Some(file) = str_field(data, "file") {
        return LyricSource::File(file);
    }

    let Some(sentences) = data.get("sentences").and_then(|s| s.as_array()) else {
        return LyricSource::Unavailable;
    };

    let sentences = sentences
        .iter()
        .map(|s| TimedSentence {
            words: s
                .get("words")
                .and_then(|w| w.as_array())
                .map(|words| {
                    words
                        .iter()
                        .map(|w| TimedWord {
                            start_ms: w.get("startTime").and_then(|t| t.as_u64()).unwrap_or(0),
                            text: w
                                .get("data")
                                .and_then(|t| t.as_str())
                                .unwrap_or_default()
                                .to_string(),
                        })
                        .collect()
                })
                .unwrap_or_default(),
        })
        .collect();
    LyricSource::TimedSentences(sentences)
}
