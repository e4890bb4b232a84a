use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the mp3-api service.
    pub base_url: String,
    /// Stream quality requested from the catalog ("128", "320").
    pub audio_quality: String,
    pub search_timeout_secs: u64,
    pub lyric_timeout_secs: u64,
    /// Full audio downloads are large; keep this generous.
    pub download_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of songs kept in memory.
    pub capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5006,
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://mp3-api:5555".to_string(),
            audio_quality: "128".to_string(),
            search_timeout_secs: 15,
            lyric_timeout_secs: 15,
            download_timeout_secs: 120,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: crate::cache::DEFAULT_CAPACITY,
        }
    }
}

/// Per-call limits for upstream requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub search: Duration,
    pub lyric: Duration,
    pub download: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        UpstreamConfig::default().timeouts()
    }
}

impl UpstreamConfig {
    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            search: Duration::from_secs(self.search_timeout_secs),
            lyric: Duration::from_secs(self.lyric_timeout_secs),
            download: Duration::from_secs(self.download_timeout_secs),
        }
    }
}

impl CacheConfig {
    pub fn capacity(&self) -> anyhow::Result<NonZeroUsize> {
        NonZeroUsize::new(self.capacity).context("cache capacity must be at least 1")
    }
}

impl Config {
    /// Apply `MP3_API_URL`, `PORT` and `CACHE_MAX_SIZE` from `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("MP3_API_URL") {
            self.upstream.base_url = url;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("parse PORT={port}"))?;
        }
        if let Some(size) = lookup("CACHE_MAX_SIZE") {
            self.cache.capacity = size
                .trim()
                .parse()
                .with_context(|| format!("parse CACHE_MAX_SIZE={size}"))?;
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    let proj =
        ProjectDirs::from("dev", "songproxy", "songproxy").context("ProjectDirs unavailable")?;
    Ok(proj.config_dir().join("config.toml"))
}

/// Defaults, then the TOML file, then the process environment.
///
/// An explicit `override_path` must exist; the default path is optional.
pub fn load(override_path: Option<&Path>) -> anyhow::Result<Config> {
    let mut cfg = match override_path {
        Some(p) => read(p)?,
        None => match default_config_path() {
            Ok(p) if p.exists() => read(&p)?,
            _ => Config::default(),
        },
    };
    cfg.apply_env(|k| std::env::var(k).ok())?;
    cfg.cache.capacity()?;
    Ok(cfg)
}

fn read(path: &Path) -> anyhow::Result<Config> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg = toml::from_str::<Config>(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}
