mod cache;
mod catalog;
mod config;
mod lyrics;
mod normalize;
mod proxy;
mod resolve;
mod server;

use anyhow::Context;
use catalog::{Catalog, Mp3ApiClient};
use clap::{Parser, Subcommand};
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(
    name = "songproxy",
    version,
    about = "Song resolver and audio/lyric proxy for voice devices"
)]
struct Cli {
    /// Override config file path.
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server (default).
    Serve,
    /// Resolve a song once and print the device response (headless).
    Resolve {
        song: String,
        #[arg(long)]
        artist: Option<String>,
    },
    /// Search the catalog and print candidates (headless).
    Search { query: String },
    /// Dump raw catalog search JSON to stdout (headless).
    SearchJson { query: String },
    /// Print the lyric served for a song id (headless).
    Lyric { id: String },
    /// Print the effective configuration as TOML.
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref()).context("load config")?;
    let catalog = Mp3ApiClient::new(&cfg.upstream.base_url, &cfg.upstream.audio_quality)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let capacity = cfg.cache.capacity()?;
            tracing::info!(
                upstream = %cfg.upstream.base_url,
                cache_capacity = capacity.get(),
                "starting songproxy"
            );
            let state = make_state(catalog, &cfg)?;
            server::serve(state, &cfg.listen_addr()).await?;
        }
        Command::Resolve { song, artist } => {
            let state = make_state(catalog, &cfg)?;
            let result = state
                .resolver()
                .resolve(&song, artist.as_deref())
                .await
                .context("resolve")?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Search { query } => {
            let query = normalize::repair_mojibake(&query);
            let candidates = catalog.search(&query).await.context("search")?;
            print_candidates(&candidates);
        }
        Command::SearchJson { query } => {
            let v = catalog.search_raw(&query).await.context("search")?;
            println!("{}", serde_json::to_string_pretty(&v)?);
        }
        Command::Lyric { id } => {
            let state = make_state(catalog, &cfg)?;
            let text = state.proxy().lyric(&id).await.context("lyric")?;
            print!("{text}");
        }
        Command::Config => {
            print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
        }
    }

    Ok(())
}

fn make_state(
    catalog: Mp3ApiClient,
    cfg: &config::Config,
) -> anyhow::Result<server::AppState<Mp3ApiClient>> {
    let cache = Arc::new(cache::FetchCache::new(cfg.cache.capacity()?));
    Ok(server::AppState::new(
        catalog,
        cache,
        cfg.upstream.timeouts(),
    ))
}

fn print_candidates(candidates: &[catalog::Candidate]) {
    for (i, c) in candidates.iter().enumerate() {
        let artists = c
            .artists
            .as_deref()
            .map(|a| format!(" - {a}"))
            .unwrap_or_default();
        println!(
            "{:02}. {}{}  (id={}, {}s)",
            i + 1,
            c.title.as_deref().unwrap_or("Unknown title"),
            artists,
            c.id.as_deref().unwrap_or("-"),
            c.duration_seconds.unwrap_or(0)
        );
    }
}
