use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use playbar_core::AppConfig;
use playbar_engine::{ControllerConfig, TransportController};
use playbar_library::local::{read_playlists, read_settings};
use playbar_library::{
    DisabledRemote, FileStore, LoadOutcome, PlaylistLibrary, PlaylistSync, RemotePlaylists,
};
use playbar_remote::{ApiClient, CatalogClient, HttpPlaylists};
use playbar_transport::{build_transport, event_channel};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

mod poll;
mod repl;
mod session;
mod shell;

use session::PlaybackSession;
use shell::{reply_channels, Flow, Shell};

#[derive(Parser, Debug)]
#[command(
    name = "playbar",
    about = "Catalog search -> playback queue -> synced playlists"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Run,
    Search {
        #[arg(required = true)]
        query: Vec<String>,
    },
    Playlists,
    Doctor,
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cmd = cli.command.unwrap_or(Commands::Run);
    let cfg_path = cli.config.unwrap_or_else(default_config_path);

    match cmd {
        Commands::Config {
            action: ConfigAction::Init,
        } => {
            init_config(&cfg_path)?;
            println!("Initialized config at {}", cfg_path.display());
            Ok(())
        }
        Commands::Search { query } => {
            let cfg = load_or_default(&cfg_path)?;
            init_logging(&cfg.log_level);
            search(&cfg, &query.join(" ")).await
        }
        Commands::Playlists => {
            let cfg = load_or_default(&cfg_path)?;
            init_logging(&cfg.log_level);
            playlists(&cfg).await
        }
        Commands::Doctor => {
            let cfg = load_or_default(&cfg_path)?;
            init_logging(&cfg.log_level);
            doctor(&cfg).await
        }
        Commands::Run => {
            let cfg = load_or_default(&cfg_path)?;
            init_logging(&cfg.log_level);
            run(cfg).await
        }
    }
}

async fn run(cfg: AppConfig) -> Result<()> {
    let api = api_client(&cfg)?;
    let mut library = build_library(&cfg, &api)?;
    let local = library.load_local();
    debug!(playlists = local, "local playlists loaded");
    let settings = read_settings(library.local());

    let (remote_tx, mut remote_rx) = mpsc::unbounded_channel();
    let fetch = library.fetch_remote();
    tokio::spawn(async move {
        remote_tx.send(fetch.await).ok();
    });

    let (event_tx, mut event_rx) = event_channel();
    let (tick_tx, mut tick_rx) = mpsc::unbounded_channel();
    let (outbox, mut inbox) = reply_channels();
    let mut library_rx = library.subscribe();

    let adapter = build_transport(&cfg.transport, event_tx, &cfg.simulated);
    let controller = TransportController::new(ControllerConfig::from_app_config(&cfg));
    let session = PlaybackSession::new(controller, adapter, tick_tx);
    let mut shell = Shell::new(session, library, CatalogClient::new(api), outbox, settings);

    info!(transport = %cfg.transport, api = %cfg.api_base_url, "playbar started");
    println!("playbar ready; type `help` for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            Some(event) = event_rx.recv() => {
                shell.on_transport_event(event).await;
            }
            Some(generation) = tick_rx.recv() => {
                shell.on_tick(generation).await;
            }
            Some((token, details)) = inbox.details.recv() => {
                shell.on_details(token, details);
            }
            Some((token, result)) = inbox.searches.recv() => {
                shell.on_search_results(token, result).await;
            }
            Some(fetch) = remote_rx.recv() => {
                shell.on_remote_playlists(fetch);
            }
            changed = library_rx.changed() => {
                if changed.is_ok() {
                    let count = library_rx.borrow_and_update().len();
                    debug!(playlists = count, "playlist collection changed");
                }
            }
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => {
                        if shell.handle_line(&line).await == Flow::Quit {
                            break;
                        }
                    }
                    Ok(None) => {
                        info!("stdin closed; shutting down");
                        break;
                    }
                    Err(err) => {
                        warn!(error = %err, "failed to read stdin");
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("received ctrl-c; shutting down");
                break;
            }
        }
    }

    shell.shutdown();
    Ok(())
}

async fn search(cfg: &AppConfig, query: &str) -> Result<()> {
    let catalog = CatalogClient::new(api_client(cfg)?);
    let tracks = catalog.search(query).await?;
    if tracks.is_empty() {
        println!("no results");
    }
    for (i, track) in tracks.iter().enumerate() {
        println!("{:>3}. {} [{}]", i + 1, track.title, track.id);
    }
    Ok(())
}

async fn playlists(cfg: &AppConfig) -> Result<()> {
    let mut library = build_library(cfg, &api_client(cfg)?)?;
    if let LoadOutcome::RemoteFailed(err) = library.load().await {
        println!("remote playlists unavailable: {err}");
    }
    for playlist in library.playlists().iter() {
        println!(
            "{:>14}  {} ({} tracks)",
            playlist.id,
            playlist.name,
            playlist.tracks.len()
        );
    }
    Ok(())
}

async fn doctor(cfg: &AppConfig) -> Result<()> {
    println!("== playbar doctor ==");

    let dir = data_dir(cfg);
    println!("Data directory: {}", dir.display());
    match FileStore::open(&dir) {
        Ok(store) => {
            println!("Local playlists: {}", read_playlists(&store).len());
            println!("Show video: {}", read_settings(&store).show_video);
        }
        Err(err) => println!("Local store error: {err:#}"),
    }

    println!("Transport: {}", cfg.transport);
    println!("API base URL: {}", cfg.api_base_url);

    let api = api_client(cfg)?;
    let remote = HttpPlaylists::new(api);
    let reached = tokio::time::timeout(
        Duration::from_millis(cfg.intervals.remote_load_timeout_ms),
        remote.fetch_all(),
    )
    .await;
    match reached {
        Ok(Ok(remote_playlists)) => println!(
            "Backend: reachable ({} remote playlists)",
            remote_playlists.len()
        ),
        Ok(Err(err)) => println!("Backend: not reachable ({err:#})"),
        Err(_) => println!("Backend: timed out"),
    }
    if !cfg.remote_sync {
        println!("Remote playlist sync is disabled");
    }

    Ok(())
}

fn api_client(cfg: &AppConfig) -> Result<ApiClient> {
    ApiClient::new(
        &cfg.api_base_url,
        Duration::from_millis(cfg.intervals.http_timeout_ms),
    )
}

fn build_library(cfg: &AppConfig, api: &ApiClient) -> Result<PlaylistLibrary> {
    let dir = data_dir(cfg);
    let local = FileStore::open(&dir)
        .with_context(|| format!("failed to open data directory {}", dir.display()))?;
    let remote: Arc<dyn RemotePlaylists> = if cfg.remote_sync {
        Arc::new(HttpPlaylists::new(api.clone()))
    } else {
        Arc::new(DisabledRemote)
    };
    let sync = PlaylistSync::new(
        Arc::new(local),
        remote,
        Duration::from_millis(cfg.intervals.remote_load_timeout_ms),
    );
    Ok(PlaylistLibrary::new(sync))
}

fn default_config_path() -> PathBuf {
    let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("playbar").join("config.toml")
}

fn data_dir(cfg: &AppConfig) -> PathBuf {
    match &cfg.data_dir {
        Some(dir) => PathBuf::from(dir),
        None => dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("playbar"),
    }
}

fn init_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    let cfg = AppConfig::default();
    let toml = toml::to_string_pretty(&cfg)?;
    std::fs::write(path, toml)
        .with_context(|| format!("failed to write config file {}", path.display()))?;
    Ok(())
}

fn load_or_default(path: &Path) -> Result<AppConfig> {
    let mut cfg = if !path.exists() {
        AppConfig::default()
    } else {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&data).with_context(|| format!("failed to parse {}", path.display()))?
    };
    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

fn init_logging(log_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_new(log_level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // stdout belongs to the interactive shell
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}

fn apply_env_overrides(cfg: &mut AppConfig) {
    if let Ok(v) = std::env::var("PLAYBAR_API_BASE_URL") {
        if !v.trim().is_empty() {
            cfg.api_base_url = v;
        }
    }
    if let Ok(v) = std::env::var("PLAYBAR_LOG_LEVEL") {
        if !v.trim().is_empty() {
            cfg.log_level = v;
        }
    }
    if let Ok(v) = std::env::var("PLAYBAR_REMOTE_SYNC") {
        if let Ok(parsed) = v.parse::<bool>() {
            cfg.remote_sync = parsed;
        }
    }
    if let Ok(v) = std::env::var("PLAYBAR_DATA_DIR") {
        if !v.trim().is_empty() {
            cfg.data_dir = Some(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{data_dir, init_config, load_or_default};
    use playbar_core::AppConfig;
    use std::path::PathBuf;

    #[test]
    fn init_writes_a_loadable_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        init_config(&path).unwrap();
        let cfg = load_or_default(&path).unwrap();
        assert_eq!(cfg.transport, "simulated");
        assert_eq!(cfg.intervals.position_poll_ms, 250);
    }

    #[test]
    fn explicit_data_dir_wins() {
        let cfg = AppConfig {
            data_dir: Some("/tmp/playbar-data".to_string()),
            ..AppConfig::default()
        };
        assert_eq!(data_dir(&cfg), PathBuf::from("/tmp/playbar-data"));
    }
}
