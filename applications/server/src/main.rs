/// Cadence Server - music library manager with server-side playback
use cadence_core::StorageContext;
use cadence_playback::{LoftyResolver, PlaybackService, ResourceResolver, RodioEngine};
use cadence_server::{config::ServerConfig, create_router, services::FileStorage, state::AppState};
use cadence_storage::LocalStorageContext;
use clap::{Parser, Subcommand};
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cadence-server")]
#[command(about = "Cadence music library and playback server", long_about = None)]
struct Cli {
    /// Configuration file path (defaults to ./config.toml when present)
    #[arg(short, long, global = true, env = "CADENCE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// List all tracks in the library
    ListTracks,
    /// List all playlists with their track counts
    ListPlaylists,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "cadence_server=info,cadence_playback=info,cadence_storage=info,tower_http=info"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = ServerConfig::load(cli.config.as_deref())?;
    config.validate()?;

    match cli.command {
        Commands::Serve => {
            serve(config).await?;
        }
        Commands::ListTracks => {
            list_tracks(&config).await?;
        }
        Commands::ListPlaylists => {
            list_playlists(&config).await?;
        }
    }

    Ok(())
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    tracing::info!("Starting Cadence Server");
    tracing::info!("Host: {}", config.server.host);
    tracing::info!("Port: {}", config.server.port);

    // Initialize database
    let db = connect(&config).await?;
    tracing::info!("Database connected");

    // Initialize file storage
    let file_storage = FileStorage::new(config.storage.music_storage_path.clone());
    file_storage.initialize().await?;
    tracing::info!(music_dir = %file_storage.music_dir().display(), "File storage initialized");

    // Initialize playback; the output device opens on first play
    let resolver: Arc<dyn ResourceResolver> = Arc::new(LoftyResolver::new());
    let playback = PlaybackService::spawn(
        config.playback.to_playback_config(),
        Arc::clone(&resolver),
        |events| Box::new(RodioEngine::new(events)),
    );
    tracing::info!(seek_mode = ?config.playback.seek_mode, "Playback service ready");

    // Build application state
    let app_state = AppState::new(
        Arc::new(db),
        playback,
        resolver,
        Arc::new(file_storage),
        config.upload.max_upload_bytes,
    );

    // Build router
    let app = create_router(app_state);

    // Create server address
    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    tracing::info!("Server listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

async fn connect(config: &ServerConfig) -> anyhow::Result<LocalStorageContext> {
    ensure_database_dir(&config.storage.database_url)?;
    Ok(LocalStorageContext::connect(&config.storage.database_url).await?)
}

/// Create the directory of a file-backed SQLite URL
fn ensure_database_dir(database_url: &str) -> anyhow::Result<()> {
    let Some(path) = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
    else {
        return Ok(());
    };

    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path.contains(":memory:") {
        return Ok(());
    }

    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

async fn list_tracks(config: &ServerConfig) -> anyhow::Result<()> {
    let db = connect(config).await?;
    let tracks = db.get_all_tracks().await?;

    println!("Tracks:");
    for track in tracks {
        println!(
            "  {} - {} by {} ({:.2} min)",
            track.id, track.title, track.artist, track.duration_minutes
        );
    }

    Ok(())
}

async fn list_playlists(config: &ServerConfig) -> anyhow::Result<()> {
    let db = connect(config).await?;
    let playlists = db.get_all_playlists().await?;

    println!("Playlists:");
    for playlist in playlists {
        let count = db
            .get_playlist_tracks(playlist.id)
            .await?
            .map_or(0, |tracks| tracks.len());
        println!("  {} - {} ({} tracks)", playlist.id, playlist.name, count);
    }

    Ok(())
}
