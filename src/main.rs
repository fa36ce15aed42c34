//! ebook-catalog entry point.

use clap::Parser;
use ebook_catalog::{
    config::{Cli, Command, Config},
    db::{Database, timestamp_to_datetime},
    import::Importer,
    library::{LocalStorage, Storage},
    server::{self, AppState},
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ebook_catalog=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Find or load config
    let config_path = cli.config.clone().or_else(Config::find_config_file);

    let config = if let Some(ref path) = config_path {
        tracing::debug!(path = %path.display(), "Loading config");
        Config::load(path)?
    } else {
        Config::default()
    };

    match cli.command {
        Some(Command::Init { force }) => cmd_init(force),
        Some(Command::Import { path, copy }) => cmd_import(&config, path, copy).await,
        Some(Command::Books) => cmd_books(&config),
        Some(Command::Stats) => cmd_stats(config).await,
        Some(Command::Serve {
            bind,
            library,
            api_token,
        }) => cmd_serve(config, bind, library, api_token).await,
        None => cmd_serve(config, None, None, None).await,
    }
}

/// Write a default config file.
fn cmd_init(force: bool) -> anyhow::Result<()> {
    let config_path = PathBuf::from("config.toml");

    if config_path.exists() && !force {
        anyhow::bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(&config_path, Config::generate_default())?;
    println!("Created config file: {}", config_path.display());

    let config = Config::default();
    std::fs::create_dir_all(&config.library.root)?;
    println!("Library root: {}", config.library.root.display());

    println!("\nEdit config.toml to configure your server.");
    println!("Then run: ebook-catalog import /path/to/books");
    println!("And: ebook-catalog serve");

    Ok(())
}

/// Import a folder of books.
async fn cmd_import(config: &Config, path: PathBuf, copy: bool) -> anyhow::Result<()> {
    let db = Database::open(&config.database.path)?;
    let storage: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(&config.library.root).with_public_url(config.library.public_url.clone()),
    );
    let importer = Importer::new(storage, db, config.import.workers);

    let report = tokio::task::spawn_blocking(move || importer.run(&path, copy)).await??;

    println!(
        "Import complete. Imported: {}. Skipped: {}.",
        report.imported, report.skipped
    );

    Ok(())
}

/// List import records.
fn cmd_books(config: &Config) -> anyhow::Result<()> {
    let db = Database::open(&config.database.path)?;
    let books = db.list_books()?;

    if books.is_empty() {
        println!("No books imported.");
        return Ok(());
    }

    println!("{} books imported.\n", db.count_books()?);
    println!("{:<6} {:<40} {:>10} {:<16} PATH", "ID", "TITLE", "SIZE", "IMPORTED");
    println!("{}", "-".repeat(100));
    for book in books {
        let size = book
            .size
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<6} {:<40} {:>10} {:<16} {}",
            book.id,
            book.title,
            size,
            timestamp_to_datetime(book.created_at).format("%Y-%m-%d %H:%M"),
            book.path
        );
    }

    Ok(())
}

/// Print catalog statistics.
async fn cmd_stats(config: Config) -> anyhow::Result<()> {
    let state = AppState::new(config);
    let stats = state.with_catalog(|catalog| catalog.stats()).await?;

    println!("{}", serde_json::to_string_pretty(&stats)?);

    Ok(())
}

/// Start the server.
async fn cmd_serve(
    mut config: Config,
    bind: Option<SocketAddr>,
    library: Option<PathBuf>,
    api_token: Option<String>,
) -> anyhow::Result<()> {
    if let Some(addr) = bind {
        config.server.bind = addr;
    }
    if let Some(root) = library {
        config.library.root = root;
    }
    if api_token.is_some() {
        config.auth.api_token = api_token;
    }

    if !config.library.root.is_dir() {
        tracing::warn!(
            root = %config.library.root.display(),
            "Library root does not exist, catalog will be empty"
        );
    }
    if config.auth.token().is_none() {
        tracing::warn!("No API token configured, catalog is open to anyone");
    }

    tracing::info!(
        bind = %config.server.bind,
        library = %config.library.root.display(),
        "Starting ebook-catalog server"
    );

    let bind = config.server.bind;
    let purge_interval = config.cache.purge_interval_seconds;
    let state = AppState::new(config);

    // Start background cache purge if enabled
    if purge_interval > 0 {
        let state_clone = state.clone();
        let interval = Duration::from_secs(purge_interval);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // Skip first immediate tick

            loop {
                ticker.tick().await;
                let purged = state_clone.purge_cache();
                tracing::debug!(purged, "Purged expired metadata");
            }
        });
    }

    let app = server::create_router(state);

    let listener = TcpListener::bind(bind).await?;
    tracing::info!(address = %bind, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
