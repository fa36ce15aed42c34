use clap::{ArgAction, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Read-only catalog server for a folder of EPUB and PDF files.
#[derive(Parser, Debug, Clone)]
#[command(name = "ebook-catalog")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file.
    #[arg(short, long, env = "EBOOK_CATALOG_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Start the server (default if no command given).
    Serve {
        /// Address to bind the server to.
        #[arg(short, long)]
        bind: Option<SocketAddr>,

        /// Library root directory.
        #[arg(short, long)]
        library: Option<PathBuf>,

        /// Shared API token required on every request.
        #[arg(long, env = "EBOOK_CATALOG_API_TOKEN", hide_env_values = true)]
        api_token: Option<String>,
    },

    /// Import PDF/EPUB files from a folder into the library.
    Import {
        /// Directory containing PDFs/EPUBs.
        path: PathBuf,

        /// Copy files into the library root (false only registers original paths).
        #[arg(long, default_value_t = true, action = ArgAction::Set)]
        copy: bool,
    },

    /// List books registered by previous imports.
    Books,

    /// Print catalog statistics as JSON.
    Stats,

    /// Create a default config file.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
}

/// Main configuration from TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Library configuration.
    #[serde(default)]
    pub library: LibraryConfig,

    /// Authentication configuration.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Cache configuration.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Database configuration (import command).
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Import configuration.
    #[serde(default)]
    pub import: ImportConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to.
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,

    /// Catalog title.
    #[serde(default = "default_title")]
    pub title: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            title: default_title(),
        }
    }
}

fn default_bind() -> SocketAddr {
    SocketAddr::new(
        std::net::IpAddr::V4(std::net::Ipv4Addr::new(0, 0, 0, 0)),
        8080,
    )
}

fn default_title() -> String {
    "My Library".to_string()
}

/// Library configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Library root directory.
    #[serde(default = "default_library_root")]
    pub root: PathBuf,

    /// Base URL under which library files are publicly reachable.
    #[serde(default)]
    pub public_url: Option<String>,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            root: default_library_root(),
            public_url: None,
        }
    }
}

fn default_library_root() -> PathBuf {
    PathBuf::from("library")
}

/// Authentication configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared secret; empty or absent disables the check.
    #[serde(default)]
    pub api_token: Option<String>,
}

impl AuthConfig {
    /// The configured token, if the gate is enabled.
    pub fn token(&self) -> Option<&str> {
        self.api_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Lifetime of a cached metadata entry, in seconds.
    #[serde(default = "default_metadata_ttl")]
    pub metadata_ttl_seconds: u64,

    /// Interval between expired-entry purges in seconds (0 to disable).
    #[serde(default = "default_purge_interval")]
    pub purge_interval_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            metadata_ttl_seconds: default_metadata_ttl(),
            purge_interval_seconds: default_purge_interval(),
        }
    }
}

fn default_metadata_ttl() -> u64 {
    6 * 60 * 60
}

fn default_purge_interval() -> u64 {
    600
}

impl CacheConfig {
    /// Metadata TTL as a duration.
    pub fn metadata_ttl(&self) -> Duration {
        Duration::from_secs(self.metadata_ttl_seconds)
    }
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data/catalog.db")
}

/// Import configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Number of parallel import workers (1 = sequential).
    #[serde(default = "default_import_workers")]
    pub workers: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            workers: default_import_workers(),
        }
    }
}

fn default_import_workers() -> usize {
    1
}

impl Config {
    /// Load configuration from file.
    pub fn load(path: &PathBuf) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::error::AppError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        toml::from_str(&content).map_err(|e| {
            crate::error::AppError::Config(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Find config file in default locations.
    pub fn find_config_file() -> Option<PathBuf> {
        let candidates = [
            PathBuf::from("config.toml"),
            PathBuf::from("ebook-catalog.toml"),
            dirs::config_dir()
                .map(|p| p.join("ebook-catalog").join("config.toml"))
                .unwrap_or_default(),
            PathBuf::from("/etc/ebook-catalog/config.toml"),
        ];

        candidates
            .into_iter()
            .find(|p| !p.as_os_str().is_empty() && p.exists())
    }

    /// Generate default config file content.
    pub fn generate_default() -> String {
        r#"# ebook-catalog configuration

[server]
bind = "0.0.0.0:8080"
title = "My Library"

[library]
root = "library"
# Base URL for public file links (optional)
# public_url = "https://cdn.example.org/books"

[auth]
# Shared API token; leave unset to allow anonymous access
# api_token = "change-me"

[cache]
# Metadata cache lifetime in seconds
metadata_ttl_seconds = 21600
# Expired-entry purge interval in seconds (0 to disable)
purge_interval_seconds = 600

[database]
# Used by the import command only
path = "data/catalog.db"

[import]
workers = 1
"#
        .to_string()
    }
}

/// Supported book formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookFormat {
    /// EPUB format (Electronic Publication).
    Epub,
    /// PDF format (Portable Document Format).
    Pdf,
}

impl BookFormat {
    /// Get the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            BookFormat::Epub => "application/epub+zip",
            BookFormat::Pdf => "application/pdf",
        }
    }

    /// Try to detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "epub" => Some(BookFormat::Epub),
            "pdf" => Some(BookFormat::Pdf),
            _ => None,
        }
    }

    /// Detect format from a path's extension.
    pub fn from_path(path: &str) -> Option<Self> {
        let name = path.rsplit('/').next().unwrap_or(path);
        let (_, ext) = name.rsplit_once('.')?;
        Self::from_extension(ext)
    }
}
