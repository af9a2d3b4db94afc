/// Main entry point for the HabitFlow MCP server
///
/// Sets up logging, loads configuration, parses command line arguments and
/// starts the MCP server on stdin/stdout.

use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use habitflow::{Config, HabitFlowServer};

/// Get the default database path with robust fallback strategy
fn get_default_database_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let potential_paths = [
        // 1. User's home directory (preferred)
        dirs::home_dir().map(|p| p.join(".habitflow")),
        // 2. User's data directory (platform-specific)
        dirs::data_dir().map(|p| p.join("habitflow")),
        // 3. User's config directory
        dirs::config_dir().map(|p| p.join("habitflow")),
        // 4. Current working directory (last resort)
        std::env::current_dir().ok().map(|p| p.join(".habitflow")),
    ];

    for potential_path in potential_paths.iter().flatten() {
        if std::fs::create_dir_all(potential_path).is_ok() {
            let test_file = potential_path.join(".test_write");
            if std::fs::write(&test_file, "test").is_ok() {
                let _ = std::fs::remove_file(&test_file);
                return Ok(potential_path.join("habits.db"));
            }
        }
    }

    let temp_path = std::env::temp_dir().join("habitflow");
    std::fs::create_dir_all(&temp_path)?;

    tracing::warn!("Using temporary directory for database: {}", temp_path.display());
    Ok(temp_path.join("habits.db"))
}

/// Command line arguments for the HabitFlow MCP server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the SQLite database file
    /// Overrides `database` from the config file
    #[arg(long)]
    database: Option<PathBuf>,

    /// Path to the TOML config file
    /// Defaults to <config dir>/habitflow/config.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable verbose output (implies debug)
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// CLI flags win over the configured level
    fn log_level<'a>(&self, configured: &'a str) -> &'a str {
        if self.verbose {
            "debug"
        } else if self.debug {
            "info"
        } else {
            configured
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Config is read before logging exists, so its errors go straight to stderr
    let config = Config::load(args.config.as_deref())?;

    let log_level = args.log_level(&config.logging.level);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!("habitflow={}", log_level)))
        .with_writer(std::io::stderr) // stdout carries the protocol
        .init();

    info!("Starting HabitFlow MCP server");

    let db_path = match args.database.or(config.database) {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            path
        }
        None => get_default_database_path()?,
    };

    info!("Using database at: {}", db_path.display());

    let server = HabitFlowServer::new(db_path, config.analytics).await?;
    server.run().await?;

    info!("HabitFlow MCP server shutdown complete");
    Ok(())
}
