// CLI Interface
//
// Serves the REST API, or runs generation and catalog seeding directly
// against the database.

use anyhow::{Context, Result as AnyhowResult};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;
use crate::server::ConseilServer;
use lemoteur::{RecommendationGenerator, UserId};
use leregistre::{seed_catalog, Storage, UserStore};

/// LeConseil - Course Recommendation Backend
#[derive(Parser, Debug)]
#[command(name = "leserve")]
#[command(author = "LeConseil Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Recommend degree programs to senior-high learners", long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(global = true, long = "config", short = 'c')]
    pub config: Option<PathBuf>,

    /// Host address to bind to
    #[arg(global = true, long = "host")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(global = true, long = "port", short = 'p')]
    pub port: Option<u16>,

    /// SQLite database path
    #[arg(global = true, long = "db-path")]
    pub db_path: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(global = true, long = "log-level")]
    pub log_level: Option<String>,

    /// Subcommand to execute (defaults to `serve`)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the REST API server
    Serve,

    /// Generate recommendations for one learner
    Generate {
        /// Learner ID
        #[arg(long = "user-id")]
        user_id: UserId,
    },

    /// Insert the built-in course catalog
    Seed {
        /// Remove every existing course first
        #[arg(long = "replace")]
        replace: bool,
    },
}

impl Cli {
    /// Run the CLI
    pub async fn run(self) -> AnyhowResult<()> {
        let config = self.resolve_config(|key| std::env::var(key).ok())?;
        init_logging_impl(&config.log_level);

        match self.command.unwrap_or(Commands::Serve) {
            Commands::Serve => cmd_serve_impl(config).await,
            Commands::Generate { user_id } => cmd_generate_impl(&config, user_id),
            Commands::Seed { replace } => cmd_seed_impl(&config, replace),
        }
    }

    /// Layer config file, environment and flags, in that order, then validate
    pub fn resolve_config<F>(&self, lookup: F) -> AnyhowResult<ServerConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match &self.config {
            Some(path) => ServerConfig::load(path)?,
            None => ServerConfig::default(),
        };
        config.apply_overrides(lookup);

        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(db_path) = &self.db_path {
            config.db_path = db_path.clone();
        }
        if let Some(log_level) = &self.log_level {
            config.log_level = log_level.clone();
        }

        config
            .validate()
            .map_err(anyhow::Error::msg)
            .context("Invalid configuration")?;
        Ok(config)
    }
}

/// Initialize logging implementation
///
/// `RUST_LOG` wins over the configured level when set.
fn init_logging_impl(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn open_storage(config: &ServerConfig) -> AnyhowResult<Storage> {
    Storage::open_with_config(&config.db_path, config.storage_config())
        .with_context(|| format!("Failed to open database at {}", config.db_path))
}

/// Serve command implementation
async fn cmd_serve_impl(config: ServerConfig) -> AnyhowResult<()> {
    let server = ConseilServer::new(config).context("Failed to create server")?;

    info!("Starting server on {}", server.server_url());
    server.start().await.context("Server failed")?;
    Ok(())
}

/// Generate command implementation
fn cmd_generate_impl(config: &ServerConfig, user_id: UserId) -> AnyhowResult<()> {
    let mut storage = open_storage(config)?;
    let user = UserStore::new(&mut storage)
        .get(user_id)
        .context("Failed to load learner")?;

    let report = RecommendationGenerator::new(&mut storage)
        .generate(user_id)
        .context("Generation failed")?;

    println!(
        "\n✓ Generated {} recommendations for {}",
        report.count, user.full_name
    );
    for rec in &report.recommendations {
        println!(
            "  #{} {} ({:.1}%)",
            rec.recommendation_id,
            rec.course_name,
            rec.confidence_score.value()
        );
    }
    Ok(())
}

/// Seed command implementation
fn cmd_seed_impl(config: &ServerConfig, replace: bool) -> AnyhowResult<()> {
    let mut storage = open_storage(config)?;
    let inserted = seed_catalog(&mut storage, replace).context("Seeding failed")?;
    println!("\n✓ Seeded {} courses into {}", inserted, config.db_path);
    Ok(())
}
