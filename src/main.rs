use std::sync::Arc;

use colored::Colorize;
use log::{error, info, warn};
use thiserror::Error;
use tokio::runtime::{self, Runtime};
use wishrift_collab::{ArcedDatabase, Collab, DatabaseError, Discovery, MemoryDatabase, PgDatabase};
use wishrift_server::{ConfigError, ServerConfig};

mod logging;

pub struct Wishrift {
    config: ServerConfig,
    collab: Collab,
    runtime: Runtime,
}

#[derive(Debug, Error)]
enum WishriftError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Could not initialize database: {0}")]
    Database(#[from] DatabaseError),

    #[error("Server stopped unexpectedly: {0}")]
    Server(std::io::Error),

    #[error("Fatal error: {0}")]
    Fatal(String),
}

impl Wishrift {
    fn new() -> Result<Self, WishriftError> {
        let config = ServerConfig::from_env()?;

        info!("Building async runtime...");
        let runtime = runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("wishrift-async")
            .build()
            .map_err(|e| WishriftError::Fatal(e.to_string()))?;

        let database: ArcedDatabase = match &config.database_url {
            Some(url) => {
                info!("Connecting to database...");

                let database = runtime.block_on(async {
                    let database = PgDatabase::new(url).await?;
                    database.migrate().await?;

                    Ok::<_, DatabaseError>(database)
                })?;

                Arc::new(database)
            }
            None => {
                warn!("DATABASE_URL is not set, data will only be kept in memory");
                Arc::new(MemoryDatabase::new())
            }
        };

        let discovery = Discovery::new(config.discovery.clone());
        let collab = Collab::new(database, discovery);

        Ok(Self {
            config,
            collab,
            runtime,
        })
    }

    fn run(self) -> Result<(), WishriftError> {
        let Self {
            config,
            collab,
            runtime,
        } = self;

        runtime
            .block_on(wishrift_server::run_server(&config, collab))
            .map_err(WishriftError::Server)
    }
}

impl WishriftError {
    fn hint(&self) -> String {
        match self {
            WishriftError::Config(_) => "Check the WISHRIFT_* environment variables and try again.".to_string(),
            WishriftError::Database(_) => "This is a database error. Make sure DATABASE_URL points to a running Postgres instance, or unset it to run in memory.".to_string(),
            WishriftError::Server(_) => "Make sure the port is not already in use.".to_string(),
            WishriftError::Fatal(_) => "This error is fatal, and should not happen.".to_string(),
        }
    }
}

fn main() {
    if let Err(e) = logging::init_logger() {
        eprintln!("Could not initialize logging: {}", e);
    }

    let result = Wishrift::new().and_then(|wishrift| {
        info!("Initialized successfully.");
        wishrift.run()
    });

    if let Err(error) = result {
        error!(
            "{} Read the error below to troubleshoot the issue.",
            "Wishrift failed to start!".bold().red()
        );
        error!("{}", error);
        error!("{}", format!("Hint: {}", error.hint()).dimmed().italic());
        std::process::exit(1);
    }
}
