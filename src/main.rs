//! Tic-tac-toe service entrypoint.

#![warn(missing_docs)]

mod cli;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use tictactoe_service::{
    AiService, DisabledPlatform, GameRepository, GameService, HttpAiService,
    HttpPlatformService, LocalAiService, PlatformService, RandomMove, ServiceConfig, router,
};
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { config, host, port } => {
            let config = load_config(config.as_deref())?.with_bind(host, port);
            run_server(config).await
        }
        Command::Migrate { config } => {
            let config = load_config(config.as_deref())?;
            run_migrations(&config)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<ServiceConfig> {
    let config = ServiceConfig::load(path)?;
    Ok(config)
}

#[instrument(skip(config), fields(database_url = %config.database_url()))]
fn run_migrations(config: &ServiceConfig) -> Result<()> {
    let repository = GameRepository::new(config.database_url().clone())?;
    let applied = repository.run_migrations()?;
    info!(applied, "Database is up to date");
    Ok(())
}

#[instrument(skip(config), fields(bind = %config.bind_address()))]
async fn run_server(config: ServiceConfig) -> Result<()> {
    let repository = GameRepository::new(config.database_url().clone())?;
    repository.run_migrations()?;

    let ai: Arc<dyn AiService> = match config.ai_service_url() {
        Some(url) => {
            info!(url = %url, "Using remote AI service");
            Arc::new(HttpAiService::new(url.clone(), config.http_timeout())?)
        }
        None => {
            info!("Using local random AI");
            Arc::new(LocalAiService::new(Arc::new(RandomMove::new())))
        }
    };

    let platform: Arc<dyn PlatformService> = match config.platform_url() {
        Some(url) => {
            info!(url = %url, "Platform notifications enabled");
            Arc::new(HttpPlatformService::new(url.clone(), config.http_timeout())?)
        }
        None => {
            info!("Platform notifications disabled");
            Arc::new(DisabledPlatform)
        }
    };

    let service = GameService::new(repository, ai, platform, *config.default_ai_difficulty());
    let app = router(service);

    let listener = tokio::net::TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address()))?;
    info!("Server ready at http://{}/", config.bind_address());

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutting down");
        })
        .await?;

    Ok(())
}
