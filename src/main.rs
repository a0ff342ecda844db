//! Traefik Manager
//!
//! Manages a Traefik gateway's dynamic configuration through a REST API and
//! serves it back to the gateway through the HTTP provider endpoint.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────────┐
//!                         │                 TRAEFIK MANAGER                   │
//!                         │                                                   │
//!   Operator / CLI        │  ┌─────────┐    ┌─────────┐    ┌──────────────┐  │
//!   ──────────────────────┼─▶│  http   │───▶│   api   │───▶│    store     │  │
//!                         │  │ layers  │    │handlers │    │ (RwLock +    │  │
//!                         │  └────┬────┘    └─────────┘    │  ref index)  │  │
//!                         │       │                        └──┬────────┬──┘  │
//!                         │       │         ┌──────────┐      │        │     │
//!   Traefik (poll)        │       └────────▶│ provider │◀─────┘        │     │
//!   ◀─────────────────────┼─────────────────│projection│      save signal    │
//!                         │                 └──────────┘               ▼     │
//!                         │                                   ┌──────────────┐│
//!                         │                                   │   storage    ││──▶ snapshot.json
//!                         │                                   │  persister   ││
//!                         │                                   └──────────────┘│
//!                         └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use traefik_manager::config::{load_config, ConfigError};
use traefik_manager::http::HttpServer;
use traefik_manager::lifecycle::{shutdown_on_signal, Shutdown};
use traefik_manager::observability::init_logging;
use traefik_manager::storage::{load_store, save_channel, SavePersister};

#[derive(Parser)]
#[command(name = "traefik-manager", version)]
#[command(about = "Control plane and HTTP provider for a Traefik gateway", long_about = None)]
struct Args {
    /// TOML configuration file. Environment variables override its values.
    #[arg(short, long, env = "MANAGER_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(ConfigError::Validation(errors)) => {
            eprintln!("Invalid configuration:");
            for error in &errors {
                eprintln!("  - {error}");
            }
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config.logging)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "traefik-manager starting");

    tracing::info!(
        bind_address = %config.server.bind_address(),
        base_path = %config.server.base_path,
        provider_path = %config.provider.path,
        api_auth = config.auth.enabled,
        provider_auth = config.provider.auth.enabled,
        "Configuration loaded"
    );

    // Load the snapshot and wire the store to the persister
    let (signal, requests) = save_channel();
    let store = Arc::new(load_store(&config.storage.file_path)?.with_save_signal(signal));
    store.read(|doc| {
        tracing::info!(
            path = %config.storage.file_path.display(),
            routers = doc.routers.len(),
            services = doc.services.len(),
            middlewares = doc.middlewares.len(),
            "Store loaded"
        );
    });

    let shutdown = Shutdown::new();
    let persister = SavePersister::new(
        store.clone(),
        config.storage.file_path.clone(),
        config.storage.save_interval,
    );
    let persister = tokio::spawn(persister.run(requests, shutdown.subscribe()));

    let server = HttpServer::new(&config, store)?;
    let listener = TcpListener::bind(config.server.bind_address()).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    tokio::spawn(shutdown_on_signal(shutdown.clone()));

    let served = server.run(listener, shutdown.clone()).await;

    // Also reaches the persister when the server exited with an error
    shutdown.trigger();
    persister.await??;
    served?;

    tracing::info!("Shutdown complete");
    Ok(())
}
