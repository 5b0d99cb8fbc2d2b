// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Prompt Marketplace Contributors

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use prompt_marketplace_server::{
    api::router,
    chain::{ChainClient, PaymentLedger},
    config::AppConfig,
    registry::{durable::RedbRegistry, memory::InMemoryRegistry, MarketStore},
    state::AppState,
};

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    let registry = tracing_subscriber::registry().with(env_filter);
    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        registry
            .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}

#[tokio::main]
async fn main() {
    init_tracing();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "configuration error");
            std::process::exit(1);
        }
    };

    let store: Arc<dyn MarketStore> = match &config.data_dir {
        Some(dir) => {
            let path = dir.join("marketplace.redb");
            tracing::info!(path = %path.display(), "using durable registry");
            match RedbRegistry::open(&path) {
                Ok(registry) => Arc::new(registry),
                Err(e) => {
                    tracing::error!(error = %e, "failed to open registry database");
                    std::process::exit(1);
                }
            }
        }
        None => {
            tracing::info!("no DATA_DIR configured, using in-memory registry");
            Arc::new(InMemoryRegistry::new())
        }
    };

    let ledger = match &config.rpc_url {
        Some(rpc_url) => {
            tracing::info!(rpc = %rpc_url, "payment verification enabled");
            PaymentLedger::Chain(ChainClient::new(rpc_url))
        }
        None => {
            tracing::warn!("no RPC_URL configured, payment references are not verified");
            PaymentLedger::Trusting
        }
    };

    let state = AppState::new(&config, store, ledger);
    let app = router(state);

    let addr: SocketAddr = match format!("{}:{}", config.host, config.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!(error = %e, "invalid bind address");
            std::process::exit(1);
        }
    };

    tracing::info!("Prompt Marketplace server listening on http://{addr} (docs at /docs)");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, "failed to bind {addr}");
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "server error");
    }
}
