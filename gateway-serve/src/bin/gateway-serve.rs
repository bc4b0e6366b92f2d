//! Process entrypoint: load config, build `AppState`, serve until SIGINT/SIGTERM.

use std::path::PathBuf;

use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt::init();

    config::load_dotenv(None).ok();

    let config_path = std::env::var("GATEWAY_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./config.yaml"));
    let gateway_config = config::load_gateway_config(&config_path)?;

    let domains_path = std::env::var("GATEWAY_DOMAINS_CONFIG").map(PathBuf::from).ok();
    let domains = match domains_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)?;
            serde_yaml::from_str(&content)?
        }
        None => config::ConfigDomains::default(),
    };

    let bind_addr = gateway_config.server.bind_addr.clone();
    let cancel = CancellationToken::new();
    let state = gateway_serve::build_app_state(gateway_config, domains, cancel.clone());

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = sigterm.recv() => {},
        }
        info!("shutdown signal received");
        shutdown.cancel();
    });

    gateway_serve::run_serve(&bind_addr, state, cancel).await
}
