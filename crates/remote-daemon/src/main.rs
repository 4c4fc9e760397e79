mod backend;
mod core;
mod http;
mod image_cache;
mod proxy;

use std::sync::Arc;

use remote_proto::config::Config;
use remote_proto::platform;
use remote_proto::state::StateManager;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn print_banner(config: &Config) {
    let port = config.http.port;
    eprintln!();
    eprintln!("  pear-remote running");
    eprintln!("  Local:   http://localhost:{}", port);
    eprintln!("  Network: http://{}:{}", platform::lan_ip(), port);
    eprintln!("  Backend: {}", config.backend.base_url());
    eprintln!();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // File log for after-the-fact debugging, stderr for the console.
    let data_dir = platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = data_dir.join("daemon.log");

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(log_file)
        .with_ansi(false);
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,remote_daemon=debug")),
        )
        .init();

    info!("Log file: {:?}", log_path);

    let config = Config::load()?;
    info!("Config loaded from: {:?}", Config::config_path());

    let backend_url = config.backend.base_url();
    let backend = Arc::new(backend::BackendClient::new(backend_url.clone())?);
    let state_manager = Arc::new(StateManager::new());

    // Event channel: all polls and commands funnel into RemoteCore
    let (event_tx, event_rx) = tokio::sync::mpsc::channel::<core::RemoteEvent>(256);

    let remote_core = core::RemoteCore::new(
        config.polling.clone(),
        Arc::clone(&backend),
        Arc::clone(&state_manager),
        event_tx.clone(),
    );

    let images = image_cache::ImageCache::new(config.paths.image_cache_dir.clone(), reqwest::Client::new());
    info!("Image cache: {:?}", images.dir());

    let http_state = http::HttpState {
        state_manager: Arc::clone(&state_manager),
        event_tx: event_tx.clone(),
        backend,
        images: Arc::new(images),
        proxy: proxy::ProxyState::new(backend_url)?,
        max_results: config.search.max_results,
    };

    if !config.paths.web_root.exists() {
        warn!("Web root {:?} does not exist; only the API will be served", config.paths.web_root);
    }

    let _http_handle = http::start_server(
        config.http.bind_address.clone(),
        config.http.port,
        http_state,
        config.paths.web_root.clone(),
    );

    print_banner(&config);

    let shutdown_tx = event_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(core::RemoteEvent::Shutdown).await;
        }
    });
    drop(event_tx);

    info!("Remote initialised, running event loop");
    remote_core.run(event_rx).await?;

    Ok(())
}
