use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use daybook_api::{router, AppState, EndpointResolver, NgrokAgentTunnel, ServerConfig};
use daybook_core::defaults::TUNNEL_NAME;
use daybook_inference::OpenAIBackend;
use daybook_storage::{AssetStore, FilesystemBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
    //   RUST_LOG    - standard env filter
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "daybook_api=debug,daybook_inference=debug,daybook_storage=debug,tower_http=debug".into()
    });

    let registry = tracing_subscriber::registry().with(env_filter);

    // Optionally create a file appender with daily rotation
    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("daybook-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false)); // no ANSI in files by default
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    let config = ServerConfig::from_env()?;
    info!(
        subsystem = "api",
        upload_dir = %config.upload_dir.display(),
        public_dir = ?config.public_dir,
        tunnel_enabled = config.tunnel_enabled,
        static_url = config.public_base_url.is_some(),
        "Configuration loaded"
    );

    let store = Arc::new(AssetStore::new(FilesystemBackend::new(&config.upload_dir)));
    let backend = Arc::new(OpenAIBackend::from_env()?);

    let mut resolver = EndpointResolver::new(config.port);
    if let Some(url) = &config.public_base_url {
        resolver = resolver.with_static_url(url.clone());
    } else if config.tunnel_enabled {
        let timeout = Duration::from_secs(config.tunnel_timeout_secs);
        let tunnel = NgrokAgentTunnel::new(&config.tunnel_api_url, TUNNEL_NAME, timeout)?;
        resolver = resolver.with_tunnel(Arc::new(tunnel), timeout);
    } else {
        warn!(subsystem = "endpoint", "No public base URL and tunnel disabled; uploads will only be reachable locally");
    }
    let endpoint = Arc::new(resolver);

    let state = AppState {
        store,
        endpoint: endpoint.clone(),
        backend,
    };
    let app = router(state, &config);

    // Bind before resolving so a tunnel has something to forward to
    let addr: SocketAddr = config.bind_addr().parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Starting server on {}", addr);

    tokio::spawn(async move {
        match endpoint.resolve().await {
            Ok(resolved) => info!(
                subsystem = "endpoint",
                base_url = %resolved.base_url,
                source = resolved.source.as_str(),
                "Public endpoint ready"
            ),
            Err(e) => warn!(subsystem = "endpoint", error = %e, "Endpoint resolution failed"),
        }
    });

    axum::serve(listener, app).await?;

    Ok(())
}
