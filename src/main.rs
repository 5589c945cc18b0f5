use anyhow::{Context, Result};
use clap::Parser;
use sauti_captions::config::SinkBackend;
use sauti_captions::{
    create_router, AppState, CaptionSink, Config, MemoryCaptionSink, NatsCaptionSink, NatsClient,
    NatsRecognizer, Recognizer, ServiceInfo,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(version, about = "Live classroom captioning relay")]
struct Args {
    /// Config file path (extension optional)
    #[arg(long, default_value = "config/sauti-captions")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("Sauti Captions v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);
    info!("Project: {} ({})", cfg.service.project_id, cfg.service.region);

    // Resolved once; every session uses this exact handshake
    let session_config = cfg.session_config()?;
    info!(
        "Recognizer: model={} languages={:?}",
        session_config.recognizer.model, session_config.recognizer.languages
    );

    let nats = NatsClient::connect(&cfg.nats.url).await?;

    let sink: Arc<dyn CaptionSink> = match cfg.sink.backend {
        SinkBackend::Nats => Arc::new(
            NatsCaptionSink::connect(nats.inner(), &cfg.sink.bucket)
                .await
                .context("Failed to initialize caption sink")?,
        ),
        SinkBackend::Memory => {
            warn!("Using in-memory caption sink; captions are not shared with listeners");
            Arc::new(MemoryCaptionSink::new())
        }
    };

    let recognizer: Arc<dyn Recognizer> = Arc::new(NatsRecognizer::new(nats.clone()));

    let state = AppState::new(
        recognizer,
        sink,
        session_config,
        ServiceInfo {
            name: cfg.service.name.clone(),
            project_id: cfg.service.project_id.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
    );

    let origins = cfg.allowed_origins_list();
    info!("Allowed origins: {:?}", origins);

    let app = create_router(state, &origins);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);
    info!("WebSocket endpoint: /ws/transcribe/{{session_id}}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Sauti Captions shutting down");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
