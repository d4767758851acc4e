mod app;
mod assets;
mod config;
mod proxy;

use proxy::TraceBackend;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gemini_dash_ui=info,gemini_dash=info".parse().unwrap()),
        )
        .init();

    let cwd = std::env::current_dir().unwrap_or_default();
    let cfg = config::load_config(&cwd);

    let traces = TraceBackend::new(&cfg.dashboard.trace_backend_url)?;
    let state = app::AppState::new(cfg.collector.clone(), traces);
    let app = app::router(state);

    let addr = format!("{}:{}", cfg.dashboard.bind, cfg.dashboard.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!("gemini-dash-ui listening on {local_addr}");
    tracing::info!(
        "proxying traces from {}",
        cfg.dashboard.trace_backend_url
    );
    tracing::info!("open http://{local_addr} in your browser");

    axum::serve(listener, app).await?;
    Ok(())
}
