use recommendit_api::config::Config;
use recommendit_api::routes::create_router;
use recommendit_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "recommendit_api=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;
    let addr = format!("{}:{}", config.host, config.port);

    let state = AppState::new(config)?;
    let report = state.initialize().await?;
    tracing::info!(
        base_rows = report.base_rows,
        appended = report.appended,
        synthesized = report.synthesized,
        orphans_dropped = report.orphans_dropped,
        "Catalog synchronized"
    );

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Server started");
    axum::serve(listener, app).await?;

    Ok(())
}
