use lap_predictor::{config::ServerConfig, server, LapTimePredictor};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cfg = ServerConfig::from_env()?;

    let predictor = match cfg.seed {
        Some(seed) => {
            tracing::info!("seeding predictor with {}", seed);
            LapTimePredictor::seeded(seed)
        }
        None => LapTimePredictor::from_entropy(),
    };

    let app = server::router(server::AppState::new(predictor, cfg.log_predictions));

    tracing::info!("listening on {}", cfg.bind_addr);
    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
