use anyhow::Context;
use escola::logging::init_tracing;
use escola::metrics::{init_metrics, metrics_app};
use escola::router::init_router;
use escola::state::AppState;
use escola_config::{DatabaseConfig, ServerConfig, load_dotenv};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();
    let server = ServerConfig::from_env();

    let _guards = init_tracing(&server.log_dir).context("failed to initialise logging")?;

    let db_config = DatabaseConfig::from_env().context("DATABASE_URL must be set")?;
    let pool = escola_db::init_db_pool(&db_config)
        .await
        .context("failed to connect to database")?;

    if db_config.run_migrations {
        escola_db::run_migrations(&pool)
            .await
            .context("failed to run migrations")?;
        info!("Database migrations applied");
    }

    if let Some(handle) = init_metrics(server.observability_enabled)? {
        let address = server.metrics_address();
        let listener = tokio::net::TcpListener::bind(&address)
            .await
            .with_context(|| format!("failed to bind metrics listener on {address}"))?;
        info!(%address, "Metrics available at /metrics");
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, metrics_app(handle)).await {
                warn!(error = %e, "Metrics server stopped");
            }
        });
    }

    let state = AppState::from_env(pool);
    if !state.email_config.enabled {
        warn!("SMTP is not configured; temporary passwords will be returned in API responses");
    }
    let app = init_router(state);

    let address = server.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

    info!(%address, "Server running");
    info!("Swagger UI available at http://{address}/swagger-ui");
    info!("Scalar UI available at http://{address}/scalar");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
