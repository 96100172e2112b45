//! Newspaper Agency - newsroom management server

use anyhow::Result;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use newspaper_agency::{
    api::{self, AppState},
    config::Config,
    db::{self, repositories::SqlxSessionRepository},
    services::SessionService,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "newspaper_agency=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Newspaper Agency...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    let sessions = SessionService::with_expiration(
        SqlxSessionRepository::boxed(pool.clone()),
        config.session.expiration_days,
    );
    let purged = sessions.purge_expired().await?;
    tracing::info!("Purged {} expired sessions", purged);

    // Demo mode: Create default redactor if not exists
    #[cfg(feature = "demo")]
    {
        use newspaper_agency::db::repositories::SqlxRedactorRepository;
        use newspaper_agency::services::{RedactorService, RegisterInput};

        let redactors = RedactorService::new(SqlxRedactorRepository::boxed(pool.clone()));
        let exists = redactors
            .list_all()
            .await?
            .iter()
            .any(|r| r.username == "demo");
        if !exists {
            tracing::info!("Demo mode: Creating default redactor (demo/demo12345)");
            redactors
                .register(RegisterInput::new("demo", "demo12345"))
                .await?;
        }
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);

    // Build application state and router
    let state = AppState::new(pool, config)?;
    let app = api::build_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
