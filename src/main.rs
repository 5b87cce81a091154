use std::sync::Arc;

use sqlx::sqlite::SqlitePoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gymbook::{
    api::{self, state::AppState},
    config::Settings,
    mailer::{LogMailer, Mailer, SmtpMailer},
    service::ServiceContext,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gymbook=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let settings = Settings::new().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {}. Using defaults.", e);
        Settings::default()
    });

    tracing::info!(
        "Starting GymBook server on {}:{}",
        settings.server.host,
        settings.server.port
    );

    // Initialize database
    let db_pool = SqlitePoolOptions::new()
        .max_connections(settings.database.max_connections)
        .connect(&settings.database.url)
        .await?;

    // Run migrations
    sqlx::migrate!("./migrations").run(&db_pool).await?;

    // Pick the mail transport
    let mailer: Arc<dyn Mailer> = if settings.smtp.enabled {
        tracing::info!("SMTP delivery enabled");
        Arc::new(SmtpMailer::from_config(&settings.smtp)?)
    } else {
        tracing::info!("SMTP delivery disabled; OTP emails will be logged only");
        Arc::new(LogMailer)
    };

    if settings.gateway.secret.is_none() {
        tracing::warn!("No gateway secret configured; signature-bearing confirmations will be rejected");
    }

    // Create service context
    let service_context = Arc::new(ServiceContext::new(db_pool.clone(), &settings, mailer));

    let app_state = AppState::new(service_context, Arc::new(settings.clone()));
    let app = api::create_app(app_state);

    let listener = tokio::net::TcpListener::bind(format!(
        "{}:{}",
        settings.server.host, settings.server.port
    ))
    .await?;

    tracing::info!(
        "Server listening on http://{}:{}",
        settings.server.host,
        settings.server.port
    );

    axum::serve(listener, app).await?;

    Ok(())
}
