use std::sync::Arc;
use sqlx::sqlite::SqlitePoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use skybridge::{
    api,
    auth::{ClerkIdentity, IdentityProvider},
    config::Settings,
    payments::{PaymentGateway, XenditClient},
    service::ServiceContext,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skybridge=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let settings = Settings::new().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {}. Using defaults.", e);
        Settings::default()
    });

    tracing::info!("Starting Skybridge server on {}:{}", settings.server.host, settings.server.port);

    // Initialize database
    let db_pool = SqlitePoolOptions::new()
        .max_connections(settings.database.max_connections)
        .connect(&settings.database.url)
        .await?;

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await?;

    let identity: Arc<dyn IdentityProvider> = Arc::new(ClerkIdentity::new(&settings.auth)?);

    // Initialize the payment gateway if configured
    let gateway: Option<Arc<dyn PaymentGateway>> = if settings.payments.enabled {
        match XenditClient::new(&settings.payments) {
            Ok(client) => {
                tracing::info!("Invoice payments enabled ({})", settings.payments.currency);
                Some(Arc::new(client))
            }
            Err(e) => {
                tracing::warn!("Payments enabled but misconfigured: {}", e);
                None
            }
        }
    } else {
        tracing::info!("Invoice payments disabled");
        None
    };

    let service_context = Arc::new(ServiceContext::new(
        db_pool.clone(),
        identity,
        gateway,
        &settings,
    ));

    let app = api::create_app(service_context, Arc::new(settings.clone()))?;

    let listener = tokio::net::TcpListener::bind(
        format!("{}:{}", settings.server.host, settings.server.port)
    ).await?;

    tracing::info!("Server listening on http://{}:{}", settings.server.host, settings.server.port);

    axum::serve(listener, app).await?;

    Ok(())
}
