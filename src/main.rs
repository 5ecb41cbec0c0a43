//! Kanso Commerce - self-hosted e-commerce order backend.

use std::sync::Arc;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kanso_commerce::auth::AuthTokens;
use kanso_commerce::config::AppConfig;
use kanso_commerce::events::EventPublisher;
use kanso_commerce::http;
use kanso_commerce::invoice::InvoiceAssets;
use kanso_commerce::service::orders::InvoiceConfig;
use kanso_commerce::service::{CartService, CatalogService, OrderService};
use kanso_commerce::store::{PgCartStore, PgOrderStore, PgProductStore};
use kanso_commerce::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Startup is strictly sequenced: no request is served until the pool is
    // connected and migrations have run; any failure here exits the process.
    let config = AppConfig::from_env()?;
    let db = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&db).await?;

    let nats = match &config.nats_url {
        Some(url) => match async_nats::connect(url).await {
            Ok(client) => Some(client),
            Err(err) => {
                tracing::warn!(error = %err, "NATS unavailable, events disabled");
                None
            }
        },
        None => None,
    };

    let order_store = Arc::new(PgOrderStore::new(db.clone()));
    let product_store = Arc::new(PgProductStore::new(db.clone()));
    let cart_store = Arc::new(PgCartStore::new(db));

    let orders = Arc::new(OrderService::new(
        order_store,
        product_store.clone(),
        EventPublisher::new(nats),
        InvoiceConfig {
            staging_dir: config.invoice_dir.clone(),
            assets: InvoiceAssets {
                font_path: config.invoice_font.clone(),
                logo_path: config.invoice_logo.clone(),
            },
        },
    ));
    let catalog = Arc::new(CatalogService::new(product_store.clone()));
    let cart = Arc::new(CartService::new(cart_store, product_store));

    let state = AppState {
        orders,
        catalog,
        cart,
        tokens: AuthTokens::new(&config.auth_secret),
    };
    let app = http::router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("🚀 kanso-commerce listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
