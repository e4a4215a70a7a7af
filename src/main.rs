use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use recipe_box::{config::Config, db, routes, state::AppState, store::SqlStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "recipe_box=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;

    let pool = db::init_db(&config.database_url, config.max_db_connections).await?;
    tracing::info!("Database initialized");

    let state = AppState::new(
        SqlStore::new(pool),
        &config.secret_key,
        config.comments_stale_after,
        config.comments_cache_time,
    );
    let app = routes::app(state);

    tracing::info!("Server running on http://{}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
