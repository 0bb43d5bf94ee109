// Blog Server - serves the blog platform over HTTP

use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use blog_platform::{
    app_state::AppState,
    blog_interface::create_blog_router,
    config::Config,
    data_seeder::seed_sample_data,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize application state
    let app_state = AppState::new(config.clone()).await?;

    if config.seed_sample_data {
        let summary = seed_sample_data(app_state.store.as_ref()).await?;
        info!(
            "Seeded {} users, {} groups, {} posts",
            summary.users, summary.groups, summary.posts
        );
    }

    let app = create_blog_router(app_state).layer(CorsLayer::permissive());

    let addr = config.server_address();
    info!("Blog server starting on http://{}", addr);
    info!("Media served from {}", config.media.root.display());

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
