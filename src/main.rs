mod builder;
mod config;
mod db;
mod routes;
mod services;
mod state;

use std::sync::Arc;

use services::page::PgPageStore;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = config::Config::from_env().expect("invalid configuration");

    let pool = db::init_pool(&config.database_url, config.db_max_connections)
        .await
        .expect("database init failed");

    if config.mailer.is_none() {
        tracing::warn!("RESEND_API_KEY not set, email sign-in disabled");
    }

    let pages = Arc::new(PgPageStore::new(pool.clone()));
    let state = state::AppState::new(pool, pages, config.mailer, config.cookie_secure);

    // Spawn background sweeper for idle editing sessions.
    let _sweeper = services::editor::spawn_idle_sweeper(state.clone(), config.editor_idle);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .expect("failed to bind");

    tracing::info!(port = config.port, "landkit listening");
    axum::serve(listener, app).await.expect("server failed");
}
