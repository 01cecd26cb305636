mod config;
mod naming;
mod render;
mod routes;
mod session;
mod state;
mod templates;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "certigen=info,tower_http=info".into()),
        )
        .init();

    let config = config::Config::from_env()?;
    if config.admin_password_is_default {
        tracing::warn!(
            "ADMIN_PASSWORD is not set; using the insecure default \"{}\". \
             Do not expose this instance without setting ADMIN_PASSWORD.",
            config::DEFAULT_ADMIN_PASSWORD
        );
    }
    let config = Arc::new(config);

    let state = Arc::new(state::AppState {
        config: config.clone(),
        sessions: session::SessionStore::new(),
    });

    let app = Router::new()
        .route("/", get(routes::index))
        .route("/generate", post(routes::generate))
        .route("/admin", get(routes::admin))
        .route("/admin/login", post(routes::login))
        .route("/admin/logout", post(routes::logout))
        .route("/admin/template", post(routes::upload_template))
        .route("/admin/template/remove", post(routes::remove_template))
        .route("/admin/font", post(routes::upload_font))
        .route("/admin/settings", post(routes::save_settings))
        .route("/admin/reset", post(routes::reset_settings))
        .route("/download/png", get(routes::download_png))
        .route("/download/pdf", get(routes::download_pdf))
        .route("/download/all", get(routes::download_all))
        .route("/preview.png", get(routes::preview_png))
        .route("/template.png", get(routes::template_png))
        .route("/api/session", get(routes::session_status))
        // Templates are full-resolution images; axum's 2 MB default is too
        // tight for them.
        .layer(DefaultBodyLimit::max(32 * 1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("certigen listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
