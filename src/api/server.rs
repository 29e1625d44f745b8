use anyhow::Context;
use axum::{routing::get, Router};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::users;
use crate::config::Config;
use crate::db::repo::{create_users_table, UsersRepository};

#[derive(Clone)]
pub struct AppState {
    pub users: UsersRepository,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn connect(config: &Config) -> anyhow::Result<SqlitePool> {
    let mut options = SqlitePoolOptions::new().max_connections(config.pool_size());
    if config.is_in_memory() {
        // The database lives only as long as its single connection.
        options = options.min_connections(1).idle_timeout(None).max_lifetime(None);
    }

    options
        .connect(&config.database_url)
        .await
        .with_context(|| format!("failed to connect to {}", config.database_url))
}

pub async fn start_server(config: &Config) -> anyhow::Result<()> {
    let pool = connect(config).await?;
    create_users_table(&pool)
        .await
        .context("failed to prepare users table")?;

    let state = Arc::new(AppState {
        users: UsersRepository::new(pool, config.query_timeout()),
    });

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind))?;

    tracing::info!(addr = %config.bind, "server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server failed")
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
