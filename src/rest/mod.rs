use std::{net::SocketAddr, sync::Arc};

use axum::{
    http::StatusCode,
    middleware,
    routing::get,
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

use crate::{
    auth::{require_auth, TokenKeys},
    service::{Envelope, ServiceError, Services},
};

mod auth;
mod categories;
mod error;
mod handlers;
mod ingredients;
mod models;
mod recipe_ingredients;
mod recipes;
mod reviews;
mod roles;
mod users;

pub use error::{JsonBody, PathParams, QueryParams};
pub use models::{LimitQuery, PageQuery};

#[derive(Clone)]
pub struct AppState {
    pub services: Arc<Services>,
    pub keys: TokenKeys,
    pub started_at: std::time::SystemTime,
}

impl AppState {
    pub fn new(services: Services, keys: TokenKeys) -> Self {
        Self {
            services: Arc::new(services),
            keys,
            started_at: std::time::SystemTime::now(),
        }
    }
}

/// Envelope-wrapped handler result.
pub type ApiResult<T> = Result<Json<Envelope<T>>, ServiceError>;

/// Like [`ApiResult`] but answered with `201 Created`.
pub type Created<T> = Result<(StatusCode, Json<Envelope<T>>), ServiceError>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .merge(auth::routes())
        .merge(users::routes())
        .merge(roles::routes())
        .merge(categories::routes())
        .merge(ingredients::routes())
        .merge(recipes::routes())
        .merge(recipe_ingredients::routes())
        .merge(reviews::routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .fallback(handlers::not_found)
        .layer(middleware::map_response(handlers::method_not_allowed))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(::tracing::Level::INFO))
                .on_response(DefaultOnResponse::new().level(::tracing::Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(
    addr: SocketAddr,
    state: AppState,
    shutdown: tokio_util::sync::CancellationToken,
) -> anyhow::Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("🌐 REST listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            log::info!("🛑 REST shutdown requested");
        })
        .await?;
    log::info!("👋 REST server exited");
    Ok(())
}
