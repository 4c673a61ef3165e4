use axum::{extract::State, http::StatusCode, routing::post, Json, Router};

use crate::{
    service::{LoginData, LoginInput, RegisterInput},
    storage::User,
};

use super::{ApiResult, AppState, Created, JsonBody};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

async fn register(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<RegisterInput>,
) -> Created<User> {
    let envelope = state.services.auth.register(input)?;
    Ok((StatusCode::CREATED, Json(envelope)))
}

async fn login(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<LoginInput>,
) -> ApiResult<LoginData> {
    Ok(Json(state.services.auth.login(input)?))
}
