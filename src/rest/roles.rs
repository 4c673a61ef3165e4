use axum::{extract::State, http::StatusCode, routing::get, Json, Router};

use crate::{
    auth::AuthUser,
    service::{CrudService, Deleted, Exists, RoleInput},
    storage::{Role, User},
};

use super::{ApiResult, AppState, Created, JsonBody, PathParams};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/roles", get(list).post(create))
        .route("/roles/ordered", get(ordered))
        .route("/roles/name/:name", get(by_name))
        .route("/roles/exists/:name", get(exists))
        .route("/roles/:id", get(show).put(update).delete(remove))
        .route("/roles/:id/users", get(users))
}

async fn list(State(state): State<AppState>) -> ApiResult<Vec<Role>> {
    Ok(Json(state.services.roles.get_all()?))
}

async fn create(
    State(state): State<AppState>,
    caller: AuthUser,
    JsonBody(input): JsonBody<RoleInput>,
) -> Created<Role> {
    caller.require_admin()?;
    Ok((StatusCode::CREATED, Json(state.services.roles.add(input)?)))
}

async fn show(State(state): State<AppState>, PathParams(id): PathParams<i64>) -> ApiResult<Role> {
    Ok(Json(state.services.roles.get_by_id(id)?))
}

async fn update(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParams(id): PathParams<i64>,
    JsonBody(input): JsonBody<RoleInput>,
) -> ApiResult<Role> {
    caller.require_admin()?;
    Ok(Json(state.services.roles.update(id, input)?))
}

async fn remove(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParams(id): PathParams<i64>,
) -> ApiResult<Deleted> {
    caller.require_admin()?;
    Ok(Json(state.services.roles.delete(id)?))
}

async fn ordered(State(state): State<AppState>) -> ApiResult<Vec<Role>> {
    Ok(Json(state.services.roles.get_all_ordered()?))
}

async fn by_name(
    State(state): State<AppState>,
    PathParams(name): PathParams<String>,
) -> ApiResult<Role> {
    Ok(Json(state.services.roles.get_by_name(&name)?))
}

async fn exists(
    State(state): State<AppState>,
    PathParams(name): PathParams<String>,
) -> ApiResult<Exists> {
    Ok(Json(state.services.roles.exists_by_name(&name)?))
}

async fn users(State(state): State<AppState>, PathParams(id): PathParams<i64>) -> ApiResult<Vec<User>> {
    Ok(Json(state.services.roles.list_users(id)?))
}
