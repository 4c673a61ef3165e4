use axum::{extract::State, http::StatusCode, routing::get, Json, Router};

use crate::{
    auth::AuthUser,
    service::{CategoryInput, CrudService, DeleteCheck, Deleted},
    storage::{Category, CategoryWithCount},
};

use super::{ApiResult, AppState, Created, JsonBody, LimitQuery, PathParams, QueryParams};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list).post(create))
        .route("/categories/with-count", get(with_count))
        .route("/categories/ordered", get(ordered))
        .route("/categories/popular", get(popular))
        .route("/categories/search/:term", get(search))
        .route("/categories/name/:name", get(by_name))
        .route("/categories/can-delete/:id", get(can_delete))
        .route("/categories/:id", get(show).put(update).delete(remove))
}

async fn list(State(state): State<AppState>) -> ApiResult<Vec<Category>> {
    Ok(Json(state.services.categories.get_all()?))
}

async fn create(
    State(state): State<AppState>,
    caller: AuthUser,
    JsonBody(input): JsonBody<CategoryInput>,
) -> Created<Category> {
    caller.require_admin()?;
    Ok((StatusCode::CREATED, Json(state.services.categories.add(input)?)))
}

async fn show(State(state): State<AppState>, PathParams(id): PathParams<i64>) -> ApiResult<Category> {
    Ok(Json(state.services.categories.get_by_id(id)?))
}

async fn update(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParams(id): PathParams<i64>,
    JsonBody(input): JsonBody<CategoryInput>,
) -> ApiResult<Category> {
    caller.require_admin()?;
    Ok(Json(state.services.categories.update(id, input)?))
}

async fn remove(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParams(id): PathParams<i64>,
) -> ApiResult<Deleted> {
    caller.require_admin()?;
    Ok(Json(state.services.categories.delete(id)?))
}

async fn with_count(State(state): State<AppState>) -> ApiResult<Vec<CategoryWithCount>> {
    Ok(Json(state.services.categories.get_all_with_recipe_count()?))
}

async fn ordered(State(state): State<AppState>) -> ApiResult<Vec<Category>> {
    Ok(Json(state.services.categories.get_all_ordered()?))
}

async fn popular(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<LimitQuery>,
) -> ApiResult<Vec<CategoryWithCount>> {
    Ok(Json(state.services.categories.popular(query.limit())?))
}

async fn search(
    State(state): State<AppState>,
    PathParams(term): PathParams<String>,
) -> ApiResult<Vec<Category>> {
    Ok(Json(state.services.categories.search(&term)?))
}

async fn by_name(
    State(state): State<AppState>,
    PathParams(name): PathParams<String>,
) -> ApiResult<Category> {
    Ok(Json(state.services.categories.get_by_name(&name)?))
}

async fn can_delete(
    State(state): State<AppState>,
    PathParams(id): PathParams<i64>,
) -> ApiResult<DeleteCheck> {
    Ok(Json(state.services.categories.can_delete(id)?))
}
