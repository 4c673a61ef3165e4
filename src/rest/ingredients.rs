use axum::{extract::State, http::StatusCode, routing::get, Json, Router};

use crate::{
    auth::AuthUser,
    service::{CrudService, DeleteCheck, Deleted, IngredientInput},
    storage::{Ingredient, IngredientUse, IngredientWithUsage},
};

use super::{ApiResult, AppState, Created, JsonBody, LimitQuery, PathParams, QueryParams};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ingredients", get(list).post(create))
        .route("/ingredients/with-usage", get(with_usage))
        .route("/ingredients/most-used", get(most_used))
        .route("/ingredients/search/:term", get(search))
        .route("/ingredients/name/:name", get(by_name))
        .route("/ingredients/can-delete/:id", get(can_delete))
        .route("/ingredients/:id", get(show).put(update).delete(remove))
        .route("/ingredients/:id/recipes", get(recipes))
}

async fn list(State(state): State<AppState>) -> ApiResult<Vec<Ingredient>> {
    Ok(Json(state.services.ingredients.get_all()?))
}

async fn create(
    State(state): State<AppState>,
    caller: AuthUser,
    JsonBody(input): JsonBody<IngredientInput>,
) -> Created<Ingredient> {
    caller.require_admin()?;
    Ok((StatusCode::CREATED, Json(state.services.ingredients.add(input)?)))
}

async fn show(
    State(state): State<AppState>,
    PathParams(id): PathParams<i64>,
) -> ApiResult<Ingredient> {
    Ok(Json(state.services.ingredients.get_by_id(id)?))
}

async fn update(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParams(id): PathParams<i64>,
    JsonBody(input): JsonBody<IngredientInput>,
) -> ApiResult<Ingredient> {
    caller.require_admin()?;
    Ok(Json(state.services.ingredients.update(id, input)?))
}

async fn remove(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParams(id): PathParams<i64>,
) -> ApiResult<Deleted> {
    caller.require_admin()?;
    Ok(Json(state.services.ingredients.delete(id)?))
}

async fn with_usage(State(state): State<AppState>) -> ApiResult<Vec<IngredientWithUsage>> {
    Ok(Json(state.services.ingredients.get_all_with_usage_count()?))
}

async fn most_used(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<LimitQuery>,
) -> ApiResult<Vec<IngredientWithUsage>> {
    Ok(Json(state.services.ingredients.most_used(query.limit())?))
}

async fn search(
    State(state): State<AppState>,
    PathParams(term): PathParams<String>,
) -> ApiResult<Vec<Ingredient>> {
    Ok(Json(state.services.ingredients.search(&term)?))
}

async fn by_name(
    State(state): State<AppState>,
    PathParams(name): PathParams<String>,
) -> ApiResult<Ingredient> {
    Ok(Json(state.services.ingredients.get_by_name(&name)?))
}

async fn can_delete(
    State(state): State<AppState>,
    PathParams(id): PathParams<i64>,
) -> ApiResult<DeleteCheck> {
    Ok(Json(state.services.ingredients.can_delete(id)?))
}

async fn recipes(
    State(state): State<AppState>,
    PathParams(id): PathParams<i64>,
) -> ApiResult<Vec<IngredientUse>> {
    Ok(Json(state.services.ingredients.recipes_using(id)?))
}
