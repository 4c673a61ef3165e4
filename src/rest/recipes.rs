use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::{
    auth::AuthUser,
    service::{CrudService, DeleteCheck, Deleted, RecipeInput, RecipeWithIngredientsInput, ServiceError},
    storage::{Recipe, RecipeDetails, RecipeSummary},
};

use super::{ApiResult, AppState, Created, JsonBody, LimitQuery, PathParams, QueryParams};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list).post(create))
        .route("/recipes/with-ingredients", post(create_with_ingredients))
        .route("/recipes/details", get(list_with_details))
        .route("/recipes/user/:user_id", get(by_user))
        .route("/recipes/category/:category_id", get(by_category))
        .route("/recipes/search/:term", get(search))
        .route("/recipes/top-rated", get(top_rated))
        .route("/recipes/recent", get(recent))
        .route("/recipes/can-delete/:id", get(can_delete))
        .route("/recipes/:id", get(show).put(update).delete(remove))
        .route("/recipes/:id/details", get(show_with_details))
}

/// Fills in the author from the token; only admins may post for someone else.
fn claim_author(caller: &AuthUser, input: &mut RecipeInput) -> Result<(), ServiceError> {
    match input.user_id {
        None => input.user_id = Some(caller.id()),
        Some(user_id) if user_id != caller.id() => caller.require_admin()?,
        Some(_) => {}
    }
    Ok(())
}

async fn list(State(state): State<AppState>) -> ApiResult<Vec<Recipe>> {
    Ok(Json(state.services.recipes.get_all()?))
}

async fn create(
    State(state): State<AppState>,
    caller: AuthUser,
    JsonBody(mut input): JsonBody<RecipeInput>,
) -> Created<Recipe> {
    claim_author(&caller, &mut input)?;
    Ok((StatusCode::CREATED, Json(state.services.recipes.add(input)?)))
}

async fn create_with_ingredients(
    State(state): State<AppState>,
    caller: AuthUser,
    JsonBody(mut input): JsonBody<RecipeWithIngredientsInput>,
) -> Created<RecipeDetails> {
    claim_author(&caller, &mut input.recipe)?;
    let envelope = state.services.recipes.create_with_ingredients(input)?;
    Ok((StatusCode::CREATED, Json(envelope)))
}

async fn show(State(state): State<AppState>, PathParams(id): PathParams<i64>) -> ApiResult<Recipe> {
    Ok(Json(state.services.recipes.get_by_id(id)?))
}

async fn update(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParams(id): PathParams<i64>,
    JsonBody(input): JsonBody<RecipeInput>,
) -> ApiResult<Recipe> {
    let recipes = &state.services.recipes;
    caller.require_owner_or_admin(recipes.owner_id(id)?)?;
    if input.user_id.is_some_and(|user_id| user_id != caller.id()) {
        caller.require_admin()?;
    }
    Ok(Json(recipes.update(id, input)?))
}

async fn remove(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParams(id): PathParams<i64>,
) -> ApiResult<Deleted> {
    let recipes = &state.services.recipes;
    caller.require_owner_or_admin(recipes.owner_id(id)?)?;
    Ok(Json(recipes.delete(id)?))
}

async fn show_with_details(
    State(state): State<AppState>,
    PathParams(id): PathParams<i64>,
) -> ApiResult<RecipeDetails> {
    Ok(Json(state.services.recipes.get_with_details(id)?))
}

async fn list_with_details(State(state): State<AppState>) -> ApiResult<Vec<RecipeSummary>> {
    Ok(Json(state.services.recipes.get_all_with_details()?))
}

async fn by_user(
    State(state): State<AppState>,
    PathParams(user_id): PathParams<i64>,
) -> ApiResult<Vec<RecipeSummary>> {
    Ok(Json(state.services.recipes.get_by_user(user_id)?))
}

async fn by_category(
    State(state): State<AppState>,
    PathParams(category_id): PathParams<i64>,
) -> ApiResult<Vec<RecipeSummary>> {
    Ok(Json(state.services.recipes.get_by_category(category_id)?))
}

async fn search(
    State(state): State<AppState>,
    PathParams(term): PathParams<String>,
) -> ApiResult<Vec<RecipeSummary>> {
    Ok(Json(state.services.recipes.search(&term)?))
}

async fn top_rated(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<LimitQuery>,
) -> ApiResult<Vec<RecipeSummary>> {
    Ok(Json(state.services.recipes.top_rated(query.limit())?))
}

async fn recent(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<LimitQuery>,
) -> ApiResult<Vec<RecipeSummary>> {
    Ok(Json(state.services.recipes.recent(query.limit())?))
}

async fn can_delete(
    State(state): State<AppState>,
    PathParams(id): PathParams<i64>,
) -> ApiResult<DeleteCheck> {
    Ok(Json(state.services.recipes.can_delete(id)?))
}
