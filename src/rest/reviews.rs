use axum::{extract::State, http::StatusCode, routing::get, Json, Router};

use crate::{
    auth::AuthUser,
    service::{CrudService, Deleted, ReviewCheck, ReviewInput, ReviewPatch},
    storage::{RatingStats, RecentReview, Review, ReviewWithRecipe, ReviewWithUser},
};

use super::{
    ApiResult, AppState, Created, JsonBody, LimitQuery, PageQuery, PathParams, QueryParams,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reviews", get(list).post(create))
        .route("/reviews/recent", get(recent))
        .route("/reviews/recipe/:recipe_id", get(by_recipe))
        .route("/reviews/recipe/:recipe_id/rating", get(rating))
        .route("/reviews/user/:user_id", get(by_user))
        .route("/reviews/check/:user_id/:recipe_id", get(check))
        .route("/reviews/:id", get(show).put(update).delete(remove))
}

async fn list(State(state): State<AppState>) -> ApiResult<Vec<Review>> {
    Ok(Json(state.services.reviews.get_all()?))
}

async fn create(
    State(state): State<AppState>,
    caller: AuthUser,
    JsonBody(mut input): JsonBody<ReviewInput>,
) -> Created<Review> {
    match input.user_id {
        None => input.user_id = Some(caller.id()),
        Some(user_id) => caller.require_owner_or_admin(user_id)?,
    }
    Ok((StatusCode::CREATED, Json(state.services.reviews.add(input)?)))
}

async fn show(State(state): State<AppState>, PathParams(id): PathParams<i64>) -> ApiResult<Review> {
    Ok(Json(state.services.reviews.get_by_id(id)?))
}

async fn update(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParams(id): PathParams<i64>,
    JsonBody(patch): JsonBody<ReviewPatch>,
) -> ApiResult<Review> {
    let reviews = &state.services.reviews;
    caller.require_owner_or_admin(reviews.find(id)?.user_id)?;
    Ok(Json(reviews.update(id, patch)?))
}

async fn remove(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParams(id): PathParams<i64>,
) -> ApiResult<Deleted> {
    let reviews = &state.services.reviews;
    caller.require_owner_or_admin(reviews.find(id)?.user_id)?;
    Ok(Json(reviews.delete(id)?))
}

async fn by_recipe(
    State(state): State<AppState>,
    PathParams(recipe_id): PathParams<i64>,
    QueryParams(page): QueryParams<PageQuery>,
) -> ApiResult<Vec<ReviewWithUser>> {
    Ok(Json(state.services.reviews.get_by_recipe(
        recipe_id,
        page.limit(),
        page.offset(),
    )?))
}

async fn by_user(
    State(state): State<AppState>,
    PathParams(user_id): PathParams<i64>,
    QueryParams(page): QueryParams<PageQuery>,
) -> ApiResult<Vec<ReviewWithRecipe>> {
    Ok(Json(state.services.reviews.get_by_user(
        user_id,
        page.limit(),
        page.offset(),
    )?))
}

async fn rating(
    State(state): State<AppState>,
    PathParams(recipe_id): PathParams<i64>,
) -> ApiResult<RatingStats> {
    Ok(Json(state.services.reviews.rating(recipe_id)?))
}

async fn recent(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<LimitQuery>,
) -> ApiResult<Vec<RecentReview>> {
    Ok(Json(state.services.reviews.recent(query.limit())?))
}

async fn check(
    State(state): State<AppState>,
    PathParams((user_id, recipe_id)): PathParams<(i64, i64)>,
) -> ApiResult<ReviewCheck> {
    Ok(Json(state.services.reviews.has_reviewed(user_id, recipe_id)?))
}
