use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};

use crate::{
    auth::AuthUser,
    service::{
        BulkAddResult, CrudService, Deleted, RecipeIngredientInput, RecipeIngredientPatch,
        Removed, ServiceError,
    },
    storage::{RecipeIngredient, RecipeIngredientLine, RecipeIngredientUse},
};

use super::{ApiResult, AppState, Created, JsonBody, PathParams};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/recipe-ingredients", get(list).post(create))
        .route(
            "/recipe-ingredients/:id",
            get(show).put(update).delete(remove),
        )
        .route(
            "/recipe-ingredients/recipe/:recipe_id",
            get(by_recipe).delete(remove_all),
        )
        .route("/recipe-ingredients/recipe/:recipe_id/bulk", post(add_many))
        .route(
            "/recipe-ingredients/recipe/:recipe_id/ingredient/:ingredient_id",
            put(update_pair).delete(remove_pair),
        )
        .route(
            "/recipe-ingredients/ingredient/:ingredient_id",
            get(by_ingredient),
        )
}

/// Ingredient lines belong to the recipe's author.
fn require_recipe_owner(
    state: &AppState,
    caller: &AuthUser,
    recipe_id: i64,
) -> Result<(), ServiceError> {
    caller.require_owner_or_admin(state.services.recipes.owner_id(recipe_id)?)
}

async fn list(State(state): State<AppState>) -> ApiResult<Vec<RecipeIngredient>> {
    Ok(Json(state.services.recipe_ingredients.get_all()?))
}

async fn create(
    State(state): State<AppState>,
    caller: AuthUser,
    JsonBody(input): JsonBody<RecipeIngredientInput>,
) -> Created<RecipeIngredient> {
    if let Some(recipe_id) = input.recipe_id {
        match require_recipe_owner(&state, &caller, recipe_id) {
            // Unknown recipes are reported by validation.
            Err(ServiceError::NotFound(_)) => {}
            other => other?,
        }
    }
    Ok((
        StatusCode::CREATED,
        Json(state.services.recipe_ingredients.add(input)?),
    ))
}

async fn show(
    State(state): State<AppState>,
    PathParams(id): PathParams<i64>,
) -> ApiResult<RecipeIngredient> {
    Ok(Json(state.services.recipe_ingredients.get_by_id(id)?))
}

async fn update(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParams(id): PathParams<i64>,
    JsonBody(patch): JsonBody<RecipeIngredientPatch>,
) -> ApiResult<RecipeIngredient> {
    let lines = &state.services.recipe_ingredients;
    require_recipe_owner(&state, &caller, lines.find(id)?.recipe_id)?;
    Ok(Json(lines.update(id, patch)?))
}

async fn remove(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParams(id): PathParams<i64>,
) -> ApiResult<Deleted> {
    let lines = &state.services.recipe_ingredients;
    require_recipe_owner(&state, &caller, lines.find(id)?.recipe_id)?;
    Ok(Json(lines.delete(id)?))
}

async fn by_recipe(
    State(state): State<AppState>,
    PathParams(recipe_id): PathParams<i64>,
) -> ApiResult<Vec<RecipeIngredientLine>> {
    Ok(Json(state.services.recipe_ingredients.get_by_recipe(recipe_id)?))
}

async fn remove_all(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParams(recipe_id): PathParams<i64>,
) -> ApiResult<Removed> {
    require_recipe_owner(&state, &caller, recipe_id)?;
    Ok(Json(state.services.recipe_ingredients.remove_all(recipe_id)?))
}

async fn add_many(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParams(recipe_id): PathParams<i64>,
    JsonBody(lines): JsonBody<Vec<RecipeIngredientInput>>,
) -> ApiResult<BulkAddResult> {
    require_recipe_owner(&state, &caller, recipe_id)?;
    Ok(Json(
        state
            .services
            .recipe_ingredients
            .add_many(recipe_id, lines)?,
    ))
}

async fn update_pair(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParams((recipe_id, ingredient_id)): PathParams<(i64, i64)>,
    JsonBody(patch): JsonBody<RecipeIngredientPatch>,
) -> ApiResult<RecipeIngredient> {
    require_recipe_owner(&state, &caller, recipe_id)?;
    Ok(Json(state.services.recipe_ingredients.update_pair(
        recipe_id,
        ingredient_id,
        patch,
    )?))
}

async fn remove_pair(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParams((recipe_id, ingredient_id)): PathParams<(i64, i64)>,
) -> ApiResult<Deleted> {
    require_recipe_owner(&state, &caller, recipe_id)?;
    Ok(Json(
        state
            .services
            .recipe_ingredients
            .remove_pair(recipe_id, ingredient_id)?,
    ))
}

async fn by_ingredient(
    State(state): State<AppState>,
    PathParams(ingredient_id): PathParams<i64>,
) -> ApiResult<Vec<RecipeIngredientUse>> {
    Ok(Json(
        state
            .services
            .recipe_ingredients
            .get_by_ingredient(ingredient_id)?,
    ))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::rest::test_support::TestApp;

    /// A member-owned recipe plus two ingredients; returns the member token.
    async fn setup(app: &TestApp) -> String {
        let (_, admin) = app.admin();
        let (_, member) = app.member();
        for (uri, name) in [
            ("/categories", "Breakfast"),
            ("/ingredients", "Flour"),
            ("/ingredients", "Eggs"),
        ] {
            app.call(Method::POST, uri, Some(&admin), Some(json!({"name": name})))
                .await;
        }
        let (status, _) = app
            .call(
                Method::POST,
                "/recipes",
                Some(&member),
                Some(json!({"title": "Pancakes", "category_id": 1})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        member
    }

    #[tokio::test]
    async fn bulk_add_reports_partial_failure() {
        let app = TestApp::new();
        let member = setup(&app).await;

        let (status, body) = app
            .call(
                Method::POST,
                "/recipe-ingredients/recipe/1/bulk",
                Some(&member),
                Some(json!([
                    {"ingredient_id": 1, "quantity": 2, "unit": "cup"},
                    {"ingredient_id": 1, "quantity": 1, "unit": "cup"},
                    {"ingredient_id": 2, "quantity": 0, "unit": "piece"}
                ])),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
        assert_eq!(body["data"]["added"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"]["failed"][0]["index"], 1);
        assert_eq!(body["data"]["failed"][1]["index"], 2);

        let (_, body) = app.get("/recipe-ingredients/recipe/1").await;
        assert_eq!(body["data"][0]["ingredient_name"], "Flour");
    }

    #[tokio::test]
    async fn pair_routes_update_and_remove() {
        let app = TestApp::new();
        let member = setup(&app).await;
        let (status, _) = app
            .call(
                Method::POST,
                "/recipe-ingredients",
                Some(&member),
                Some(json!({"recipe_id": 1, "ingredient_id": 2, "quantity": 3, "unit": "piece"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let pair = "/recipe-ingredients/recipe/1/ingredient/2";
        let (status, body) = app
            .call(Method::PUT, pair, Some(&member), Some(json!({"quantity": 4.5})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["quantity"], 4.5);

        let (status, _) = app.call(Method::DELETE, pair, Some(&member), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = app.call(Method::DELETE, pair, Some(&member), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Ingredient not found in recipe");
    }

    #[tokio::test]
    async fn strangers_cannot_touch_lines() {
        let app = TestApp::new();
        setup(&app).await;
        let (_, stranger) = app.user_token("stranger@example.com", 2);

        let (status, _) = app
            .call(
                Method::POST,
                "/recipe-ingredients/recipe/1/bulk",
                Some(&stranger),
                Some(json!([{"ingredient_id": 1, "quantity": 1, "unit": "cup"}])),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app
            .call(Method::DELETE, "/recipe-ingredients/recipe/1", Some(&stranger), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn unknown_recipe_is_404() {
        let app = TestApp::new();
        let (status, _) = app.get("/recipe-ingredients/recipe/42").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = app.get("/recipe-ingredients/ingredient/42").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
