use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use crate::rest::test_support::TestApp;

async fn create(app: &TestApp, token: &str, uri: &str, body: Value) -> i64 {
    let (status, body) = app.call(Method::POST, uri, Some(token), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "POST {uri}: {body}");
    assert_eq!(body["success"], true);
    body["data"]["id"].as_i64().expect("created id")
}

/// Walks one resource through get, partial update and double delete.
async fn lifecycle(app: &TestApp, token: &str, collection: &str, id: i64, patch: Value) {
    let uri = format!("{collection}/{id}");

    // Created row is retrievable
    let (status, before) = app.get(&uri).await;
    assert_eq!(status, StatusCode::OK, "GET {uri}");
    assert_eq!(before["data"]["id"], id);

    // Update touches only the submitted fields
    let (status, after) = app
        .call(Method::PUT, &uri, Some(token), Some(patch.clone()))
        .await;
    assert_eq!(status, StatusCode::OK, "PUT {uri}: {after}");
    let mut expected = before["data"].clone();
    for (key, value) in patch.as_object().unwrap() {
        expected[key] = value.clone();
    }
    assert_eq!(after["data"], expected, "PUT {uri}");

    // Delete, then the row is gone
    let (status, body) = app.call(Method::DELETE, &uri, Some(token), None).await;
    assert_eq!(status, StatusCode::OK, "DELETE {uri}: {body}");
    assert_eq!(body["data"]["id"], id);
    let (status, _) = app.get(&uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, body) = app.call(Method::DELETE, &uri, Some(token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn every_resource_supports_the_crud_contract() {
    let app = TestApp::new();
    let (_, admin) = app.admin();
    let (_, member) = app.member();

    let role = create(&app, &admin, "/roles", json!({"name": "chef"})).await;
    lifecycle(&app, &admin, "/roles", role, json!({"name": "head-chef"})).await;

    let user = create(
        &app,
        &admin,
        "/users",
        json!({"name": "Bob", "email": "bob@example.com", "password": "secret1"}),
    )
    .await;
    lifecycle(&app, &admin, "/users", user, json!({"name": "Robert"})).await;

    let breakfast = create(&app, &admin, "/categories", json!({"name": "Breakfast"})).await;
    let soups = create(&app, &admin, "/categories", json!({"name": "Soups"})).await;
    lifecycle(
        &app,
        &admin,
        "/categories",
        soups,
        json!({"description": "Hot and cold"}),
    )
    .await;

    let flour = create(&app, &admin, "/ingredients", json!({"name": "Flour"})).await;
    let salt = create(&app, &admin, "/ingredients", json!({"name": "Salt"})).await;
    lifecycle(&app, &admin, "/ingredients", salt, json!({"name": "Sea salt"})).await;

    let recipe = json!({"title": "Pancakes", "category_id": breakfast});
    let pancakes = create(&app, &member, "/recipes", recipe.clone()).await;
    let waffles = create(&app, &member, "/recipes", recipe).await;
    lifecycle(&app, &member, "/recipes", pancakes, json!({"servings": 4})).await;

    let line = create(
        &app,
        &member,
        "/recipe-ingredients",
        json!({"recipe_id": waffles, "ingredient_id": flour, "quantity": 2.0, "unit": "cup"}),
    )
    .await;
    lifecycle(
        &app,
        &member,
        "/recipe-ingredients",
        line,
        json!({"quantity": 1.5}),
    )
    .await;

    let review = create(
        &app,
        &member,
        "/reviews",
        json!({"recipe_id": waffles, "rating": 5}),
    )
    .await;
    lifecycle(&app, &member, "/reviews", review, json!({"comment": "Crispy"})).await;
}

#[tokio::test]
async fn uniqueness_is_enforced() {
    let app = TestApp::new();
    let (_, admin) = app.admin();
    let (_, member) = app.member();

    // Email
    let bob = json!({"name": "Bob", "email": "bob@example.com", "password": "secret1"});
    let (status, _) = app
        .call(Method::POST, "/auth/register", None, Some(bob.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = app.call(Method::POST, "/auth/register", None, Some(bob)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email already exists");

    // Letter case does not make a new address
    let shouted = json!({"name": "Bob", "email": "Bob@Example.COM", "password": "secret1"});
    let (status, body) = app
        .call(Method::POST, "/auth/register", None, Some(shouted))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email already exists");
    let (status, body) = app
        .call(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({"email": "BOB@example.com", "password": "secret1"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["email"], "bob@example.com");

    // Category name
    create(&app, &admin, "/categories", json!({"name": "Breakfast"})).await;
    let (status, _) = app
        .call(
            Method::POST,
            "/categories",
            Some(&admin),
            Some(json!({"name": "Breakfast"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app
        .call(
            Method::POST,
            "/categories",
            Some(&admin),
            Some(json!({"name": "breakfast"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // One review per user and recipe
    let recipe = create(
        &app,
        &member,
        "/recipes",
        json!({"title": "Pancakes", "category_id": 1}),
    )
    .await;
    let review = json!({"recipe_id": recipe, "rating": 4});
    create(&app, &member, "/reviews", review.clone()).await;
    let (status, body) = app
        .call(Method::POST, "/reviews", Some(&member), Some(review))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User has already reviewed this recipe");
}

#[tokio::test]
async fn ratings_outside_one_to_five_are_rejected() {
    let app = TestApp::new();
    let (_, admin) = app.admin();
    let (_, member) = app.member();
    create(&app, &admin, "/categories", json!({"name": "Breakfast"})).await;
    let recipe = create(
        &app,
        &member,
        "/recipes",
        json!({"title": "Pancakes", "category_id": 1}),
    )
    .await;

    for rating in [0, 6, -3] {
        let (status, _) = app
            .call(
                Method::POST,
                "/reviews",
                Some(&member),
                Some(json!({"recipe_id": recipe, "rating": rating})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "rating {rating}");
    }
    for rating in [1, 5] {
        let (_, other) = app.user_token(&format!("r{rating}@example.com"), 2);
        create(
            &app,
            &other,
            "/reviews",
            json!({"recipe_id": recipe, "rating": rating}),
        )
        .await;
    }

    let (_, body) = app.get(&format!("/reviews/recipe/{recipe}/rating")).await;
    assert_eq!(body["data"]["avg_rating"], 3.0);
    assert_eq!(body["data"]["review_count"], 2);
}
