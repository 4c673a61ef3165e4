use axum::http::{Method, StatusCode};
use serde_json::json;

use crate::rest::test_support::TestApp;

#[tokio::test]
async fn referenced_rows_cannot_be_deleted() {
    let app = TestApp::new();
    let (_, admin) = app.admin();
    let (member_id, member) = app.member();

    for (uri, name) in [("/categories", "Breakfast"), ("/ingredients", "Flour")] {
        let (status, _) = app
            .call(Method::POST, uri, Some(&admin), Some(json!({"name": name})))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    let (status, _) = app
        .call(
            Method::POST,
            "/recipes/with-ingredients",
            Some(&member),
            Some(json!({
                "title": "Pancakes",
                "category_id": 1,
                "ingredients": [{"ingredient_id": 1, "quantity": 1, "unit": "cup"}]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app
        .call(
            Method::POST,
            "/reviews",
            Some(&member),
            Some(json!({"recipe_id": 1, "rating": 5})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let guarded = [
        ("/categories/1", "/categories/can-delete/1"),
        ("/ingredients/1", "/ingredients/can-delete/1"),
        ("/recipes/1", "/recipes/can-delete/1"),
    ];
    for (uri, probe) in guarded {
        let (_, body) = app.get(probe).await;
        assert_eq!(body["data"]["can_delete"], false, "{probe}");

        let (status, body) = app.call(Method::DELETE, uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "DELETE {uri}");
        assert_eq!(body["success"], false);
    }

    let (status, body) = app
        .call(Method::DELETE, &format!("/users/{member_id}"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = app.call(Method::DELETE, "/roles/2", Some(&admin), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Once the review is gone the recipe goes too, taking its lines with it
    let (status, _) = app.call(Method::DELETE, "/reviews/1", Some(&member), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.call(Method::DELETE, "/recipes/1", Some(&member), None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app.get("/ingredients/can-delete/1").await;
    assert_eq!(body["data"]["can_delete"], true);
    let (status, _) = app.call(Method::DELETE, "/categories/1", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
}
