use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};

use crate::{
    auth::AuthUser,
    service::{CrudService, Deleted, Exists, NewUser, PasswordChange, ServiceError, UserUpdate},
    storage::{User, UserWithRole},
};

use super::{ApiResult, AppState, Created, JsonBody, PathParams};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list).post(create))
        .route("/users-with-roles", get(list_with_roles))
        .route("/users/email/:email", get(by_email))
        .route("/users/email-exists/:email", get(email_exists))
        .route("/users/role/:role_id", get(by_role))
        .route("/users/search/:term", get(search))
        .route("/users/:id", get(show).put(update).delete(remove))
        .route("/users/:id/role", get(show_with_role))
        .route("/users/:id/password", put(change_password))
}

async fn list(State(state): State<AppState>) -> ApiResult<Vec<User>> {
    Ok(Json(state.services.users.get_all()?))
}

async fn create(
    State(state): State<AppState>,
    caller: AuthUser,
    JsonBody(input): JsonBody<NewUser>,
) -> Created<User> {
    caller.require_admin()?;
    Ok((StatusCode::CREATED, Json(state.services.users.add(input)?)))
}

async fn show(State(state): State<AppState>, PathParams(id): PathParams<i64>) -> ApiResult<User> {
    Ok(Json(state.services.users.get_by_id(id)?))
}

async fn update(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParams(id): PathParams<i64>,
    JsonBody(input): JsonBody<UserUpdate>,
) -> ApiResult<User> {
    caller.require_owner_or_admin(id)?;
    if input.role_id.is_some() && !caller.is_admin() {
        return Err(ServiceError::Forbidden(
            "Only admins can change roles".into(),
        ));
    }
    Ok(Json(state.services.users.update(id, input)?))
}

async fn remove(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParams(id): PathParams<i64>,
) -> ApiResult<Deleted> {
    caller.require_admin()?;
    Ok(Json(state.services.users.delete(id)?))
}

async fn change_password(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParams(id): PathParams<i64>,
    JsonBody(input): JsonBody<PasswordChange>,
) -> ApiResult<User> {
    caller.require_owner_or_admin(id)?;
    let verify_current = caller.id() == id;
    Ok(Json(
        state
            .services
            .users
            .change_password(id, input, verify_current)?,
    ))
}

async fn show_with_role(
    State(state): State<AppState>,
    PathParams(id): PathParams<i64>,
) -> ApiResult<UserWithRole> {
    Ok(Json(state.services.users.get_with_role(id)?))
}

async fn list_with_roles(State(state): State<AppState>) -> ApiResult<Vec<UserWithRole>> {
    Ok(Json(state.services.users.get_all_with_roles()?))
}

async fn by_email(
    State(state): State<AppState>,
    PathParams(email): PathParams<String>,
) -> ApiResult<UserWithRole> {
    Ok(Json(state.services.users.get_by_email(&email)?))
}

async fn email_exists(
    State(state): State<AppState>,
    PathParams(email): PathParams<String>,
) -> ApiResult<Exists> {
    Ok(Json(state.services.users.email_exists(&email)?))
}

async fn by_role(
    State(state): State<AppState>,
    PathParams(role_id): PathParams<i64>,
) -> ApiResult<Vec<UserWithRole>> {
    Ok(Json(state.services.users.get_by_role(role_id)?))
}

async fn search(
    State(state): State<AppState>,
    PathParams(term): PathParams<String>,
) -> ApiResult<Vec<UserWithRole>> {
    Ok(Json(state.services.users.search(&term)?))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::rest::test_support::TestApp;

    #[tokio::test]
    async fn members_cannot_create_users() {
        let app = TestApp::new();
        let (_, token) = app.member();
        let (status, body) = app
            .call(
                Method::POST,
                "/users",
                Some(&token),
                Some(json!({"name": "Bob", "email": "bob@example.com", "password": "secret1"})),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["success"], false);

        let (_, admin) = app.admin();
        let (status, _) = app
            .call(
                Method::POST,
                "/users",
                Some(&admin),
                Some(json!({"name": "Bob", "email": "bob@example.com", "password": "secret1"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn users_edit_themselves_but_not_their_role() {
        let app = TestApp::new();
        let (id, token) = app.member();
        let uri = format!("/users/{id}");

        let (status, body) = app
            .call(Method::PUT, &uri, Some(&token), Some(json!({"name": "Renamed"})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "Renamed");

        let (status, _) = app
            .call(Method::PUT, &uri, Some(&token), Some(json!({"role_id": 1})))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (other_id, _) = app.admin();
        let (status, _) = app
            .call(
                Method::PUT,
                &format!("/users/{other_id}"),
                Some(&token),
                Some(json!({"name": "Hacked"})),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn password_change_requires_current_password() {
        let app = TestApp::new();
        let (id, token) = app.member();
        let uri = format!("/users/{id}/password");

        let (status, _) = app
            .call(
                Method::PUT,
                &uri,
                Some(&token),
                Some(json!({"current_password": "wrong!!", "new_password": "secret2"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app
            .call(
                Method::PUT,
                &uri,
                Some(&token),
                Some(json!({"current_password": "secret1", "new_password": "secret2"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn lookup_routes() {
        let app = TestApp::new();
        let (id, _) = app.member();

        let (status, body) = app.get("/users/email/member@example.com").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["id"], id);

        let (_, body) = app.get("/users/email-exists/nobody@example.com").await;
        assert_eq!(body["data"]["exists"], false);

        let (_, body) = app.get(&format!("/users/{id}/role")).await;
        assert_eq!(body["data"]["role_name"], "user");

        let (_, body) = app.get("/users/role/2").await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let (_, body) = app.get("/users/search/member").await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let (_, body) = app.get("/users-with-roles").await;
        assert_eq!(body["data"][0]["role_name"], "user");

        let (status, _) = app.get("/users/abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
