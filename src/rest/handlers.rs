use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::service::Envelope;

use super::{models::HealthResponse, AppState};

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let uptime_secs = state.started_at.elapsed().map(|d| d.as_secs()).unwrap_or(0);
    (
        StatusCode::OK,
        Json(Envelope::ok(
            HealthResponse {
                status: "ok".into(),
                uptime_secs,
            },
            "Service is healthy",
        )),
    )
}

pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(Envelope::failure("Route not found")),
    )
}

/// A known path with an unsupported method is answered like an unknown route.
pub async fn method_not_allowed(response: Response) -> Response {
    if response.status() == StatusCode::METHOD_NOT_ALLOWED {
        return not_found().await.into_response();
    }
    response
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};

    use crate::rest::test_support::TestApp;

    #[tokio::test]
    async fn health_reports_ok() {
        let app = TestApp::new();
        let (status, body) = app.get("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["status"], "ok");
    }

    #[tokio::test]
    async fn unknown_route_is_enveloped_404() {
        let app = TestApp::new();
        let (status, body) = app.get("/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Route not found");
    }

    #[tokio::test]
    async fn wrong_method_on_known_path_is_enveloped_404() {
        let app = TestApp::new();
        let (_, admin) = app.admin();
        let (status, body) = app.call(Method::PATCH, "/health", Some(&admin), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Route not found");
    }
}
