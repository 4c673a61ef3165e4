use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{
    rest::AppState,
    service::ServiceError,
    storage::ADMIN_ROLE,
};

use super::token::{bearer_token, Claims};

/// Paths that accept writes without a token.
const PUBLIC_WRITES: [&str; 2] = ["/auth/login", "/auth/register"];

fn is_public(method: &Method, path: &str) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
        || (*method == Method::POST && PUBLIC_WRITES.contains(&path))
}

/// Rejects protected requests without a valid bearer token and stores the
/// decoded claims for [`AuthUser`].
pub async fn require_auth(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    if is_public(request.method(), request.uri().path()) {
        return next.run(request).await;
    }

    let header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());
    let claims = match bearer_token(header).and_then(|token| state.keys.decode(token)) {
        Ok(claims) => claims,
        Err(err) => {
            log::debug!(
                "rejected {} {}: {}",
                request.method(),
                request.uri().path(),
                err
            );
            return ServiceError::Unauthorized(err.to_string()).into_response();
        }
    };

    request.extensions_mut().insert(claims);
    next.run(request).await
}

/// The caller of a protected route.
#[derive(Clone, Debug)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn id(&self) -> i64 {
        self.0.user_id()
    }

    pub fn is_admin(&self) -> bool {
        self.0.is_admin()
    }

    pub fn require_role(&self, allowed: &[&str]) -> Result<(), ServiceError> {
        if self.0.has_role(allowed) {
            Ok(())
        } else {
            Err(ServiceError::Forbidden("Insufficient permissions".into()))
        }
    }

    pub fn require_admin(&self) -> Result<(), ServiceError> {
        self.require_role(&[ADMIN_ROLE])
    }

    /// Passes when the caller is `owner_id` or an admin.
    pub fn require_owner_or_admin(&self, owner_id: i64) -> Result<(), ServiceError> {
        if self.is_admin() || self.id() == owner_id {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(
                "You can only modify your own resources".into(),
            ))
        }
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| ServiceError::Unauthorized("Missing authorization token".into()))
    }
}
