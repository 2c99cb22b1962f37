use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;

use super::tokens::{Claims, Role, TokenService};
use crate::http::failure;

/// Router state able to verify bearer tokens.
pub trait TokenAuthority {
    fn tokens(&self) -> &TokenService;
}

impl<T: TokenAuthority> TokenAuthority for Arc<T> {
    fn tokens(&self) -> &TokenService {
        (**self).tokens()
    }
}

/// Extracts the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn claims_with_role<S: TokenAuthority>(parts: &Parts, state: &S, role: Role) -> Option<Claims> {
    let token = bearer_token(&parts.headers)?;
    match state.tokens().verify(token) {
        Ok(claims) if claims.role == role => Some(claims),
        Ok(claims) => {
            tracing::debug!(subject = %claims.sub, ?claims.role, "token role mismatch");
            None
        }
        Err(err) => {
            tracing::debug!(error = %err, "bearer token rejected");
            None
        }
    }
}

/// Authenticated admin, required by every `/api/admin/*` route except login.
#[derive(Debug, Clone)]
pub struct AdminSession(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AdminSession
where
    S: TokenAuthority + Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        claims_with_role(parts, state, Role::Admin)
            .map(AdminSession)
            .ok_or_else(|| failure(StatusCode::UNAUTHORIZED, "Unauthorized"))
    }
}

/// Authenticated, approved builder.
#[derive(Debug, Clone)]
pub struct BuilderSession(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for BuilderSession
where
    S: TokenAuthority + Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        claims_with_role(parts, state, Role::Builder)
            .map(BuilderSession)
            .ok_or_else(|| failure(StatusCode::UNAUTHORIZED, "Unauthorized"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    struct State(TokenService);

    impl TokenAuthority for State {
        fn tokens(&self) -> &TokenService {
            &self.0
        }
    }

    fn parts_with(header: Option<String>) -> Parts {
        let mut builder = Request::builder().uri("/api/admin/stats");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).expect("request builds").into_parts().0
    }

    #[test]
    fn bearer_prefix_is_required() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer abc.def".parse().expect("header"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));

        headers.insert(AUTHORIZATION, "abc.def".parse().expect("header"));
        assert_eq!(bearer_token(&headers), None);
    }

    #[tokio::test]
    async fn admin_session_requires_admin_role() {
        let state = State(TokenService::new("secret", 1));
        let admin = state
            .0
            .issue("admin", "admin@estatehub.com", Role::Admin)
            .expect("token");
        let builder = state
            .0
            .issue("b-1", "b@acme.in", Role::Builder)
            .expect("token");

        let mut parts = parts_with(Some(format!("Bearer {admin}")));
        let session = AdminSession::from_request_parts(&mut parts, &state)
            .await
            .expect("admin accepted");
        assert_eq!(session.0.email, "admin@estatehub.com");

        let mut parts = parts_with(Some(format!("Bearer {builder}")));
        let rejection = AdminSession::from_request_parts(&mut parts, &state)
            .await
            .expect_err("builder token rejected");
        assert_eq!(rejection.status(), StatusCode::UNAUTHORIZED);

        let mut parts = parts_with(None);
        assert!(AdminSession::from_request_parts(&mut parts, &state)
            .await
            .is_err());
    }
}
