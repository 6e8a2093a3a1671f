use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::api::response::ApiError;
use crate::api::AppState;
use crate::services::token;

/// Identity attached to the request once its bearer token checks out.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub email: String,
    pub role: String,
}

/// Validates the Authorization header when present and stores the caller's
/// identity as a request extension. Requests without a usable token pass
/// through anonymously; handlers that need an identity extract [`AuthUser`]
/// and reject there.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(user) = authenticate(&request, &state) {
        request.extensions_mut().insert(user);
    }

    next.run(request).await
}

fn authenticate(request: &Request, state: &AppState) -> Option<AuthUser> {
    let token = bearer_token(request)?;

    match token::verify_token(token, &state.jwt) {
        Ok(claims) => Some(AuthUser {
            email: claims.sub,
            role: claims.role,
        }),
        Err(err) => {
            debug!("Rejected bearer token: {}", err);
            None
        }
    }
}

fn bearer_token(request: &Request) -> Option<&str> {
    let value = request.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();

    // Browsers serialize a missing client-side token as a literal string.
    if token.is_empty() || token == "null" || token == "undefined" {
        return None;
    }

    Some(token)
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ApiError::new(StatusCode::UNAUTHORIZED, "Authentication required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with_authorization(value: &str) -> Request {
        Request::builder()
            .header(header::AUTHORIZATION, value)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_bearer_token_extraction() {
        let request = request_with_authorization("Bearer abc.def.ghi");
        assert_eq!(bearer_token(&request), Some("abc.def.ghi"));
    }

    #[test]
    fn test_placeholder_tokens_treated_as_absent() {
        for value in ["Bearer null", "Bearer undefined", "Bearer ", "Bearer    "] {
            let request = request_with_authorization(value);
            assert_eq!(bearer_token(&request), None, "for header '{}'", value);
        }
    }

    #[test]
    fn test_non_bearer_scheme_ignored() {
        let request = request_with_authorization("Basic dXNlcjpwYXNz");
        assert_eq!(bearer_token(&request), None);

        let request = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(bearer_token(&request), None);
    }
}
