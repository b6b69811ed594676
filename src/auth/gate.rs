use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::{error::ApiError, state::AppState, users::User};

/// The user resolved by [`require_user`], available to gated handlers.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Pulls the token out of `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Authorization("Missing Authorization header".into()))?;

    match value.trim().split_once(' ') {
        Some((scheme, token))
            if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() =>
        {
            Ok(token.trim())
        }
        _ => Err(ApiError::Authorization("Invalid Authorization header".into())),
    }
}

/// Middleware in front of protected routes: verifies the bearer token, loads
/// the user it names and hands it to the inner handler as [`CurrentUser`].
pub async fn require_user(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers()).inspect_err(|e| warn!(reason = %e, "rejected"))?;

    let user_id = state.keys.verify(token).map_err(|e| {
        warn!(reason = %e, "invalid or expired token");
        ApiError::from(e)
    })?;

    let user = state.users.find_by_id(user_id).await?.ok_or_else(|| {
        warn!(user_id, "token names unknown user");
        ApiError::Authorization("User not found".into())
    })?;

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| ApiError::Authorization("Not authenticated".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).expect("header"));
        headers
    }

    #[test]
    fn extracts_bearer_token() {
        let headers = headers_with("Bearer abc.def.ghi");
        assert_eq!(bearer_token(&headers).expect("token"), "abc.def.ghi");
    }

    #[test]
    fn scheme_is_case_insensitive() {
        let headers = headers_with("bearer abc");
        assert_eq!(bearer_token(&headers).expect("token"), "abc");
    }

    #[test]
    fn missing_header_is_rejected() {
        let err = bearer_token(&HeaderMap::new()).unwrap_err();
        assert_eq!(err.to_string(), "Missing Authorization header");
    }

    #[test]
    fn other_schemes_are_rejected() {
        for value in ["Basic dXNlcjpwYXNz", "Bearer", "Bearer   ", "abc"] {
            let err = bearer_token(&headers_with(value)).unwrap_err();
            assert_eq!(err.to_string(), "Invalid Authorization header", "value: {value:?}");
        }
    }
}
