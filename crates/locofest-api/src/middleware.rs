use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use locofest_types::api::Claims;

use crate::error::ApiError;
use crate::state::AppState;

/// Decodes the bearer token if one is present. A malformed or expired token
/// is an error; a missing header is `Ok(None)`.
pub fn claims_from_headers(headers: &HeaderMap, secret: &str) -> Result<Option<Claims>, ApiError> {
    let Some(auth_header) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let token = auth_header
        .to_str()
        .ok()
        .and_then(|s| s.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized("malformed authorization header".into()))?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::Unauthorized("invalid token".into()))?;

    Ok(Some(token_data.claims))
}

/// Rejects requests without a valid bearer token and stores the claims as a
/// request extension.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = claims_from_headers(req.headers(), &state.jwt_secret)?
        .ok_or_else(|| ApiError::Unauthorized("not authenticated".into()))?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn token(secret: &str, sub: &str) -> String {
        let claims = Claims {
            sub: sub.into(),
            exp: (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp() as usize,
            email_verified: true,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn missing_header_is_anonymous() {
        assert!(claims_from_headers(&HeaderMap::new(), "s").unwrap().is_none());
    }

    #[test]
    fn valid_token_yields_subject() {
        let mut headers = HeaderMap::new();
        let value = format!("Bearer {}", token("s", "user-1"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(&value).unwrap());
        let claims = claims_from_headers(&headers, "s").unwrap().unwrap();
        assert_eq!(claims.sub, "user-1");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let mut headers = HeaderMap::new();
        let value = format!("Bearer {}", token("other", "user-1"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(&value).unwrap());
        assert!(matches!(claims_from_headers(&headers, "s"), Err(ApiError::Unauthorized(_))));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(matches!(claims_from_headers(&headers, "s"), Err(ApiError::Unauthorized(_))));
    }
}
