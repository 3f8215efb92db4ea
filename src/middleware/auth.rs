use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use crate::models::user::Claims;
use crate::state::AppState;

/// Decode the bearer token and insert the claims into request extensions.
/// Handlers receive the authenticated-borrower context explicitly instead
/// of reading ambient session state. The secret comes from the same
/// `AppConfig` the login handler signs with.
pub async fn auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = headers
        .get("authorization")
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let claims = decode_claims(&state.config.jwt_secret, token)
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

pub fn decode_claims(secret: &str, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let decoding_key = DecodingKey::from_secret(secret.as_ref());
    decode::<Claims>(token, &decoding_key, &Validation::new(Algorithm::HS256))
        .map(|data| data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token_for(secret: &str) -> String {
        let claims = Claims {
            sub: "665f1c2e9b1d8c3a4e5f6a7b".to_string(),
            email: "jane@example.com".to_string(),
            role: Role::Borrower,
            exp: (Utc::now().timestamp() + 3600) as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_ref()),
        )
        .unwrap()
    }

    #[test]
    fn decodes_tokens_signed_with_the_same_secret() {
        let token = token_for("config-secret");
        let claims = decode_claims("config-secret", &token).unwrap();
        assert_eq!(claims.email, "jane@example.com");
        assert_eq!(claims.role, Role::Borrower);
    }

    #[test]
    fn rejects_tokens_signed_with_a_different_secret() {
        let token = token_for("config-secret");
        assert!(decode_claims("some-other-secret", &token).is_err());
    }
}
