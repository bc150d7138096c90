// Authentication boundary for protected routes

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use tracing::debug;

use crate::auth::{error::AuthError, models::ActorContext, models::Claims};

#[async_trait]
impl<S> FromRequestParts<S> for ActorContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AuthError::MissingToken)?
            .to_str()
            .map_err(|_| AuthError::InvalidToken)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidToken)?;

        let jwt_secret = std::env::var("JWT_SECRET")
            .map_err(|_| AuthError::Misconfigured("JWT_SECRET not configured".to_string()))?;

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|err| {
            debug!("Token validation failed: {}", err);
            AuthError::InvalidToken
        })?;

        let claims = token_data.claims;

        Ok(ActorContext {
            user_id: claims.sub,
            email: claims.email,
            company_id: claims.company_id,
            store_id: claims.store_id,
            role: claims.role,
        })
    }
}
