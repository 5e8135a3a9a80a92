//! Bearer token authentication and role checks.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::{Duration, Utc};
use common::Role;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use model::entities::user;
use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::config::AppConfig;
use crate::error::{ApiError, ApiResult};
use crate::schemas::AppState;

/// Roles allowed to change the academic structure and student records.
pub const REGISTRY_ROLES: &[Role] = &[Role::Admin, Role::Registrar];
/// Roles allowed to touch money.
pub const FINANCE_ROLES: &[Role] = &[Role::Admin, Role::Accountant];
pub const ADMIN_ONLY: &[Role] = &[Role::Admin];

/// JWT payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

pub fn issue_token(user: &user::Model, config: &AppConfig) -> ApiResult<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        role: user.role.into(),
        iat: now.timestamp(),
        exp: (now + Duration::seconds(config.jwt_expiration_seconds)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("Failed to sign token: {}", e)))
}

pub fn decode_token(token: &str, secret: &str) -> ApiResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        debug!("Rejected token: {}", e);
        ApiError::Unauthorized("Invalid or expired token".to_string())
    })
}

pub fn hash_password(password: &str, cost: u32) -> ApiResult<String> {
    bcrypt::hash(password, cost)
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, hash: &str) -> ApiResult<bool> {
    bcrypt::verify(password, hash)
        .map_err(|e| ApiError::Internal(format!("Password verification error: {}", e)))
}

/// The signed-in staff member, resolved from the `Authorization: Bearer` header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i32,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    /// Fails with 403 unless the user holds one of `roles`.
    pub fn require(&self, roles: &[Role]) -> ApiResult<()> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            warn!(
                "User {} <{}> with role {} denied, needs one of {:?}",
                self.id, self.email, self.role, roles
            );
            Err(ApiError::Forbidden(format!(
                "Role '{}' is not allowed to perform this action",
                self.role
            )))
        }
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        trace!("Authenticating request");
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::Unauthorized("Expected a bearer token".to_string()))?;

        let claims = decode_token(token, &state.config.jwt_secret)?;
        let user_id: i32 = claims
            .sub
            .parse()
            .map_err(|_| ApiError::Unauthorized("Invalid token subject".to_string()))?;

        // Role and active flag are read fresh so changes apply immediately
        let user = user::Entity::find_by_id(user_id)
            .one(&state.db)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| ApiError::Unauthorized("User is inactive or no longer exists".to_string()))?;

        Ok(AuthUser {
            id: user.id,
            email: user.email,
            role: user.role.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::entities::user::UserRole;

    fn sample_user() -> user::Model {
        user::Model {
            id: 3,
            name: "Rina".to_string(),
            email: "rina@example.edu".to_string(),
            password_hash: String::new(),
            role: UserRole::Accountant,
            is_active: true,
            reset_token: None,
            reset_token_expires_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_token_carries_identity_and_role() {
        let config = AppConfig {
            jwt_secret: "unit-test-secret".to_string(),
            ..Default::default()
        };
        let token = issue_token(&sample_user(), &config).unwrap();
        let claims = decode_token(&token, "unit-test-secret").unwrap();

        assert_eq!(claims.sub, "3");
        assert_eq!(claims.email, "rina@example.edu");
        assert_eq!(claims.role, Role::Accountant);
        assert!(claims.exp > claims.iat);

        assert!(matches!(
            decode_token(&token, "another-secret"),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_role_check() {
        let accountant = AuthUser {
            id: 1,
            email: "a@example.edu".to_string(),
            role: Role::Accountant,
        };
        assert!(accountant.require(FINANCE_ROLES).is_ok());
        assert!(matches!(accountant.require(REGISTRY_ROLES), Err(ApiError::Forbidden(_))));
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("s3cret-pass", 4).unwrap();
        assert!(verify_password("s3cret-pass", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }
}
