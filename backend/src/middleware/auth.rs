//! Authentication middleware
//!
//! Validates the bearer token issued by the authentication provider and
//! turns its claims into an explicit tenant context.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use shared::TenantContext;
use uuid::Uuid;

use crate::error::AppError;
use crate::AppState;

/// Read the classified stock table
pub const STOCK_READ: &str = "stock:read";
/// Force a new load cycle
pub const STOCK_REFRESH: &str = "stock:refresh";

/// Authenticated user information extracted from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub permissions: Vec<String>,
}

impl AuthUser {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }

    /// Fail with 403 unless the user holds `permission`
    pub fn require(&self, permission: &str) -> Result<(), AppError> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            tracing::warn!(
                user_id = %self.user_id,
                permission,
                "Permission denied"
            );
            Err(AppError::InsufficientPermissions)
        }
    }

    /// Tenant scope for store and loader calls
    pub fn tenant(&self) -> TenantContext {
        TenantContext::new(self.tenant_id, self.user_id)
    }
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub tenant_id: String,
    #[serde(default)]
    pub permissions: Vec<String>,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
}

/// Decode and validate JWT token
pub fn decode_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!("Rejected token: {}", e);
        AppError::InvalidToken
    })
}

fn unauthorized(message: &str, message_fr: &str) -> AppError {
    AppError::Unauthorized {
        message: message.to_string(),
        message_fr: message_fr.to_string(),
    }
}

/// Authentication middleware that validates JWT tokens
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
    {
        Some(token) => token,
        None => {
            return unauthorized(
                "Missing or invalid Authorization header",
                "En-tête Authorization manquant ou invalide",
            )
            .into_response()
        }
    };

    let claims = match decode_jwt(token, &state.config.jwt.secret) {
        Ok(claims) => claims,
        Err(e) => return e.into_response(),
    };

    let (user_id, tenant_id) = match (
        Uuid::parse_str(&claims.sub),
        Uuid::parse_str(&claims.tenant_id),
    ) {
        (Ok(user_id), Ok(tenant_id)) => (user_id, tenant_id),
        _ => {
            return unauthorized(
                "Invalid user or tenant in token",
                "Utilisateur ou officine invalide dans le jeton",
            )
            .into_response()
        }
    };

    request.extensions_mut().insert(AuthUser {
        user_id,
        tenant_id,
        permissions: claims.permissions,
    });

    next.run(request).await
}

/// Extractor for authenticated user
#[derive(Clone, Debug)]
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| unauthorized("Authentication required", "Authentification requise"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(secret: &str, tenant_id: &str, exp: i64) -> String {
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            permissions: vec![STOCK_READ.to_string()],
            exp,
            iat: chrono::Utc::now().timestamp(),
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn test_decode_valid_token() {
        let tenant_id = Uuid::new_v4().to_string();
        let exp = chrono::Utc::now().timestamp() + 3600;
        let claims = decode_jwt(&token("secret", &tenant_id, exp), "secret").unwrap();
        assert_eq!(claims.tenant_id, tenant_id);
        assert_eq!(claims.permissions, vec![STOCK_READ.to_string()]);
    }

    #[test]
    fn test_decode_rejects_wrong_secret_and_expired() {
        let tenant_id = Uuid::new_v4().to_string();
        let future = chrono::Utc::now().timestamp() + 3600;
        let past = chrono::Utc::now().timestamp() - 3600;
        assert!(matches!(
            decode_jwt(&token("secret", &tenant_id, future), "other"),
            Err(AppError::InvalidToken)
        ));
        assert!(matches!(
            decode_jwt(&token("secret", &tenant_id, past), "secret"),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_require_permission() {
        let user = AuthUser {
            user_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            permissions: vec![STOCK_READ.to_string()],
        };
        assert!(user.require(STOCK_READ).is_ok());
        assert!(matches!(
            user.require(STOCK_REFRESH),
            Err(AppError::InsufficientPermissions)
        ));
        assert_eq!(user.tenant().tenant_id, user.tenant_id);
    }
}
