//! Identity resolution.
//!
//! Issues and verifies JWT access tokens carrying `{employee_id, db_role}`,
//! and turns the `Authorization` header of every protected request into an
//! [`Identity`].
//!
//! ```text
//! no header / bad token        → 401 Unauthenticated
//! valid token, unknown role    → Identity { role: None }  → 403 on use
//! valid token, known role      → Identity { role: Some(_) }
//! ```

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use depot_core::DbRole;
use depot_db::Database;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (employee_id)
    pub sub: String,

    /// Stored database role name, unparsed
    pub role: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

/// JWT token manager.
pub struct JwtManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_lifetime_secs: i64,
}

impl JwtManager {
    /// Create a new JWT manager.
    pub fn new(secret: &str, access_lifetime_secs: i64) -> Self {
        JwtManager {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_lifetime_secs,
        }
    }

    pub fn access_lifetime_secs(&self) -> i64 {
        self.access_lifetime_secs
    }

    /// Generate an access token.
    pub fn generate_access_token(&self, employee_id: i64, role: &str) -> ApiResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.access_lifetime_secs);

        let claims = Claims {
            sub: employee_id.to_string(),
            role: role.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Validate and decode a token.
    pub fn validate_token(&self, token: &str) -> ApiResult<Claims> {
        let validation = Validation::default();

        let token_data: TokenData<Claims> = decode(token, &self.decoding, &validation)
            .map_err(|e| ApiError::Unauthenticated(format!("Invalid token: {}", e)))?;

        Ok(token_data.claims)
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

// =============================================================================
// Identity
// =============================================================================

/// The authenticated caller, resolved once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub employee_id: i64,
    /// `None` when the stored role is not one of the known role groups.
    pub role: Option<DbRole>,
}

impl Identity {
    pub fn from_claims(claims: &Claims) -> ApiResult<Self> {
        let employee_id = claims
            .sub
            .parse::<i64>()
            .ok()
            .filter(|id| *id > 0)
            .ok_or_else(|| ApiError::Unauthenticated("Invalid token subject".to_string()))?;

        Ok(Identity {
            employee_id,
            role: DbRole::from_role_name(&claims.role),
        })
    }

    /// The role-scoped handle for this caller. Unknown roles are Forbidden.
    pub fn db<'a>(&self, state: &'a AppState) -> ApiResult<&'a Database> {
        state
            .router
            .handle(self.role)
            .ok_or_else(|| ApiError::Forbidden("Role has no database access".to_string()))
    }

    /// Only administrators pass. The provisioning handle is reached through
    /// this check and nothing else.
    pub fn require_admin(&self) -> ApiResult<()> {
        match self.role {
            Some(DbRole::Admin) => Ok(()),
            _ => Err(ApiError::Forbidden("Administrator role required".to_string())),
        }
    }

    /// Employee a request acts for. Defaults to the caller; naming someone
    /// else is reserved to administrators.
    pub fn acting_for(&self, requested: Option<i64>) -> ApiResult<i64> {
        match requested {
            None => Ok(self.employee_id),
            Some(id) if id == self.employee_id => Ok(id),
            Some(id) if self.role == Some(DbRole::Admin) => Ok(id),
            Some(_) => Err(ApiError::Forbidden(
                "Cannot act on behalf of another employee".to_string(),
            )),
        }
    }
}

impl FromRequestParts<AppState> for Identity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| ApiError::Unauthenticated("Please log in first".to_string()))?;

        let token = extract_bearer_token(header).ok_or_else(|| {
            ApiError::Unauthenticated("Invalid authorization header".to_string())
        })?;

        let claims = state.jwt.validate_token(token)?;
        let identity = Identity::from_claims(&claims)?;

        debug!(
            employee_id = identity.employee_id,
            role = ?identity.role,
            "Identity resolved"
        );
        Ok(identity)
    }
}
