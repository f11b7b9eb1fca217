//! Login and session introspection.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use depot_core::validation::validate_email;
use depot_core::DbRole;
use depot_db::verify_password;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::Identity;
use crate::error::{ApiError, ApiResult};
use crate::extract::JsonBody;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(me))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub employee_id: i64,
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub employee_id: i64,
    pub role: Option<DbRole>,
}

fn invalid_credentials() -> ApiError {
    ApiError::Unauthenticated("Invalid email or password".to_string())
}

/// Exchanges email and password for an access token.
///
/// Credentials are read on the provisioning pool: neither role group may
/// read `password_hash`.
async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    validate_email(&req.email)?;
    if req.password.is_empty() {
        return Err(invalid_credentials());
    }

    let credentials = state
        .router
        .provisioning()
        .employees()
        .find_credentials(&req.email)
        .await?;

    let Some(credentials) = credentials else {
        warn!(email = %req.email, "Login for unknown or dismissed employee");
        return Err(invalid_credentials());
    };

    if !verify_password(&req.password, &credentials.password_hash) {
        warn!(employee_id = credentials.employee_id, "Login with wrong password");
        return Err(invalid_credentials());
    }

    let token = state
        .jwt
        .generate_access_token(credentials.employee_id, &credentials.db_role)?;

    info!(
        employee_id = credentials.employee_id,
        role = %credentials.db_role,
        "Employee logged in"
    );

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer",
        expires_in: state.jwt.access_lifetime_secs(),
        employee_id: credentials.employee_id,
        role: credentials.db_role,
    }))
}

async fn me(identity: Identity) -> Json<SessionInfo> {
    Json(SessionInfo {
        employee_id: identity.employee_id,
        role: identity.role,
    })
}
