//! Employee administration. Administrators only.
//!
//! These handlers are the one request path to the provisioning pool, and
//! they reach it only after [`Identity::require_admin`]. The role granted to
//! a new login comes from the closed [`DbRole`](depot_core::DbRole) enum,
//! never from free text.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use depot_core::search::EmployeeFilter;
use depot_core::{Employee, EmployeeUpdate, NewEmployee};
use serde::Deserialize;

use super::Message;
use crate::auth::Identity;
use crate::error::ApiResult;
use crate::extract::{IdPath, JsonBody, QueryParams};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/employee", get(list).post(provision))
        .route("/api/employee/{id}", get(show).put(update).delete(deprovision))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(rename = "type")]
    pub key: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProvisionRequest {
    #[serde(flatten)]
    pub employee: NewEmployee,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    #[serde(flatten)]
    pub employee: EmployeeUpdate,
    /// Rotates both the login password and the stored hash.
    pub password: Option<String>,
}

async fn list(
    identity: Identity,
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ListQuery>,
) -> ApiResult<Json<Vec<Employee>>> {
    identity.require_admin()?;
    let filter = EmployeeFilter::parse(query.key.as_deref(), query.search.as_deref())?;
    let employees = state.router.provisioning().employees().list(&filter).await?;
    Ok(Json(employees))
}

async fn show(
    identity: Identity,
    State(state): State<AppState>,
    IdPath(employee_id): IdPath,
) -> ApiResult<Json<Employee>> {
    identity.require_admin()?;
    Ok(Json(state.router.provisioning().employees().get(employee_id).await?))
}

async fn provision(
    identity: Identity,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<ProvisionRequest>,
) -> ApiResult<(StatusCode, Json<Employee>)> {
    identity.require_admin()?;
    let employee = state
        .router
        .provisioning()
        .employees()
        .provision(&req.employee, &req.password)
        .await?;
    Ok((StatusCode::CREATED, Json(employee)))
}

async fn update(
    identity: Identity,
    State(state): State<AppState>,
    IdPath(employee_id): IdPath,
    JsonBody(req): JsonBody<UpdateRequest>,
) -> ApiResult<Json<Employee>> {
    identity.require_admin()?;
    let password = req.password.as_deref().filter(|p| !p.is_empty());
    let employee = state
        .router
        .provisioning()
        .employees()
        .update(employee_id, &req.employee, password)
        .await?;
    Ok(Json(employee))
}

async fn deprovision(
    identity: Identity,
    State(state): State<AppState>,
    IdPath(employee_id): IdPath,
) -> ApiResult<Json<Message>> {
    identity.require_admin()?;
    state
        .router
        .provisioning()
        .employees()
        .deprovision(employee_id)
        .await?;
    Ok(Json(Message::new(format!("Employee {} removed", employee_id))))
}
