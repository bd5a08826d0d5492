use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::{ContactUpdate, OrganizationMember};
use crate::error::{ApiError, OrgError};
use crate::hierarchy::{RoleType, TargetRequest, ValidationOutcome};
use crate::middleware::{ApiResponse, ApiResult, AuthMember};
use crate::server::AppState;
use crate::services::{CreateMemberRequest, CreateMemberResponse};

#[derive(Debug, Default, Deserialize)]
pub struct SubordinatesQuery {
    pub transitive: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RoleMembersQuery {
    pub include_inactive: Option<bool>,
}

/// POST /api/members - create a member reporting to the caller
///
/// Policy denials come back as 422 with every reason in `validation_errors`.
pub async fn member_create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthMember>,
    Json(request): Json<CreateMemberRequest>,
) -> Response {
    let result = state.provisioning.create_member(auth.member_id, request).await;
    let body = CreateMemberResponse::from(&result);

    match result {
        Ok(_) => (StatusCode::CREATED, Json(body)).into_response(),
        Err(OrgError::ValidationFailed { .. }) => (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

/// POST /api/members/validate - dry run of the creation checks
pub async fn member_validate(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthMember>,
    Json(target): Json<TargetRequest>,
) -> ApiResult<ValidationOutcome> {
    let outcome = state.provisioning.validate(auth.member_id, &target).await?;
    Ok(ApiResponse::success(outcome))
}

/// GET /api/members/:id
pub async fn member_get(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<OrganizationMember> {
    let member = state.directory().get_by_id(id).await?;
    Ok(ApiResponse::success(member))
}

/// PATCH /api/members/:id - contact details only
pub async fn member_update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthMember>,
    Path(id): Path<Uuid>,
    Json(update): Json<ContactUpdate>,
) -> ApiResult<OrganizationMember> {
    let member = state.provisioning.update_contact(auth.member_id, id, update).await?;
    Ok(ApiResponse::success(member))
}

/// DELETE /api/members/:id - logical deactivation
pub async fn member_deactivate(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthMember>,
    Path(id): Path<Uuid>,
) -> ApiResult<OrganizationMember> {
    let member = state.provisioning.deactivate_member(auth.member_id, id).await?;
    Ok(ApiResponse::success(member))
}

/// GET /api/members/:id/subordinates?transitive=bool
pub async fn member_subordinates(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<SubordinatesQuery>,
) -> ApiResult<Vec<OrganizationMember>> {
    let directory = state.directory();
    let members = if query.transitive.unwrap_or(false) {
        directory.get_all_subordinates(id).await?
    } else {
        directory.get_direct_subordinates(id).await?
    };
    Ok(ApiResponse::success(members))
}

/// GET /api/members/:id/superiors - nearest superior first
pub async fn member_superiors(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<OrganizationMember>> {
    let chain = state.directory().get_superior_chain(id).await?;
    Ok(ApiResponse::success(chain))
}

/// GET /api/roles/:role/members?include_inactive=bool
pub async fn role_members(
    State(state): State<AppState>,
    Path(role): Path<String>,
    Query(query): Query<RoleMembersQuery>,
) -> ApiResult<Vec<OrganizationMember>> {
    let role = role
        .parse::<RoleType>()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    let members = state
        .directory()
        .get_by_role(role, query.include_inactive.unwrap_or(false))
        .await?;
    Ok(ApiResponse::success(members))
}
