use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::auth::{validate_jwt, Claims};
use crate::database::models::OrganizationMember;
use crate::error::ApiError;
use crate::hierarchy::RoleType;
use crate::server::AppState;

/// Authenticated caller; the role comes from the stored member, not the token
#[derive(Clone, Debug)]
pub struct AuthMember {
    pub member_id: Uuid,
    pub role: RoleType,
}

impl From<&OrganizationMember> for AuthMember {
    fn from(member: &OrganizationMember) -> Self {
        Self {
            member_id: member.id,
            role: member.role,
        }
    }
}

/// Validates the bearer token, loads the caller and injects `AuthMember`.
///
/// Tokens of unknown members get 401; deactivated members get 403 even
/// while their token is still valid.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match extract_jwt_from_headers(&headers) {
        Ok(token) => token,
        Err(msg) => return ApiError::unauthorized(msg).into_response(),
    };

    let claims = match validate_jwt(&token, &state.jwt_secret) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!("Rejected bearer token: {}", e);
            return ApiError::unauthorized(e.to_string()).into_response();
        }
    };

    let caller = match active_caller(&state, &claims).await {
        Ok(caller) => caller,
        Err(err) => return err.into_response(),
    };

    request.extensions_mut().insert(caller);

    next.run(request).await
}

async fn active_caller(state: &AppState, claims: &Claims) -> Result<AuthMember, ApiError> {
    let member = state
        .directory()
        .find(claims.sub)
        .await?
        .ok_or_else(|| ApiError::unauthorized(format!("Unknown member: {}", claims.sub)))?;

    if !member.is_active {
        return Err(ApiError::forbidden(format!("Member {} is inactive", member.id)));
    }
    if member.role != claims.role {
        tracing::debug!("Token role {} for {} is stale; using {}", claims.role, member.id, member.role);
    }
    Ok(AuthMember::from(&member))
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(token.trim().to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}
