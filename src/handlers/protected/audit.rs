use axum::{extract::State, Extension};

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthMember};
use crate::server::AppState;
use crate::services::CoverageReport;

const AUDIT_PERMISSION: &str = "audit:coverage";

/// GET /api/audit/coverage - structural coverage report
pub async fn audit_coverage(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthMember>,
) -> ApiResult<CoverageReport> {
    if !auth.role.permissions().iter().any(|p| p == AUDIT_PERMISSION) {
        return Err(ApiError::forbidden(format!("{} cannot run coverage audits", auth.role)));
    }

    let report = state.auditor.check_coverage().await?;
    Ok(ApiResponse::success(report))
}
