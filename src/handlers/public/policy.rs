use axum::extract::State;
use serde::Serialize;

use crate::hierarchy::{RoleType, TerritorialClass, Zone};
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct RoleSummary {
    pub role: RoleType,
    pub label: String,
    pub level: u8,
    pub territorial_class: TerritorialClass,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<Zone>,
    pub can_create: Vec<RoleType>,
    pub permissions: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ZoneSummary {
    pub zone: Zone,
    pub name: &'static str,
    pub municipalities: Vec<String>,
}

/// GET /api/policy/roles - every role with its level and creation rights
pub async fn policy_roles(State(state): State<AppState>) -> ApiResult<Vec<RoleSummary>> {
    let table = state.validator().table();
    let roles = RoleType::ALL
        .iter()
        .map(|role| RoleSummary {
            role: *role,
            label: role.label(),
            level: table.level_of(*role),
            territorial_class: table.territorial_class(*role),
            zone: role.bound_zone(),
            can_create: table.allowed_targets(*role).to_vec(),
            permissions: role.permissions(),
        })
        .collect();

    Ok(ApiResponse::success(roles))
}

/// GET /api/policy/zones - the zone partition of the department
pub async fn policy_zones(State(state): State<AppState>) -> ApiResult<Vec<ZoneSummary>> {
    let catalog = state.validator().catalog();
    let zones = catalog
        .zones()
        .map(|zone| ZoneSummary {
            zone,
            name: zone.display_name(),
            municipalities: catalog.municipalities_in(zone).to_vec(),
        })
        .collect();

    Ok(ApiResponse::success(zones))
}
