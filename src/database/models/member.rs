use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::hierarchy::{PolicyError, RoleType, Zone};

/// One node of the organizational tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationMember {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: RoleType,
    pub zone: Option<Zone>,
    pub municipality: Option<String>,
    pub hierarchy_level: u8,
    pub reports_to: Option<Uuid>,
    // Snapshots taken at creation; never recomputed from the live tables
    pub can_create_roles: Vec<RoleType>,
    pub managed_territories: Vec<String>,
    pub permissions: Vec<String>,
    pub is_active: bool,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrganizationMember {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

/// Fields a member may change after creation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

/// Row shape of the `org_members` table
#[derive(Debug, Clone, FromRow)]
pub struct MemberRow {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
    pub zone: Option<String>,
    pub municipality: Option<String>,
    pub hierarchy_level: i16,
    pub reports_to: Option<Uuid>,
    pub can_create_roles: Vec<String>,
    pub managed_territories: Vec<String>,
    pub permissions: Vec<String>,
    pub is_active: bool,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<MemberRow> for OrganizationMember {
    type Error = PolicyError;

    fn try_from(row: MemberRow) -> Result<Self, Self::Error> {
        let can_create_roles = row
            .can_create_roles
            .iter()
            .map(|r| r.parse())
            .collect::<Result<Vec<RoleType>, _>>()?;

        Ok(Self {
            id: row.id,
            email: row.email,
            name: row.name,
            role: row.role.parse()?,
            zone: row.zone.as_deref().map(str::parse).transpose()?,
            municipality: row.municipality,
            hierarchy_level: u8::try_from(row.hierarchy_level).unwrap_or(u8::MAX),
            reports_to: row.reports_to,
            can_create_roles,
            managed_territories: row.managed_territories,
            permissions: row.permissions,
            is_active: row.is_active,
            metadata: row.metadata,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
