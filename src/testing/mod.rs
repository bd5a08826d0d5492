// Fixtures shared by unit tests across modules

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::database::models::OrganizationMember;
use crate::database::{MemberStore, MemoryMemberStore};
use crate::directory::MemberDirectory;
use crate::hierarchy::{HierarchyTable, RoleType, TerritorialClass, Zone};

/// A member with plausible territory for its role
pub fn member(role: RoleType, reports_to: Option<Uuid>) -> OrganizationMember {
    let (zone, municipality) = match role.territorial_class() {
        TerritorialClass::Department => (None, None),
        TerritorialClass::Zone => (role.bound_zone(), None),
        _ => (Some(Zone::Centro), Some("Popayán".to_string())),
    };
    build(role, zone, municipality, reports_to)
}

/// A member reporting to `parent`, sharing its territory
pub fn member_under(role: RoleType, parent: &OrganizationMember) -> OrganizationMember {
    let zone = role.bound_zone().or(parent.zone);
    let municipality = if role.is_zone_coordinator() {
        None
    } else {
        parent.municipality.clone()
    };
    build(role, zone, municipality, Some(parent.id))
}

pub fn member_in(role: RoleType, municipality: &str, zone: Zone, reports_to: Option<Uuid>) -> OrganizationMember {
    build(role, Some(zone), Some(municipality.to_string()), reports_to)
}

fn build(
    role: RoleType,
    zone: Option<Zone>,
    municipality: Option<String>,
    reports_to: Option<Uuid>,
) -> OrganizationMember {
    let table = HierarchyTable::standard();
    let id = Uuid::new_v4();
    let now = Utc::now();
    OrganizationMember {
        id,
        email: format!("{}@example.org", id.simple()),
        name: role.label(),
        role,
        zone,
        municipality,
        hierarchy_level: table.level_of(role),
        reports_to,
        can_create_roles: table.allowed_targets(role).to_vec(),
        managed_territories: Vec::new(),
        permissions: role.permissions(),
        is_active: true,
        metadata: json!({}),
        created_at: now,
        updated_at: now,
    }
}

/// A directory over a fresh in-memory store seeded with `members`
pub async fn directory_with(members: Vec<OrganizationMember>) -> (MemberDirectory, Arc<MemoryMemberStore>) {
    let store = Arc::new(MemoryMemberStore::new());
    for m in &members {
        store.insert(m).await.expect("seed member");
    }
    let directory = MemberDirectory::new(store.clone(), 16, Duration::from_secs(1));
    (directory, store)
}
