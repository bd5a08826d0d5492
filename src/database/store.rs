use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::database::models::OrganizationMember;
use crate::hierarchy::{PolicyError, RoleType};

/// Errors from a member store backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Member not found: {0}")]
    NotFound(Uuid),

    #[error("Member already exists: {0}")]
    Conflict(Uuid),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Corrupt member row: {0}")]
    Corrupt(#[from] PolicyError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Persistence seam for organization members.
///
/// The store does not check parentage or acyclicity; that is the provisioning
/// service's job. `insert` must be atomic per id. `update` only touches the
/// mutable columns (name, metadata, is_active, updated_at).
#[async_trait]
pub trait MemberStore: Send + Sync {
    async fn insert(&self, member: &OrganizationMember) -> Result<(), StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<OrganizationMember>, StoreError>;

    /// Members holding `role`, oldest first
    async fn find_by_role(
        &self,
        role: RoleType,
        include_inactive: bool,
    ) -> Result<Vec<OrganizationMember>, StoreError>;

    /// Members whose `reports_to` is `parent`, oldest first
    async fn find_by_parent(&self, parent: Uuid) -> Result<Vec<OrganizationMember>, StoreError>;

    async fn update(&self, member: &OrganizationMember) -> Result<(), StoreError>;
}

pub(crate) fn sort_oldest_first(members: &mut [OrganizationMember]) {
    members.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
}
