use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::models::OrganizationMember;
use crate::database::store::{sort_oldest_first, MemberStore, StoreError};
use crate::hierarchy::RoleType;

/// In-process member store used for development and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryMemberStore {
    members: Arc<RwLock<HashMap<Uuid, OrganizationMember>>>,
}

impl MemoryMemberStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.members.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.members.read().await.is_empty()
    }
}

#[async_trait]
impl MemberStore for MemoryMemberStore {
    async fn insert(&self, member: &OrganizationMember) -> Result<(), StoreError> {
        let mut members = self.members.write().await;
        match members.entry(member.id) {
            Entry::Occupied(_) => Err(StoreError::Conflict(member.id)),
            Entry::Vacant(slot) => {
                slot.insert(member.clone());
                Ok(())
            }
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<OrganizationMember>, StoreError> {
        Ok(self.members.read().await.get(&id).cloned())
    }

    async fn find_by_role(
        &self,
        role: RoleType,
        include_inactive: bool,
    ) -> Result<Vec<OrganizationMember>, StoreError> {
        let mut found: Vec<_> = self
            .members
            .read()
            .await
            .values()
            .filter(|m| m.role == role && (include_inactive || m.is_active))
            .cloned()
            .collect();
        sort_oldest_first(&mut found);
        Ok(found)
    }

    async fn find_by_parent(&self, parent: Uuid) -> Result<Vec<OrganizationMember>, StoreError> {
        let mut found: Vec<_> = self
            .members
            .read()
            .await
            .values()
            .filter(|m| m.reports_to == Some(parent))
            .cloned()
            .collect();
        sort_oldest_first(&mut found);
        Ok(found)
    }

    async fn update(&self, member: &OrganizationMember) -> Result<(), StoreError> {
        let mut members = self.members.write().await;
        let stored = members.get_mut(&member.id).ok_or(StoreError::NotFound(member.id))?;
        stored.name = member.name.clone();
        stored.metadata = member.metadata.clone();
        stored.is_active = member.is_active;
        stored.updated_at = member.updated_at;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::member;

    #[tokio::test]
    async fn insert_is_atomic_per_id() {
        let store = MemoryMemberStore::new();
        let root = member(RoleType::DepartmentCoordinator, None);

        store.insert(&root).await.unwrap();
        let err = store.insert(&root).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(id) if id == root.id));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn find_by_role_skips_inactive_unless_asked() {
        let store = MemoryMemberStore::new();
        let active = member(RoleType::Voter, None);
        let mut retired = member(RoleType::Voter, None);
        retired.is_active = false;
        store.insert(&active).await.unwrap();
        store.insert(&retired).await.unwrap();

        assert_eq!(store.find_by_role(RoleType::Voter, false).await.unwrap().len(), 1);
        assert_eq!(store.find_by_role(RoleType::Voter, true).await.unwrap().len(), 2);
        assert!(store.find_by_role(RoleType::Sympathizer, true).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_only_touches_mutable_fields() {
        let store = MemoryMemberStore::new();
        let original = member(RoleType::Collaborator, None);
        store.insert(&original).await.unwrap();

        let mut changed = original.clone();
        changed.name = "Renamed".to_string();
        changed.is_active = false;
        changed.role = RoleType::DepartmentCoordinator;
        store.update(&changed).await.unwrap();

        let stored = store.find_by_id(original.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Renamed");
        assert!(!stored.is_active);
        assert_eq!(stored.role, RoleType::Collaborator);
    }
}
