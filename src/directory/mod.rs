// Member directory: lookups and tree walks over the member store.
//
// reports_to is supposed to be acyclic but nothing in the store enforces
// it, so every walk carries a visited set and a depth cap and reports an
// integrity violation instead of looping.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, error};
use uuid::Uuid;

use crate::database::models::OrganizationMember;
use crate::database::{MemberStore, StoreError};
use crate::error::{OrgError, UpstreamCause};
use crate::hierarchy::RoleType;

#[derive(Clone)]
pub struct MemberDirectory {
    store: Arc<dyn MemberStore>,
    max_depth: usize,
    store_timeout: Duration,
}

impl MemberDirectory {
    pub fn new(store: Arc<dyn MemberStore>, max_depth: usize, store_timeout: Duration) -> Self {
        Self {
            store,
            max_depth,
            store_timeout,
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<OrganizationMember, OrgError> {
        self.find(id)
            .await?
            .ok_or_else(|| OrgError::NotFound(format!("member {} not found", id)))
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<OrganizationMember>, OrgError> {
        self.call("member lookup", self.store.find_by_id(id)).await
    }

    pub async fn get_by_role(
        &self,
        role: RoleType,
        include_inactive: bool,
    ) -> Result<Vec<OrganizationMember>, OrgError> {
        self.call("role lookup", self.store.find_by_role(role, include_inactive))
            .await
    }

    pub async fn get_direct_subordinates(&self, id: Uuid) -> Result<Vec<OrganizationMember>, OrgError> {
        let parent = self.get_by_id(id).await?;
        self.children_of(parent.id).await
    }

    /// Every member below `id`, breadth first
    pub async fn get_all_subordinates(&self, id: Uuid) -> Result<Vec<OrganizationMember>, OrgError> {
        let root = self.get_by_id(id).await?;

        let mut visited = HashSet::from([root.id]);
        let mut subordinates = Vec::new();
        let mut frontier = vec![root.id];
        let mut depth = 0;

        while !frontier.is_empty() {
            let mut next = Vec::new();
            for parent in &frontier {
                for child in self.children_of(*parent).await? {
                    if !visited.insert(child.id) {
                        return Err(self.integrity(format!(
                            "cycle detected below member {}: member {} reached twice",
                            id, child.id
                        )));
                    }
                    next.push(child.id);
                    subordinates.push(child);
                }
            }

            if next.is_empty() {
                break;
            }
            depth += 1;
            if depth > self.max_depth {
                return Err(self.integrity(format!(
                    "subordinate tree below member {} exceeds max depth {}",
                    id, self.max_depth
                )));
            }
            frontier = next;
        }

        debug!("Member {} has {} subordinates", id, subordinates.len());
        Ok(subordinates)
    }

    /// Superiors of `id`, nearest first, ending at a root
    pub async fn get_superior_chain(&self, id: Uuid) -> Result<Vec<OrganizationMember>, OrgError> {
        let member = self.get_by_id(id).await?;

        let mut visited = HashSet::from([member.id]);
        let mut chain: Vec<OrganizationMember> = Vec::new();
        let mut next = member.reports_to;

        while let Some(parent_id) = next {
            if !visited.insert(parent_id) {
                return Err(self.integrity(format!(
                    "cycle detected above member {}: member {} reached twice",
                    id, parent_id
                )));
            }
            if chain.len() >= self.max_depth {
                return Err(self.integrity(format!(
                    "superior chain of member {} exceeds max depth {}",
                    id, self.max_depth
                )));
            }

            let parent = self.find(parent_id).await?.ok_or_else(|| {
                let child = chain.last().map(|m| m.id).unwrap_or(id);
                self.integrity(format!("member {} reports to missing member {}", child, parent_id))
            })?;

            next = parent.reports_to;
            chain.push(parent);
        }

        Ok(chain)
    }

    /// Whether `superior_id` sits anywhere above `member_id`
    pub async fn is_superior_of(&self, superior_id: Uuid, member_id: Uuid) -> Result<bool, OrgError> {
        let chain = self.get_superior_chain(member_id).await?;
        Ok(chain.iter().any(|m| m.id == superior_id))
    }

    pub async fn insert(&self, member: &OrganizationMember) -> Result<(), OrgError> {
        self.call("member insert", self.store.insert(member)).await
    }

    pub async fn update(&self, member: &OrganizationMember) -> Result<(), OrgError> {
        self.call("member update", self.store.update(member)).await
    }

    async fn children_of(&self, parent: Uuid) -> Result<Vec<OrganizationMember>, OrgError> {
        self.call("subordinate lookup", self.store.find_by_parent(parent))
            .await
    }

    /// Run a store call under the configured timeout
    async fn call<T, F>(&self, context: &str, fut: F) -> Result<T, OrgError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match timeout(self.store_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(StoreError::Corrupt(err))) => Err(self.integrity(format!("{}: {}", context, err))),
            Ok(Err(err)) => Err(OrgError::upstream(context, err)),
            Err(_) => Err(OrgError::upstream(context, UpstreamCause::Timeout(self.store_timeout))),
        }
    }

    fn integrity(&self, message: String) -> OrgError {
        error!("Integrity violation: {}", message);
        OrgError::IntegrityViolation(message)
    }
}
