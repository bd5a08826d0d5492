use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::time::timeout;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::database::models::{ContactUpdate, OrganizationMember};
use crate::directory::MemberDirectory;
use crate::error::{OrgError, UpstreamCause};
use crate::hierarchy::{
    AuthorizationValidator, CreatorProfile, IssueCode, ResolvedTerritory, RoleType, TargetRequest, TerritorialClass,
    TerritoryCatalog, ValidationIssue, ValidationOutcome, Zone, DEPARTMENT,
};
use crate::services::identity::{IdentityIssuer, IssuedIdentity};

const DEACTIVATE_PERMISSION: &str = "members:deactivate";

/// Input to `create_member`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMemberRequest {
    pub name: String,
    pub email: String,
    pub target_role: RoleType,
    #[serde(default)]
    pub municipality: Option<String>,
    #[serde(default)]
    pub zone: Option<Zone>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

impl CreateMemberRequest {
    pub fn new(name: impl Into<String>, email: impl Into<String>, target_role: RoleType) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            target_role,
            municipality: None,
            zone: None,
            metadata: None,
        }
    }

    pub fn in_municipality(mut self, municipality: impl Into<String>) -> Self {
        self.municipality = Some(municipality.into());
        self
    }

    pub fn in_zone(mut self, zone: Zone) -> Self {
        self.zone = Some(zone);
        self
    }

    pub fn target(&self) -> TargetRequest {
        TargetRequest {
            role: self.target_role,
            municipality: self.municipality.clone(),
            zone: self.zone,
        }
    }
}

/// A persisted member plus the one-time credential issued for it
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionedMember {
    pub member: OrganizationMember,
    pub temporary_credential: String,
}

/// Wire shape of a creation attempt, successful or not
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateMemberResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member: Option<OrganizationMember>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temporary_credential: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_errors: Option<Vec<ValidationIssue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_role: Option<RoleType>,
}

impl From<&Result<ProvisionedMember, OrgError>> for CreateMemberResponse {
    fn from(result: &Result<ProvisionedMember, OrgError>) -> Self {
        match result {
            Ok(provisioned) => Self {
                success: true,
                member: Some(provisioned.member.clone()),
                temporary_credential: Some(provisioned.temporary_credential.clone()),
                ..Default::default()
            },
            Err(OrgError::ValidationFailed {
                errors,
                suggested_role,
            }) => Self {
                success: false,
                error: Some("validation failed".to_string()),
                validation_errors: Some(errors.clone()),
                suggested_role: *suggested_role,
                ..Default::default()
            },
            Err(other) => Self {
                success: false,
                error: Some(other.to_string()),
                ..Default::default()
            },
        }
    }
}

/// The only mutating entry point into the member directory
#[derive(Clone)]
pub struct ProvisioningService {
    directory: MemberDirectory,
    validator: AuthorizationValidator,
    issuer: Arc<dyn IdentityIssuer>,
    identity_timeout: Duration,
}

impl ProvisioningService {
    pub fn new(
        directory: MemberDirectory,
        validator: AuthorizationValidator,
        issuer: Arc<dyn IdentityIssuer>,
        identity_timeout: Duration,
    ) -> Self {
        Self {
            directory,
            validator,
            issuer,
            identity_timeout,
        }
    }

    pub fn directory(&self) -> &MemberDirectory {
        &self.directory
    }

    pub fn validator(&self) -> &AuthorizationValidator {
        &self.validator
    }

    /// Dry run of the hierarchy checks for a stored creator
    pub async fn validate(&self, creator_id: Uuid, target: &TargetRequest) -> Result<ValidationOutcome, OrgError> {
        let creator = self.load_creator(creator_id).await?;
        Ok(self.validator.validate(&CreatorProfile::from(&creator), target))
    }

    /// Validate, issue an identity, persist the node under the creator.
    ///
    /// A failed insert revokes the identity before the error is returned.
    /// Once the identity is requested the rest runs to completion even if
    /// this future is dropped.
    pub async fn create_member(
        &self,
        creator_id: Uuid,
        request: CreateMemberRequest,
    ) -> Result<ProvisionedMember, OrgError> {
        let problems = check_request(&request.name, &request.email, request.metadata.as_ref());
        if !problems.is_empty() {
            return Err(OrgError::validation(problems));
        }

        let creator = self.load_creator(creator_id).await?;
        if !creator.is_active {
            return Err(OrgError::validation(vec![ValidationIssue::new(
                IssueCode::CreatorInactive,
                format!("creator {} is inactive", creator.id),
            )]));
        }

        let outcome = self
            .validator
            .validate(&CreatorProfile::from(&creator), &request.target());
        if !outcome.allowed {
            info!(
                "Denied {} -> {} for creator {}: {} reason(s)",
                creator.role,
                request.target_role,
                creator.id,
                outcome.errors.len()
            );
            return Err(OrgError::ValidationFailed {
                errors: outcome.errors,
                suggested_role: outcome.suggested_role,
            });
        }

        let provisioned = self
            .provision(Draft {
                name: request.name,
                email: request.email,
                role: request.target_role,
                territory: outcome.resolved,
                reports_to: Some(creator.id),
                metadata: request.metadata.unwrap_or_else(|| json!({})),
            })
            .await?;

        info!(
            "Created member {} as {} under {} ({})",
            provisioned.member.id, provisioned.member.role, creator.id, creator.role
        );
        Ok(provisioned)
    }

    /// Create the department-level root when none is active yet
    pub async fn bootstrap_root(&self, name: &str, email: &str) -> Result<ProvisionedMember, OrgError> {
        let problems = check_request(name, email, None);
        if !problems.is_empty() {
            return Err(OrgError::validation(problems));
        }

        let role = RoleType::DepartmentCoordinator;
        if !self.directory.get_by_role(role, false).await?.is_empty() {
            return Err(OrgError::Conflict(format!("an active {} already exists", role)));
        }

        let root = self
            .provision(Draft {
                name: name.to_string(),
                email: email.to_string(),
                role,
                territory: ResolvedTerritory::default(),
                reports_to: None,
                metadata: json!({ "bootstrap": true }),
            })
            .await?;

        info!("Bootstrapped root member {}", root.member.id);
        Ok(root)
    }

    /// Logical deletion by a superior holding `members:deactivate`
    pub async fn deactivate_member(&self, actor_id: Uuid, member_id: Uuid) -> Result<OrganizationMember, OrgError> {
        let actor = self.load_actor(actor_id).await?;
        if actor_id == member_id {
            return Err(OrgError::Forbidden("members cannot deactivate themselves".to_string()));
        }
        if !actor.has_permission(DEACTIVATE_PERMISSION) {
            return Err(OrgError::Forbidden(format!("{} cannot deactivate members", actor.role)));
        }

        let mut member = self.directory.get_by_id(member_id).await?;
        if !self.directory.is_superior_of(actor_id, member_id).await? {
            return Err(OrgError::Forbidden(format!(
                "member {} is not in the reporting line of {}",
                member_id, actor_id
            )));
        }

        if !member.is_active {
            return Ok(member);
        }

        member.is_active = false;
        member.updated_at = Utc::now();
        self.directory.update(&member).await?;

        info!("Member {} deactivated by {}", member_id, actor_id);
        Ok(member)
    }

    /// Update name and/or metadata; allowed for the member and its superiors
    pub async fn update_contact(
        &self,
        actor_id: Uuid,
        member_id: Uuid,
        update: ContactUpdate,
    ) -> Result<OrganizationMember, OrgError> {
        let mut problems = Vec::new();
        if matches!(update.name.as_deref(), Some(name) if name.trim().is_empty()) {
            problems.push(ValidationIssue::new(IssueCode::InvalidRequest, "name must not be empty"));
        }
        if matches!(update.metadata.as_ref(), Some(meta) if !meta.is_object()) {
            problems.push(ValidationIssue::new(IssueCode::InvalidRequest, "metadata must be a JSON object"));
        }
        if !problems.is_empty() {
            return Err(OrgError::validation(problems));
        }

        let mut member = self.directory.get_by_id(member_id).await?;
        if actor_id != member_id {
            self.load_actor(actor_id).await?;
            if !self.directory.is_superior_of(actor_id, member_id).await? {
                return Err(OrgError::Forbidden(format!(
                    "member {} is not in the reporting line of {}",
                    member_id, actor_id
                )));
            }
        }

        if let Some(name) = update.name {
            member.name = name.trim().to_string();
        }
        if let Some(metadata) = update.metadata {
            member.metadata = metadata;
        }
        member.updated_at = Utc::now();
        self.directory.update(&member).await?;

        Ok(member)
    }

    async fn load_creator(&self, creator_id: Uuid) -> Result<OrganizationMember, OrgError> {
        self.directory
            .find(creator_id)
            .await?
            .ok_or_else(|| OrgError::NotFound(format!("creator not found: {}", creator_id)))
    }

    async fn load_actor(&self, actor_id: Uuid) -> Result<OrganizationMember, OrgError> {
        let actor = self
            .directory
            .find(actor_id)
            .await?
            .ok_or_else(|| OrgError::NotFound(format!("actor not found: {}", actor_id)))?;
        if !actor.is_active {
            return Err(OrgError::Forbidden(format!("actor {} is inactive", actor_id)));
        }
        Ok(actor)
    }

    async fn issue_identity(&self, email: &str) -> Result<IssuedIdentity, OrgError> {
        match timeout(self.identity_timeout, self.issuer.issue(email)).await {
            Ok(Ok(issued)) => Ok(issued),
            Ok(Err(err)) => Err(OrgError::upstream("identity issue", err)),
            Err(_) => {
                warn!("Identity issue for {} timed out; the provider may still complete it", email);
                Err(OrgError::upstream(
                    "identity issue",
                    UpstreamCause::Timeout(self.identity_timeout),
                ))
            }
        }
    }

    /// Issue the identity and insert the node on a detached task. Dropping
    /// the caller's future leaves the task running, so the pair either lands
    /// together or the identity is revoked.
    async fn provision(&self, draft: Draft) -> Result<ProvisionedMember, OrgError> {
        let service = self.clone();
        let task = tokio::spawn(async move {
            let issued = service.issue_identity(&draft.email).await?;
            let member = service.build_member(issued.id, draft);
            service.persist(&member, &issued).await?;
            Ok(ProvisionedMember {
                member,
                temporary_credential: issued.temporary_credential,
            })
        });

        match task.await {
            Ok(result) => result,
            Err(err) => {
                error!("Provisioning task failed: {}", err);
                Err(OrgError::upstream("member provisioning", err))
            }
        }
    }

    /// Insert the node; on failure undo the identity and return the insert error
    async fn persist(&self, member: &OrganizationMember, issued: &IssuedIdentity) -> Result<(), OrgError> {
        let Err(insert_error) = self.directory.insert(member).await else {
            return Ok(());
        };

        warn!("Insert of member {} failed, revoking identity: {}", member.id, insert_error);
        match timeout(self.identity_timeout, self.issuer.revoke(issued.id)).await {
            Ok(Ok(())) => info!("Revoked identity {} after failed insert", issued.id),
            Ok(Err(err)) => error!("Orphaned identity {}: revoke failed: {}", issued.id, err),
            Err(_) => error!("Orphaned identity {}: revoke timed out", issued.id),
        }
        Err(insert_error)
    }

    fn build_member(&self, id: Uuid, draft: Draft) -> OrganizationMember {
        let table = self.validator.table();
        let now = Utc::now();
        OrganizationMember {
            id,
            email: draft.email.trim().to_lowercase(),
            name: draft.name.trim().to_string(),
            role: draft.role,
            zone: draft.territory.zone,
            municipality: draft.territory.municipality.clone(),
            hierarchy_level: table.level_of(draft.role),
            reports_to: draft.reports_to,
            can_create_roles: table.allowed_targets(draft.role).to_vec(),
            managed_territories: managed_territories(draft.role, &draft.territory, self.validator.catalog()),
            permissions: draft.role.permissions(),
            is_active: true,
            metadata: draft.metadata,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Everything needed to build a node once its identity exists
struct Draft {
    name: String,
    email: String,
    role: RoleType,
    territory: ResolvedTerritory,
    reports_to: Option<Uuid>,
    metadata: Value,
}

/// Territories a new member administers, fixed at creation
pub fn managed_territories(role: RoleType, territory: &ResolvedTerritory, catalog: &TerritoryCatalog) -> Vec<String> {
    match role.territorial_class() {
        TerritorialClass::Department => vec![DEPARTMENT.to_string()],
        TerritorialClass::Zone => match territory.zone {
            Some(zone) => std::iter::once(zone.display_name().to_string())
                .chain(catalog.municipalities_in(zone).iter().cloned())
                .collect(),
            None => Vec::new(),
        },
        TerritorialClass::Municipality | TerritorialClass::None => territory
            .municipality
            .clone()
            .or_else(|| territory.zone.map(|z| z.display_name().to_string()))
            .into_iter()
            .collect(),
    }
}

fn check_request(name: &str, email: &str, metadata: Option<&Value>) -> Vec<ValidationIssue> {
    let mut problems = Vec::new();
    if name.trim().is_empty() {
        problems.push(ValidationIssue::new(IssueCode::InvalidRequest, "name must not be empty"));
    }
    let email = email.trim();
    if email.is_empty() || !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
        problems.push(ValidationIssue::new(
            IssueCode::InvalidRequest,
            format!("'{}' is not a valid e-mail address", email),
        ));
    }
    if matches!(metadata, Some(meta) if !meta.is_object()) {
        problems.push(ValidationIssue::new(IssueCode::InvalidRequest, "metadata must be a JSON object"));
    }
    problems
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_coordinators_manage_every_municipality_in_their_zone() {
        let catalog = TerritoryCatalog::cauca();
        let territory = ResolvedTerritory {
            zone: Some(Zone::Occidente),
            municipality: None,
        };
        let managed = managed_territories(RoleType::ZoneCoordinator(Zone::Occidente), &territory, &catalog);
        assert_eq!(managed, vec!["Occidente", "Guapí", "López de Micay", "Timbiquí"]);
    }

    #[test]
    fn municipal_and_department_snapshots() {
        let catalog = TerritoryCatalog::cauca();
        let popayan = ResolvedTerritory {
            zone: Some(Zone::Centro),
            municipality: Some("Popayán".to_string()),
        };
        assert_eq!(managed_territories(RoleType::MunicipalLeader, &popayan, &catalog), vec!["Popayán"]);
        assert_eq!(
            managed_territories(RoleType::DepartmentCoordinator, &ResolvedTerritory::default(), &catalog),
            vec!["Cauca"]
        );

        let zone_only = ResolvedTerritory {
            zone: Some(Zone::Sur),
            municipality: None,
        };
        assert_eq!(managed_territories(RoleType::Voter, &zone_only, &catalog), vec!["Sur"]);
    }

    #[test]
    fn request_checks_catch_blank_fields() {
        let problems = check_request(" ", "not-an-email", Some(&json!([1, 2])));
        assert_eq!(problems.len(), 3);
        assert!(problems.iter().all(|p| p.code == IssueCode::InvalidRequest));
        assert!(check_request("Ana", "ana@example.org", Some(&json!({"phone": "123"}))).is_empty());
    }
}
