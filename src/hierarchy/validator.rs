use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::database::models::OrganizationMember;
use crate::hierarchy::{HierarchyTable, RoleType, TerritorialClass, TerritoryCatalog, Zone};

/// Machine-readable reason attached to every error and warning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCode {
    // errors
    RoleNotCreatable,
    LevelNotSubordinate,
    TerritoryUnresolved,
    TerritoryInconsistent,
    TerritoryOutOfScope,
    MissingMunicipality,
    ZoneCoordinatorReserved,
    InvalidRequest,
    CreatorInactive,
    // warnings
    TerritoryInherited,
    ZoneDerived,
    MunicipalityIgnored,
    TerritoryIgnored,
}

impl IssueCode {
    /// Wire form, identical to the serialized value
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCode::RoleNotCreatable => "ROLE_NOT_CREATABLE",
            IssueCode::LevelNotSubordinate => "LEVEL_NOT_SUBORDINATE",
            IssueCode::TerritoryUnresolved => "TERRITORY_UNRESOLVED",
            IssueCode::TerritoryInconsistent => "TERRITORY_INCONSISTENT",
            IssueCode::TerritoryOutOfScope => "TERRITORY_OUT_OF_SCOPE",
            IssueCode::MissingMunicipality => "MISSING_MUNICIPALITY",
            IssueCode::ZoneCoordinatorReserved => "ZONE_COORDINATOR_RESERVED",
            IssueCode::InvalidRequest => "INVALID_REQUEST",
            IssueCode::CreatorInactive => "CREATOR_INACTIVE",
            IssueCode::TerritoryInherited => "TERRITORY_INHERITED",
            IssueCode::ZoneDerived => "ZONE_DERIVED",
            IssueCode::MunicipalityIgnored => "MUNICIPALITY_IGNORED",
            IssueCode::TerritoryIgnored => "TERRITORY_IGNORED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub code: IssueCode,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Role and territory of the member asking to create someone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatorProfile {
    pub role: RoleType,
    pub zone: Option<Zone>,
    pub municipality: Option<String>,
}

impl CreatorProfile {
    pub fn new(role: RoleType, zone: Option<Zone>, municipality: Option<&str>) -> Self {
        Self {
            role,
            zone,
            municipality: municipality.map(str::to_string),
        }
    }

    /// Zone coordinators are bound to their zone by role even if the
    /// stored zone column is missing
    fn effective_zone(&self) -> Option<Zone> {
        self.role.bound_zone().or(self.zone)
    }
}

impl From<&OrganizationMember> for CreatorProfile {
    fn from(member: &OrganizationMember) -> Self {
        Self {
            role: member.role,
            zone: member.zone,
            municipality: member.municipality.clone(),
        }
    }
}

/// The role and territory requested for the new member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRequest {
    #[serde(rename = "target_role")]
    pub role: RoleType,
    #[serde(default)]
    pub municipality: Option<String>,
    #[serde(default)]
    pub zone: Option<Zone>,
}

impl TargetRequest {
    pub fn new(role: RoleType) -> Self {
        Self {
            role,
            municipality: None,
            zone: None,
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

    fn explicit_municipality(&self) -> Option<&str> {
        self.municipality.as_deref().map(str::trim).filter(|m| !m.is_empty())
    }
}

/// Territory the new member will be recorded with
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTerritory {
    pub zone: Option<Zone>,
    pub municipality: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub allowed: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub suggested_role: Option<RoleType>,
    pub resolved: ResolvedTerritory,
}

/// Decides whether a creator may instantiate a target role in a territory.
///
/// Every check runs so callers get the complete list of reasons, always in
/// the same order: matrix, level, territory, structural rules. The result
/// depends only on the inputs and the two tables.
#[derive(Debug, Clone)]
pub struct AuthorizationValidator {
    table: Arc<HierarchyTable>,
    catalog: Arc<TerritoryCatalog>,
}

impl AuthorizationValidator {
    pub fn new(table: Arc<HierarchyTable>, catalog: Arc<TerritoryCatalog>) -> Self {
        Self { table, catalog }
    }

    pub fn table(&self) -> &HierarchyTable {
        &self.table
    }

    pub fn catalog(&self) -> &TerritoryCatalog {
        &self.catalog
    }

    pub fn validate(&self, creator: &CreatorProfile, request: &TargetRequest) -> ValidationOutcome {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        self.check_matrix(creator, request, &mut errors);
        self.check_level(creator, request, &mut errors);

        let (resolved, unresolved) = self.resolve_territory(creator, request, &mut errors, &mut warnings);
        if !unresolved {
            self.check_containment(creator, &resolved, &mut errors);
        }
        self.check_structure(creator, request, &resolved, unresolved, &mut errors);

        let allowed = errors.is_empty();
        let suggested_role = if allowed {
            None
        } else {
            self.table.most_senior_creatable(creator.role)
        };

        ValidationOutcome {
            allowed,
            errors,
            warnings,
            suggested_role,
            resolved,
        }
    }

    fn check_matrix(&self, creator: &CreatorProfile, request: &TargetRequest, errors: &mut Vec<ValidationIssue>) {
        if !self.table.can_create(creator.role, request.role) {
            errors.push(ValidationIssue::new(
                IssueCode::RoleNotCreatable,
                format!("role {} cannot create role {}", creator.role, request.role),
            ));
        }
    }

    fn check_level(&self, creator: &CreatorProfile, request: &TargetRequest, errors: &mut Vec<ValidationIssue>) {
        let creator_level = self.table.level_of(creator.role);
        let target_level = self.table.level_of(request.role);
        if creator_level >= target_level {
            errors.push(ValidationIssue::new(
                IssueCode::LevelNotSubordinate,
                format!(
                    "cannot create equal/more-senior level: {} is level {}, {} is level {}",
                    creator.role, creator_level, request.role, target_level
                ),
            ));
        }
    }

    /// Work out the zone/municipality the member would be recorded with.
    /// The flag is set when the requested municipality is not in the catalog.
    fn resolve_territory(
        &self,
        creator: &CreatorProfile,
        request: &TargetRequest,
        errors: &mut Vec<ValidationIssue>,
        warnings: &mut Vec<ValidationIssue>,
    ) -> (ResolvedTerritory, bool) {
        let explicit_municipality = request.explicit_municipality();

        match request.role.territorial_class() {
            TerritorialClass::Department => {
                if explicit_municipality.is_some() || request.zone.is_some() {
                    warnings.push(ValidationIssue::new(
                        IssueCode::TerritoryIgnored,
                        format!("{} covers the whole department; territory ignored", request.role),
                    ));
                }
                return (ResolvedTerritory::default(), false);
            }
            TerritorialClass::Zone => {
                let bound = request.role.bound_zone();
                if let (Some(bound), Some(asked)) = (bound, request.zone) {
                    if bound != asked {
                        errors.push(ValidationIssue::new(
                            IssueCode::TerritoryInconsistent,
                            format!("role {} is bound to zone {}, not {}", request.role, bound, asked),
                        ));
                    }
                }
                if explicit_municipality.is_some() {
                    warnings.push(ValidationIssue::new(
                        IssueCode::MunicipalityIgnored,
                        format!("municipality is ignored for {}", request.role),
                    ));
                }
                let resolved = ResolvedTerritory {
                    zone: bound.or(request.zone),
                    municipality: None,
                };
                return (resolved, false);
            }
            TerritorialClass::Municipality | TerritorialClass::None => {}
        }

        if let Some(raw) = explicit_municipality {
            let Some((canonical, owner)) = self.catalog.resolve(raw) else {
                errors.push(ValidationIssue::new(
                    IssueCode::TerritoryUnresolved,
                    format!("municipality '{}' is not part of the territorial catalog", raw),
                ));
                return (
                    ResolvedTerritory {
                        zone: request.zone,
                        municipality: None,
                    },
                    true,
                );
            };

            match request.zone {
                Some(asked) if asked != owner => {
                    errors.push(ValidationIssue::new(
                        IssueCode::TerritoryInconsistent,
                        format!("municipality {} belongs to zone {}, not {}", canonical, owner, asked),
                    ));
                }
                Some(_) => {}
                None => {
                    warnings.push(ValidationIssue::new(
                        IssueCode::ZoneDerived,
                        format!("zone {} derived from municipality {}", owner, canonical),
                    ));
                }
            }

            return (
                ResolvedTerritory {
                    zone: Some(owner),
                    municipality: Some(canonical.to_string()),
                },
                false,
            );
        }

        // No municipality requested: fall back to the creator's own territory
        let creator_municipality = creator
            .municipality
            .as_deref()
            .and_then(|m| self.catalog.canonical_municipality(m))
            .map(str::to_string);

        let resolved = match request.zone {
            None => ResolvedTerritory {
                zone: creator.effective_zone(),
                municipality: creator_municipality,
            },
            Some(asked) if creator.role.territorial_class() == TerritorialClass::Municipality
                && creator.effective_zone() == Some(asked) =>
            {
                ResolvedTerritory {
                    zone: Some(asked),
                    municipality: creator_municipality,
                }
            }
            Some(asked) => ResolvedTerritory {
                zone: Some(asked),
                municipality: None,
            },
        };

        let inherited = (request.zone.is_none() && resolved.zone.is_some()) || resolved.municipality.is_some();
        if inherited {
            warnings.push(ValidationIssue::new(
                IssueCode::TerritoryInherited,
                format!(
                    "territory inherited from creator: zone {}, municipality {}",
                    resolved.zone.map(|z| z.slug()).unwrap_or("-"),
                    resolved.municipality.as_deref().unwrap_or("-")
                ),
            ));
        }

        (resolved, false)
    }

    fn check_containment(
        &self,
        creator: &CreatorProfile,
        resolved: &ResolvedTerritory,
        errors: &mut Vec<ValidationIssue>,
    ) {
        let violation = match creator.role.territorial_class() {
            TerritorialClass::Department => None,
            TerritorialClass::Zone => match (creator.effective_zone(), resolved.zone) {
                (Some(own), Some(target)) if own == target => None,
                (Some(own), Some(target)) => Some(format!(
                    "{} covers zone {} and cannot act in zone {}",
                    creator.role, own, target
                )),
                (Some(own), None) => Some(format!("{} may only create members inside zone {}", creator.role, own)),
                (None, _) => Some(format!("{} has no assigned zone", creator.role)),
            },
            TerritorialClass::Municipality => {
                let own = creator
                    .municipality
                    .as_deref()
                    .and_then(|m| self.catalog.canonical_municipality(m));
                match (own, resolved.municipality.as_deref()) {
                    (Some(own), Some(target)) if own == target => None,
                    (Some(own), Some(target)) => Some(format!(
                        "{} covers municipality {} and cannot act in {}",
                        creator.role, own, target
                    )),
                    (Some(own), None) => Some(format!(
                        "{} may only create members inside municipality {}",
                        creator.role, own
                    )),
                    (None, _) => Some(format!("{} has no assigned municipality", creator.role)),
                }
            }
            TerritorialClass::None => Some(format!("{} has no territorial authority", creator.role)),
        };

        if let Some(message) = violation {
            errors.push(ValidationIssue::new(IssueCode::TerritoryOutOfScope, message));
        }
    }

    fn check_structure(
        &self,
        creator: &CreatorProfile,
        request: &TargetRequest,
        resolved: &ResolvedTerritory,
        unresolved: bool,
        errors: &mut Vec<ValidationIssue>,
    ) {
        match request.role {
            RoleType::MunicipalLeader if request.explicit_municipality().is_none() => {
                errors.push(ValidationIssue::new(
                    IssueCode::MissingMunicipality,
                    format!("{} requires a municipality", request.role),
                ));
            }
            RoleType::CouncilMember if resolved.municipality.is_none() && !unresolved => {
                errors.push(ValidationIssue::new(
                    IssueCode::MissingMunicipality,
                    format!("{} requires a municipality", request.role),
                ));
            }
            RoleType::ZoneCoordinator(_) if creator.role != RoleType::DepartmentCoordinator => {
                errors.push(ValidationIssue::new(
                    IssueCode::ZoneCoordinatorReserved,
                    format!(
                        "{} can only be created by {}",
                        request.role,
                        RoleType::DepartmentCoordinator
                    ),
                ));
            }
            _ => {}
        }
    }
}
