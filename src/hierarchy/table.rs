use std::collections::HashMap;

use serde::Serialize;

use crate::hierarchy::{PolicyError, RoleType, TerritorialClass, Zone};

pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 6;

/// A creation-matrix entry that breaks the level ordering
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatrixViolation {
    pub creator: RoleType,
    pub creator_level: u8,
    pub target: RoleType,
    pub target_level: u8,
}

/// Seniority levels and the creation matrix.
///
/// This is the single source of truth for who outranks whom and who may
/// instantiate whom. Organizational policy changes go here, not into the
/// validator.
#[derive(Debug, Clone)]
pub struct HierarchyTable {
    levels: HashMap<RoleType, u8>,
    matrix: HashMap<RoleType, Vec<RoleType>>,
}

impl HierarchyTable {
    /// Build a custom table. Every role needs a level in 1..=6 and every
    /// matrix entry must point at a strictly junior role.
    pub fn new(
        levels: HashMap<RoleType, u8>,
        matrix: HashMap<RoleType, Vec<RoleType>>,
    ) -> Result<Self, PolicyError> {
        for role in RoleType::ALL {
            match levels.get(&role) {
                None => return Err(PolicyError::MissingLevel(role)),
                Some(&level) if !(MIN_LEVEL..=MAX_LEVEL).contains(&level) => {
                    return Err(PolicyError::LevelOutOfRange { role, level })
                }
                Some(_) => {}
            }
        }

        let table = Self { levels, matrix };
        if let Some(first) = table.consistency_violations().into_iter().next() {
            return Err(PolicyError::InconsistentMatrix(first));
        }
        Ok(table)
    }

    /// The organization's standard policy
    pub fn standard() -> Self {
        use RoleType::*;

        let levels = RoleType::ALL
            .into_iter()
            .map(|role| {
                let level = match role {
                    DepartmentCoordinator => 1,
                    ZoneCoordinator(_) => 2,
                    MunicipalLeader => 3,
                    CouncilMember => 4,
                    CommunityLeader | DigitalInfluencer | Collaborator => 5,
                    Voter | Sympathizer => 6,
                };
                (role, level)
            })
            .collect();

        let grassroots = [CommunityLeader, DigitalInfluencer, Collaborator, Voter, Sympathizer];

        let mut department = Zone::ALL.iter().map(|z| ZoneCoordinator(*z)).collect::<Vec<_>>();
        department.extend([MunicipalLeader, CouncilMember]);
        department.extend(grassroots);

        let mut zone = vec![MunicipalLeader, CouncilMember];
        zone.extend(grassroots);

        let mut municipal = vec![CouncilMember];
        municipal.extend(grassroots);

        let council = vec![CommunityLeader, Collaborator, Voter, Sympathizer];

        let mut matrix = HashMap::new();
        matrix.insert(DepartmentCoordinator, department);
        for z in Zone::ALL {
            matrix.insert(ZoneCoordinator(z), zone.clone());
        }
        matrix.insert(MunicipalLeader, municipal);
        matrix.insert(CouncilMember, council);

        Self { levels, matrix }
    }

    pub fn level_of(&self, role: RoleType) -> u8 {
        // construction guarantees every role has a level
        self.levels.get(&role).copied().unwrap_or(MAX_LEVEL)
    }

    pub fn allowed_targets(&self, role: RoleType) -> &[RoleType] {
        self.matrix.get(&role).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn can_create(&self, creator: RoleType, target: RoleType) -> bool {
        self.allowed_targets(creator).contains(&target)
    }

    pub fn territorial_class(&self, role: RoleType) -> TerritorialClass {
        role.territorial_class()
    }

    /// Most senior role the creator may still instantiate
    pub fn most_senior_creatable(&self, creator: RoleType) -> Option<RoleType> {
        self.allowed_targets(creator)
            .iter()
            .copied()
            .enumerate()
            .min_by_key(|(position, role)| (self.level_of(*role), *position))
            .map(|(_, role)| role)
    }

    /// Matrix entries whose target is not strictly junior to the creator
    pub fn consistency_violations(&self) -> Vec<MatrixViolation> {
        let mut violations = Vec::new();
        for creator in RoleType::ALL {
            let creator_level = self.level_of(creator);
            for &target in self.allowed_targets(creator) {
                let target_level = self.level_of(target);
                if target_level <= creator_level {
                    violations.push(MatrixViolation {
                        creator,
                        creator_level,
                        target,
                        target_level,
                    });
                }
            }
        }
        violations
    }
}

impl Default for HierarchyTable {
    fn default() -> Self {
        Self::standard()
    }
}
