use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::hierarchy::PolicyError;

/// The five fixed subdivisions of the department
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Norte,
    Centro,
    Sur,
    Oriente,
    Occidente,
}

impl Zone {
    pub const ALL: [Zone; 5] = [Zone::Norte, Zone::Centro, Zone::Sur, Zone::Oriente, Zone::Occidente];

    pub fn slug(&self) -> &'static str {
        match self {
            Zone::Norte => "norte",
            Zone::Centro => "centro",
            Zone::Sur => "sur",
            Zone::Oriente => "oriente",
            Zone::Occidente => "occidente",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Zone::Norte => "Norte",
            Zone::Centro => "Centro",
            Zone::Sur => "Sur",
            Zone::Oriente => "Oriente",
            Zone::Occidente => "Occidente",
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Zone {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Zone::ALL
            .into_iter()
            .find(|zone| zone.slug() == wanted)
            .ok_or_else(|| PolicyError::UnknownZone(s.to_string()))
    }
}

/// Scope a role's authority is measured against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerritorialClass {
    Department,
    Zone,
    Municipality,
    None,
}

/// Closed set of organizational roles.
///
/// Zone coordinators carry their zone in the tag, so `coordinador-zona-norte`
/// and `coordinador-zona-sur` are distinct roles with the same level.
/// Municipal roles stay generic; the municipality travels next to the role
/// on the member rather than inside the role itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoleType {
    DepartmentCoordinator,
    ZoneCoordinator(Zone),
    MunicipalLeader,
    CouncilMember,
    CommunityLeader,
    DigitalInfluencer,
    Collaborator,
    Voter,
    Sympathizer,
}

impl RoleType {
    /// Every role in declaration order, seniority first
    pub const ALL: [RoleType; 13] = [
        RoleType::DepartmentCoordinator,
        RoleType::ZoneCoordinator(Zone::Norte),
        RoleType::ZoneCoordinator(Zone::Centro),
        RoleType::ZoneCoordinator(Zone::Sur),
        RoleType::ZoneCoordinator(Zone::Oriente),
        RoleType::ZoneCoordinator(Zone::Occidente),
        RoleType::MunicipalLeader,
        RoleType::CouncilMember,
        RoleType::CommunityLeader,
        RoleType::DigitalInfluencer,
        RoleType::Collaborator,
        RoleType::Voter,
        RoleType::Sympathizer,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            RoleType::DepartmentCoordinator => "coordinador-departamental",
            RoleType::ZoneCoordinator(Zone::Norte) => "coordinador-zona-norte",
            RoleType::ZoneCoordinator(Zone::Centro) => "coordinador-zona-centro",
            RoleType::ZoneCoordinator(Zone::Sur) => "coordinador-zona-sur",
            RoleType::ZoneCoordinator(Zone::Oriente) => "coordinador-zona-oriente",
            RoleType::ZoneCoordinator(Zone::Occidente) => "coordinador-zona-occidente",
            RoleType::MunicipalLeader => "lider-municipal",
            RoleType::CouncilMember => "concejal",
            RoleType::CommunityLeader => "lider-comunitario",
            RoleType::DigitalInfluencer => "influenciador-digital",
            RoleType::Collaborator => "colaborador",
            RoleType::Voter => "votante",
            RoleType::Sympathizer => "simpatizante",
        }
    }

    /// Human-readable label used in reasons and reports
    pub fn label(&self) -> String {
        match self {
            RoleType::DepartmentCoordinator => "Coordinador Departamental".to_string(),
            RoleType::ZoneCoordinator(zone) => format!("Coordinador Zona {}", zone.display_name()),
            RoleType::MunicipalLeader => "Líder Municipal".to_string(),
            RoleType::CouncilMember => "Concejal".to_string(),
            RoleType::CommunityLeader => "Líder Comunitario".to_string(),
            RoleType::DigitalInfluencer => "Influenciador Digital".to_string(),
            RoleType::Collaborator => "Colaborador".to_string(),
            RoleType::Voter => "Votante".to_string(),
            RoleType::Sympathizer => "Simpatizante".to_string(),
        }
    }

    pub fn territorial_class(&self) -> TerritorialClass {
        match self {
            RoleType::DepartmentCoordinator => TerritorialClass::Department,
            RoleType::ZoneCoordinator(_) => TerritorialClass::Zone,
            RoleType::MunicipalLeader | RoleType::CouncilMember => TerritorialClass::Municipality,
            _ => TerritorialClass::None,
        }
    }

    /// Zone fixed by the role itself, if any
    pub fn bound_zone(&self) -> Option<Zone> {
        match self {
            RoleType::ZoneCoordinator(zone) => Some(*zone),
            _ => None,
        }
    }

    pub fn is_zone_coordinator(&self) -> bool {
        matches!(self, RoleType::ZoneCoordinator(_))
    }

    /// Flat capability strings granted to holders of this role
    pub fn permissions(&self) -> Vec<String> {
        let caps: &[&str] = match self {
            RoleType::DepartmentCoordinator => &[
                "members:create",
                "members:read",
                "members:deactivate",
                "territory:manage",
                "audit:coverage",
                "messages:send",
                "finance:manage",
                "dashboard:view",
            ],
            RoleType::ZoneCoordinator(_) => &[
                "members:create",
                "members:read",
                "members:deactivate",
                "territory:manage",
                "messages:send",
                "finance:view",
                "dashboard:view",
            ],
            RoleType::MunicipalLeader | RoleType::CouncilMember => &[
                "members:create",
                "members:read",
                "messages:send",
                "dashboard:view",
            ],
            RoleType::CommunityLeader | RoleType::DigitalInfluencer | RoleType::Collaborator => {
                &["messages:send", "dashboard:view"]
            }
            RoleType::Voter | RoleType::Sympathizer => &["profile:view"],
        };
        caps.iter().map(|c| c.to_string()).collect()
    }
}

impl fmt::Display for RoleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for RoleType {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        RoleType::ALL
            .into_iter()
            .find(|role| role.slug() == wanted)
            .ok_or_else(|| PolicyError::UnknownRole(s.to_string()))
    }
}

impl Serialize for RoleType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.slug())
    }
}

impl<'de> Deserialize<'de> for RoleType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
