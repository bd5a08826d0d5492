// Role hierarchy, territorial catalog and the creation validator.
// Everything in here is pure and built once at startup.

pub mod role;
pub mod table;
pub mod territory;
pub mod validator;

pub use role::{RoleType, TerritorialClass, Zone};
pub use table::{HierarchyTable, MatrixViolation};
pub use territory::{TerritoryCatalog, DEPARTMENT};
pub use validator::{
    AuthorizationValidator, CreatorProfile, IssueCode, ResolvedTerritory, TargetRequest, ValidationIssue,
    ValidationOutcome,
};

use thiserror::Error;

/// Errors raised while parsing or building policy tables
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Unknown zone: {0}")]
    UnknownZone(String),

    #[error("Unknown municipality: {0}")]
    UnknownMunicipality(String),

    #[error("Municipality {municipality} listed under both {first} and {second}")]
    DuplicateMunicipality { municipality: String, first: Zone, second: Zone },

    #[error("Role {0} has no hierarchy level")]
    MissingLevel(RoleType),

    #[error("Role {role} has level {level}, outside 1..=6")]
    LevelOutOfRange { role: RoleType, level: u8 },

    #[error(
        "Creation matrix lets {} (level {}) create {} (level {})",
        .0.creator, .0.creator_level, .0.target, .0.target_level
    )]
    InconsistentMatrix(MatrixViolation),
}
