pub mod audit;
pub mod identity;
pub mod provisioning;

pub use audit::{CoverageReport, StructuralAuditor};
pub use identity::{IdentityError, IdentityIssuer, IssuedIdentity, LocalIdentityIssuer};
pub use provisioning::{CreateMemberRequest, CreateMemberResponse, ProvisionedMember, ProvisioningService};
