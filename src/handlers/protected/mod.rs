// Protected handlers: every route sits behind jwt_auth_middleware and
// receives the caller as Extension<AuthMember>
pub mod audit;
pub mod members;

pub use audit::audit_coverage;
pub use members::{
    member_create, member_deactivate, member_get, member_superiors, member_subordinates, member_update,
    member_validate, role_members,
};
