pub mod member;

pub use member::{ContactUpdate, MemberRow, OrganizationMember};
