pub mod audit;
pub mod auth;
pub mod member;
pub mod policy;
pub mod validate;
