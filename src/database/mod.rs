pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryMemberStore;
pub use postgres::PgMemberStore;
pub use store::{MemberStore, StoreError};
