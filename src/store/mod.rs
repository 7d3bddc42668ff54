//! Concrete [`crate::auth::IdentityStore`] backends.

pub mod memory;
pub mod postgres;

pub use memory::MemoryIdentityStore;
pub use postgres::PgIdentityStore;
