//! Job persistence.
//!
//! - [`JobRepository`]: the storage contract shared by all backends
//! - [`PgJobRepository`]: `PostgreSQL` via a `sqlx` pool (production)
//! - [`InMemoryJobRepository`]: `DashMap`-backed, same semantics (local runs, tests)

pub mod memory;
pub mod postgres;
pub mod repository;

pub use memory::InMemoryJobRepository;
pub use postgres::PgJobRepository;
pub use repository::{JobRepository, RepositoryError};
