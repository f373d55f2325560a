//! Database clients and vector stores.
//!
//! - [`Database`] - PostgreSQL session/message persistence over sqlx
//! - [`VectorStore`] - vector search abstraction; [`PgVectorStore`] is the
//!   pgvector-backed production implementation, [`InMemoryVectorStore`]
//!   exists for tests

pub mod pgvector;
pub mod postgres;
pub mod vectorstore;

pub use pgvector::PgVectorStore;
pub use postgres::Database;
pub use vectorstore::{InMemoryVectorStore, VectorStore};
