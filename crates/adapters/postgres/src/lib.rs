//! authgate-adapter-postgres - PostgreSQL 适配器

mod connection;
mod error;
mod nonce_store;
mod schema;
mod user_repository;

pub use connection::*;
pub use nonce_store::PgNonceStore;
pub use schema::ensure_schema;
pub use user_repository::PgUserRepository;
