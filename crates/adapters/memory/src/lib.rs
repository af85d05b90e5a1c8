//! authgate-adapter-memory - 进程内存储适配器
//!
//! 与 PostgreSQL 适配器相同的契约，用于测试和无数据库的本地运行

mod nonce_store;
mod user_repository;

pub use nonce_store::MemoryNonceStore;
pub use user_repository::MemoryUserRepository;
