//! ports - 抽象 trait 层
//!
//! 定义认证核心依赖的存储与密钥接口

mod key_provider;
mod nonce_store;
mod user_repository;

pub use key_provider::*;
pub use nonce_store::*;
pub use user_repository::*;
