//! auth-server - 基于 nonce 防重放的登录与账号管理服务

pub mod api;
pub mod application;
pub mod infrastructure;
