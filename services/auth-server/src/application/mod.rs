//! 应用层

pub mod commands;
pub mod controller;

pub use commands::*;
pub use controller::AuthController;
