//! authgate-common - 通用类型和工具库

pub mod deadline;
pub mod types;

pub use deadline::*;
pub use types::*;
