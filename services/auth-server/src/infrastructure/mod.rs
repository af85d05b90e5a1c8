//! 基础设施层

pub mod sweeper;

pub use sweeper::NonceSweeper;
