//! authgate-bootstrap - 服务启动骨架
//!
//! 配置加载、日志初始化、基础设施装配与优雅关闭

mod infrastructure;
mod retry;
mod runtime;
mod shutdown;
mod starter;

pub use infrastructure::*;
pub use retry::*;
pub use runtime::*;
pub use shutdown::*;
pub use starter::*;
