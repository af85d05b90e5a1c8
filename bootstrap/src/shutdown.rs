//! Graceful Shutdown

use tokio_util::sync::CancellationToken;
use tracing::info;

/// Shutdown 控制器
///
/// HTTP 服务与后台任务共享同一个取消令牌
#[derive(Clone, Default)]
pub struct ShutdownController {
    token: CancellationToken,
}

impl ShutdownController {
    pub fn new() -> Self {
        Self::default()
    }

    /// 触发关闭
    pub fn shutdown(&self) {
        info!("Triggering shutdown");
        self.token.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.token.is_cancelled()
    }

    /// 供后台任务使用的子令牌
    pub fn token(&self) -> CancellationToken {
        self.token.child_token()
    }

    /// 等待关闭
    pub async fn wait(&self) {
        self.token.cancelled().await;
    }
}
