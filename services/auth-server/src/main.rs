//! auth-server - 服务入口
//!
//! 使用 authgate-bootstrap 统一启动模式

use std::sync::Arc;

use auth_server::{
    api::{AppState, router},
    application::AuthController,
    infrastructure::NonceSweeper,
};
use authgate_bootstrap::{ServiceContext, run};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    run("config", |ctx: ServiceContext| async move {
        let controller = Arc::new(AuthController::from_infrastructure(&ctx.infra));

        // 后台清理过期 nonce，随关闭信号退出
        NonceSweeper::new(controller.clone(), ctx.infra.config().nonce.sweep_interval())
            .start(ctx.shutdown.token());

        Ok(router(AppState {
            controller,
            infra: ctx.infra,
            metrics: Some(ctx.metrics),
        }))
    })
    .await
}
