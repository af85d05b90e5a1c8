//! 服务启动器
//!
//! 提供统一的 HTTP 服务启动模式

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use authgate_config::AppConfig;
use authgate_errors::AppResult;
use authgate_telemetry::init_metrics;
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::info;

use crate::infrastructure::Infrastructure;
use crate::runtime::{init_runtime, shutdown_signal};
use crate::shutdown::ShutdownController;

/// 传给服务构建闭包的上下文
pub struct ServiceContext {
    pub infra: Arc<Infrastructure>,
    pub metrics: PrometheusHandle,
    pub shutdown: ShutdownController,
}

/// 运行 HTTP 服务
///
/// 1. 加载配置并初始化日志
/// 2. 安装 Prometheus recorder
/// 3. 装配基础设施（存储、密钥、认证服务）
/// 4. 调用闭包构建路由，启动服务并在收到信号后优雅关闭
///
/// # 示例
///
/// ```ignore
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     authgate_bootstrap::run("config", |ctx| async move {
///         Ok(my_router(ctx.infra))
///     })
///     .await
/// }
/// ```
pub async fn run<F, Fut>(config_dir: &str, app_builder: F) -> Result<(), Box<dyn std::error::Error>>
where
    F: FnOnce(ServiceContext) -> Fut,
    Fut: Future<Output = AppResult<Router>>,
{
    let config = AppConfig::load(config_dir)?;
    init_runtime(&config)?;

    info!("Starting {} service", config.app_name);

    let metrics = init_metrics()?;
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    let infra = Arc::new(Infrastructure::from_config(config).await?);
    let shutdown = ShutdownController::new();

    let router = app_builder(ServiceContext {
        infra,
        metrics,
        shutdown: shutdown.clone(),
    })
    .await?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server starting");

    let signal_shutdown = shutdown.clone();
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown_signal().await;
        signal_shutdown.shutdown();
    })
    .await?;

    // 后台任务通过取消令牌退出
    shutdown.shutdown();
    info!("Service stopped");

    Ok(())
}
