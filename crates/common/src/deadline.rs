//! 存储调用超时控制
//!
//! 所有对存储协作方的调用都必须在有限时间内返回，后端卡住时以
//! RepositoryError 失败，而不是让请求无限挂起

use std::future::Future;
use std::time::Duration;

use authgate_errors::{AppError, AppResult};
use tracing::warn;

/// 默认存储调用截止时间
pub const DEFAULT_STORAGE_DEADLINE: Duration = Duration::from_secs(5);

/// 在截止时间内执行存储操作
///
/// # 参数
/// - `deadline`: 截止时间
/// - `operation_name`: 操作名称（用于日志）
/// - `operation`: 要执行的异步操作
pub async fn with_deadline<Fut, T>(
    deadline: Duration,
    operation_name: &str,
    operation: Fut,
) -> AppResult<T>
where
    Fut: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout(deadline, operation).await {
        Ok(result) => result,
        Err(_) => {
            warn!(
                operation = operation_name,
                deadline_ms = deadline.as_millis() as u64,
                "Storage call exceeded deadline"
            );
            Err(AppError::repository(format!(
                "{} timed out after {}ms",
                operation_name,
                deadline.as_millis()
            )))
        }
    }
}
