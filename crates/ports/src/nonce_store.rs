//! NonceStore trait 定义

use async_trait::async_trait;
use authgate_errors::AppResult;
use chrono::{DateTime, Utc};

/// 已签发的挑战（只保存哈希，不保存原始随机字节）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeRecord {
    pub hash: String,
    pub remote_address: String,
    pub issued_at: DateTime<Utc>,
}

/// 挑战存储
#[async_trait]
pub trait NonceStore: Send + Sync {
    /// 保存挑战，覆盖同一地址之前的挑战
    async fn issue(&self, record: ChallengeRecord) -> AppResult<()>;

    /// 原子地查找并删除匹配的挑战，返回是否找到
    ///
    /// 只有 `issued_at` 晚于 `not_older_than` 的挑战才算匹配
    async fn consume_if_valid(
        &self,
        hash: &str,
        remote_address: &str,
        not_older_than: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// 删除 `issued_at` 早于 `older_than` 的挑战，返回删除数量
    async fn sweep(&self, older_than: DateTime<Utc>) -> AppResult<u64>;
}
