//! Nonce 挑战签发与一次性消费
//!
//! 令牌为 64 字节随机数的 base64url 编码，存储端只保存原始字节的
//! SHA3-512 十六进制摘要

use std::sync::Arc;
use std::time::Duration;

use authgate_common::{DEFAULT_STORAGE_DEADLINE, with_deadline};
use authgate_errors::{AppError, AppResult, NonceFailure};
use authgate_ports::{ChallengeRecord, NonceStore};
use authgate_telemetry::names;
use base64::{Engine, engine::general_purpose::URL_SAFE};
use chrono::Utc;
use metrics::counter;
use rand::{RngCore, rngs::OsRng};
use sha3::{Digest, Sha3_512};
use tracing::{debug, info, warn};

/// 随机字节数
pub const NONCE_BYTES: usize = 64;

/// 默认有效期
pub const DEFAULT_NONCE_TTL: Duration = Duration::from_secs(5 * 60);

/// 计算挑战摘要
pub fn hash_challenge(raw: &[u8]) -> String {
    hex::encode(Sha3_512::digest(raw))
}

/// NonceService 构造参数
#[derive(Debug, Clone)]
pub struct NonceSettings {
    pub ttl: Duration,
    pub deadline: Duration,
    /// 跳过消费，需要 insecure-nonce-bypass 特性且不在生产环境
    pub bypass: bool,
    pub production: bool,
}

impl Default for NonceSettings {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_NONCE_TTL,
            deadline: DEFAULT_STORAGE_DEADLINE,
            bypass: false,
            production: false,
        }
    }
}

/// Nonce 服务
#[derive(Clone)]
pub struct NonceService {
    store: Arc<dyn NonceStore>,
    ttl: chrono::Duration,
    deadline: Duration,
    #[cfg(feature = "insecure-nonce-bypass")]
    bypass: bool,
}

impl NonceService {
    pub fn new(store: Arc<dyn NonceStore>, settings: NonceSettings) -> AppResult<Self> {
        let ttl = chrono::Duration::from_std(settings.ttl)
            .map_err(|_| AppError::validation("nonce ttl out of range"))?;

        #[cfg(not(feature = "insecure-nonce-bypass"))]
        if settings.bypass {
            warn!("Nonce bypass requested but not compiled in, ignoring");
        }

        Ok(Self {
            store,
            ttl,
            deadline: settings.deadline,
            #[cfg(feature = "insecure-nonce-bypass")]
            bypass: resolve_bypass(settings.bypass, settings.production),
        })
    }

    /// 签发挑战，覆盖该地址之前的挑战
    pub async fn issue_challenge(&self, remote_address: &str) -> AppResult<String> {
        let mut raw = [0u8; NONCE_BYTES];
        OsRng.fill_bytes(&mut raw);

        let record = ChallengeRecord {
            hash: hash_challenge(&raw),
            remote_address: remote_address.to_string(),
            issued_at: Utc::now(),
        };

        with_deadline(self.deadline, "nonce_store.issue", self.store.issue(record)).await?;

        counter!(names::NONCE_ISSUED).increment(1);
        debug!(remote_address, "Issued nonce");

        Ok(URL_SAFE.encode(raw))
    }

    /// 消费挑战，成功后该挑战不可再用
    pub async fn consume_challenge(&self, token: &str, remote_address: &str) -> AppResult<()> {
        #[cfg(feature = "insecure-nonce-bypass")]
        if self.bypass {
            warn!(remote_address, "Nonce consumption bypassed");
            return Ok(());
        }

        let raw = match URL_SAFE.decode(token) {
            Ok(raw) if raw.len() == NONCE_BYTES => raw,
            _ => {
                counter!(names::NONCE_CONSUMED, "outcome" => "malformed").increment(1);
                return Err(AppError::nonce(NonceFailure::Malformed));
            }
        };

        let not_older_than = Utc::now() - self.ttl;
        let hash = hash_challenge(&raw);
        let found = with_deadline(
            self.deadline,
            "nonce_store.consume_if_valid",
            self.store
                .consume_if_valid(&hash, remote_address, not_older_than),
        )
        .await?;

        if !found {
            counter!(names::NONCE_CONSUMED, "outcome" => "rejected").increment(1);
            debug!(remote_address, "Nonce invalid or expired");
            return Err(AppError::nonce(NonceFailure::InvalidOrExpired));
        }

        counter!(names::NONCE_CONSUMED, "outcome" => "accepted").increment(1);
        Ok(())
    }

    /// 清理过期挑战，返回删除数量
    pub async fn sweep_expired(&self) -> AppResult<u64> {
        let older_than = Utc::now() - self.ttl;
        let removed =
            with_deadline(self.deadline, "nonce_store.sweep", self.store.sweep(older_than)).await?;
        if removed > 0 {
            info!(removed, "Swept expired nonces");
        }
        Ok(removed)
    }
}

#[cfg(feature = "insecure-nonce-bypass")]
fn resolve_bypass(requested: bool, production: bool) -> bool {
    if !requested {
        return false;
    }
    if production {
        warn!("Nonce bypass ignored in production");
        return false;
    }
    warn!("Nonce bypass enabled, replay protection is off");
    true
}
