//! 内存 NonceStore

use std::collections::HashMap;

use async_trait::async_trait;
use authgate_errors::AppResult;
use authgate_ports::{ChallengeRecord, NonceStore};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

/// 以 remote address 为键，每个地址最多一个挑战
#[derive(Debug, Default)]
pub struct MemoryNonceStore {
    challenges: Mutex<HashMap<String, ChallengeRecord>>,
}

impl MemoryNonceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, remote_address: &str) -> Option<ChallengeRecord> {
        self.challenges.lock().get(remote_address).cloned()
    }

    pub fn len(&self) -> usize {
        self.challenges.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.challenges.lock().is_empty()
    }
}

#[async_trait]
impl NonceStore for MemoryNonceStore {
    async fn issue(&self, record: ChallengeRecord) -> AppResult<()> {
        self.challenges
            .lock()
            .insert(record.remote_address.clone(), record);
        Ok(())
    }

    async fn consume_if_valid(
        &self,
        hash: &str,
        remote_address: &str,
        not_older_than: DateTime<Utc>,
    ) -> AppResult<bool> {
        let mut challenges = self.challenges.lock();
        let matches = challenges
            .get(remote_address)
            .is_some_and(|c| c.hash == hash && c.issued_at > not_older_than);
        if matches {
            challenges.remove(remote_address);
        }
        Ok(matches)
    }

    async fn sweep(&self, older_than: DateTime<Utc>) -> AppResult<u64> {
        let mut challenges = self.challenges.lock();
        let before = challenges.len();
        challenges.retain(|_, c| c.issued_at >= older_than);
        Ok((before - challenges.len()) as u64)
    }
}
