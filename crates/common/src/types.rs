//! 通用类型定义

use std::str::FromStr;

use derive_more::{Display, From};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 用户 ID（不可变的 subject 标识）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From)]
#[display("{_0}")]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_string(s)
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

/// 哈希后的密码（自描述的 bcrypt 编码：算法 + cost + salt + digest）
#[derive(Debug, Clone)]
pub struct HashedPassword(Secret<String>);

impl HashedPassword {
    /// 从已有的哈希字符串创建
    pub fn from_hash(hash: impl Into<String>) -> Self {
        Self(Secret::new(hash.into()))
    }

    /// 获取字符串引用
    pub fn as_str(&self) -> &str {
        self.0.expose_secret()
    }
}

impl PartialEq for HashedPassword {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for HashedPassword {}
