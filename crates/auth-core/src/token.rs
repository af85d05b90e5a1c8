//! RS256 令牌签发与校验

use std::time::Duration;

use authgate_common::UserId;
use authgate_errors::{AppError, AppResult, TokenFailure};
use authgate_ports::KeyProvider;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, decode_header, encode,
    errors::ErrorKind,
};
use serde::{Deserialize, Serialize};

/// JWT Claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: UserId,
    pub username: String,
    pub email: String,
    pub admin: bool,
    /// Expiration time
    pub exp: i64,
    /// Issued at
    pub iat: i64,
}

impl Claims {
    pub fn user_id(&self) -> UserId {
        self.sub
    }
}

/// Token 服务
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    public_key_pem: String,
    ttl_secs: i64,
}

impl TokenService {
    /// 从密钥提供者构造，密钥只读取一次
    pub fn new(keys: &dyn KeyProvider, ttl: Duration) -> AppResult<Self> {
        let private_key = keys.private_key()?;
        let encoding_key = EncodingKey::from_rsa_pem(&private_key)
            .map_err(|e| AppError::key(format!("Invalid RSA private key: {}", e)))?;

        let public_key_pem = keys.public_key_pem()?;
        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| AppError::key(format!("Invalid RSA public key: {}", e)))?;

        let ttl_secs = i64::try_from(ttl.as_secs())
            .map_err(|_| AppError::validation("token ttl out of range"))?;

        Ok(Self {
            encoding_key,
            decoding_key,
            public_key_pem,
            ttl_secs,
        })
    }

    /// 签发令牌
    pub fn issue_token(
        &self,
        user_id: &UserId,
        username: &str,
        email: &str,
        admin: bool,
    ) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: *user_id,
            username: username.to_string(),
            email: email.to_string(),
            admin,
            exp: now + self.ttl_secs,
            iat: now,
        };

        encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to sign token: {}", e)))
    }

    /// 验证令牌
    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        match decode_header(token) {
            Ok(header) if header.alg != Algorithm::RS256 => {
                return Err(AppError::token(TokenFailure::InvalidSignature));
            }
            Ok(_) => {}
            // 头部可解析但 alg 不被识别（如 none）
            Err(_) if declared_algorithm(token).is_some() => {
                return Err(AppError::token(TokenFailure::InvalidSignature));
            }
            Err(e) => return Err(AppError::token(classify(e.kind()))),
        }

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AppError::token(classify(e.kind())))
    }

    /// 公钥 PEM 文本
    pub fn public_key_pem(&self) -> &str {
        &self.public_key_pem
    }
}

#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

/// 三段式令牌头部声明的 alg，无论 jsonwebtoken 是否支持该算法
fn declared_algorithm(token: &str) -> Option<String> {
    let mut segments = token.split('.');
    let header = segments.next()?;
    if segments.count() != 2 {
        return None;
    }
    let bytes = URL_SAFE_NO_PAD.decode(header).ok()?;
    serde_json::from_slice::<RawHeader>(&bytes)
        .ok()
        .map(|raw| raw.alg)
}

fn classify(kind: &ErrorKind) -> TokenFailure {
    match kind {
        ErrorKind::ExpiredSignature => TokenFailure::Expired,
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
            TokenFailure::InvalidSignature
        }
        _ => TokenFailure::Malformed,
    }
}
