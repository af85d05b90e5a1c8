//! authgate-auth-core - 认证核心库
//!
//! Nonce 挑战、密码校验、RS256 令牌与账号修改授权

pub mod credential;
pub mod keys;
pub mod nonce;
pub mod policy;
pub mod token;

pub use credential::{CredentialVerifier, MinLengthPolicy, PasswordPolicy};
pub use keys::PemKeyProvider;
pub use nonce::{NonceService, NonceSettings, hash_challenge};
pub use policy::{authorize, authorize_patch, require_admin};
pub use token::{Claims, TokenService};
