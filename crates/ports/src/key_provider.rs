//! KeyProvider trait 定义

use authgate_errors::AppResult;

/// 签名密钥来源
///
/// 返回 PEM 文本，由 TokenService 在构造时解析一次
pub trait KeyProvider: Send + Sync {
    /// RSA 私钥（PKCS#1 或 PKCS#8）
    fn private_key(&self) -> AppResult<Vec<u8>>;

    /// RSA 公钥（SPKI）
    fn public_key(&self) -> AppResult<Vec<u8>>;

    /// 公钥 PEM 文本
    fn public_key_pem(&self) -> AppResult<String> {
        let bytes = self.public_key()?;
        String::from_utf8(bytes).map_err(|e| {
            authgate_errors::AppError::key(format!("public key is not valid UTF-8: {}", e))
        })
    }
}
