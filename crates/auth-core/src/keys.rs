//! PEM 文件密钥提供者

use std::path::Path;

use authgate_errors::{AppError, AppResult};
use authgate_ports::KeyProvider;
use tracing::info;

/// 从 PEM 文本加载 RSA 密钥对
#[derive(Clone)]
pub struct PemKeyProvider {
    private_pem: Vec<u8>,
    public_pem: Vec<u8>,
}

impl PemKeyProvider {
    pub fn from_pem(private_pem: impl Into<Vec<u8>>, public_pem: impl Into<Vec<u8>>) -> Self {
        Self {
            private_pem: private_pem.into(),
            public_pem: public_pem.into(),
        }
    }

    /// 从文件读取密钥对
    pub fn from_files(private_path: &Path, public_path: &Path) -> AppResult<Self> {
        let private_pem = read_key(private_path)?;
        let public_pem = read_key(public_path)?;

        info!(
            private_key = %private_path.display(),
            public_key = %public_path.display(),
            "Loaded signing keys"
        );

        Ok(Self::from_pem(private_pem, public_pem))
    }
}

fn read_key(path: &Path) -> AppResult<Vec<u8>> {
    let bytes = std::fs::read(path)
        .map_err(|e| AppError::key(format!("Failed to read {}: {}", path.display(), e)))?;
    if bytes.is_empty() {
        return Err(AppError::key(format!("{} is empty", path.display())));
    }
    Ok(bytes)
}

impl KeyProvider for PemKeyProvider {
    fn private_key(&self) -> AppResult<Vec<u8>> {
        Ok(self.private_pem.clone())
    }

    fn public_key(&self) -> AppResult<Vec<u8>> {
        Ok(self.public_pem.clone())
    }
}

impl std::fmt::Debug for PemKeyProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PemKeyProvider")
            .field("private_pem", &"[REDACTED]")
            .field("public_pem_len", &self.public_pem.len())
            .finish()
    }
}
