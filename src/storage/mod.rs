//! Artifact Storage
//!
//! Stores job outputs under deterministic keys (`<kind>/<job_id>/<file>`)
//! and issues time-limited signed URLs for them.

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tokio::fs;
use tracing::info;

use crate::error::{PipelineError, PipelineResult};

type HmacSha256 = Hmac<Sha256>;

pub const FORMATTED_PREFIX: &str = "formatted_docs";
pub const AUDIT_PREFIX: &str = "audit_reports";
pub const UPLOAD_PREFIX: &str = "uploads";

pub fn formatted_key(job_id: &str, filename: &str) -> String {
    format!("{}/{}/{}", FORMATTED_PREFIX, job_id, filename)
}

pub fn audit_key(job_id: &str, filename: &str) -> String {
    format!("{}/{}/audit_{}", AUDIT_PREFIX, job_id, filename)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactHandle {
    pub key: String,
    pub size: u64,
}

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn store(&self, local: &Path, key: &str) -> PipelineResult<ArtifactHandle>;

    async fn load(&self, key: &str) -> PipelineResult<Vec<u8>>;

    async fn exists(&self, key: &str) -> bool;

    fn signed_url(&self, key: &str, ttl: Duration) -> PipelineResult<String>;
}

/// Filesystem-backed store. URLs point at the service's own
/// `/artifacts/{key}` route and carry an HMAC-SHA256 signature.
pub struct LocalArtifactStore {
    root: PathBuf,
    base_url: String,
    secret: Vec<u8>,
}

impl LocalArtifactStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>, secret: impl AsRef<[u8]>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret: secret.as_ref().to_vec(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Keys are relative paths of plain components only.
    pub fn path_for(&self, key: &str) -> PipelineResult<PathBuf> {
        let relative = Path::new(key);
        let plain = !key.is_empty() && relative.components().all(|c| matches!(c, Component::Normal(_)));
        if !plain {
            return Err(PipelineError::InvalidInput(format!("invalid artifact key '{}'", key)));
        }
        Ok(self.root.join(relative))
    }

    fn mac(&self) -> PipelineResult<HmacSha256> {
        HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| PipelineError::InvalidConfiguration(format!("signing key: {}", e)))
    }

    pub fn sign(&self, key: &str, expires: i64) -> PipelineResult<String> {
        let mut mac = self.mac()?;
        mac.update(format!("{}\n{}", key, expires).as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Checks expiry and signature for a request to `key`.
    pub fn verify(&self, key: &str, expires: i64, signature: &str) -> PipelineResult<()> {
        if expires < Utc::now().timestamp() {
            return Err(PipelineError::InvalidInput("link has expired".into()));
        }
        let signature = hex::decode(signature)
            .map_err(|_| PipelineError::InvalidInput("malformed signature".into()))?;
        let mut mac = self.mac()?;
        mac.update(format!("{}\n{}", key, expires).as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| PipelineError::InvalidInput("signature mismatch".into()))
    }
}

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    async fn store(&self, local: &Path, key: &str) -> PipelineResult<ArtifactHandle> {
        let target = self.path_for(key)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }
        let size = fs::copy(local, &target).await?;
        info!("Stored artifact {} ({} bytes)", key, size);
        Ok(ArtifactHandle { key: key.to_string(), size })
    }

    async fn load(&self, key: &str) -> PipelineResult<Vec<u8>> {
        let path = self.path_for(key)?;
        Ok(fs::read(path).await?)
    }

    async fn exists(&self, key: &str) -> bool {
        match self.path_for(key) {
            Ok(path) => fs::metadata(path).await.map(|m| m.is_file()).unwrap_or(false),
            Err(_) => false,
        }
    }

    fn signed_url(&self, key: &str, ttl: Duration) -> PipelineResult<String> {
        self.path_for(key)?;
        let expires = Utc::now().timestamp() + ttl.as_secs() as i64;
        let sig = self.sign(key, expires)?;
        Ok(format!("{}/artifacts/{}?expires={}&sig={}", self.base_url, key, expires, sig))
    }
}
