use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Invalid artifact key: {0}")]
    InvalidKey(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type ArtifactResult<T> = Result<T, ArtifactError>;

/// Write-only object store for JSON artifacts (per-document analyses and
/// analytics reports).
#[async_trait::async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn put_json(&self, key: &str, value: &serde_json::Value) -> ArtifactResult<()>;
}

/// Artifact store rooted at a local directory. Parent directories are
/// created on demand; keys may not escape the root.
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, key: &str) -> ArtifactResult<PathBuf> {
        let relative = Path::new(key);
        let escapes = relative.components().any(|component| {
            !matches!(component, Component::Normal(_) | Component::CurDir)
        });
        if key.is_empty() || escapes {
            return Err(ArtifactError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait::async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn put_json(&self, key: &str, value: &serde_json::Value) -> ArtifactResult<()> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let body = serde_json::to_vec_pretty(value)?;
        tokio::fs::write(&path, body).await?;
        Ok(())
    }
}

/// Key for a per-document analysis snapshot.
#[must_use]
pub fn analysis_key(stem: &str, uniquifier: Uuid) -> String {
    format!("analysis/{stem}_analysis_{uniquifier}.json")
}

/// Key for an analytics report.
#[must_use]
pub fn report_key(at: DateTime<Utc>) -> String {
    format!("graphs/poi_graph_analysis_{}.json", timestamp_slug(at))
}

/// Compact timestamp used in artifact and visualization keys.
#[must_use]
pub fn timestamp_slug(at: DateTime<Utc>) -> String {
    at.format("%Y%m%d-%H%M%S").to_string()
}
