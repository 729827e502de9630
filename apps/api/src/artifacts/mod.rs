//! Artifact storage: where generated PDF and DOCX bytes live.
//!
//! Two backends behind one trait: local filesystem (`FsArtifactStore`) and
//! S3 / MinIO (`S3ArtifactStore`). The backend is picked at startup from config.

use async_trait::async_trait;
use bytes::Bytes;
use rand::distributions::Alphanumeric;
use rand::Rng;
use thiserror::Error;
use uuid::Uuid;

pub mod fs;
pub mod s3;

pub use fs::FsArtifactStore;
pub use s3::S3ArtifactStore;

/// Every generated artifact is stored under this prefix.
pub const RESUME_PREFIX: &str = "resumes/";

const KEY_TOKEN_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid artifact key: {0}")]
    InvalidKey(String),

    #[error("S3 error on '{key}': {message}")]
    S3 { key: String, message: String },
}

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Stores `bytes` under `key`. The object becomes visible only once fully written.
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<(), StorageError>;

    /// Returns `None` when nothing is stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<Bytes>, StorageError>;

    /// Removing an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Removes leftovers of writes that never completed and returns how many.
    /// Backends whose writes are atomic have nothing to sweep.
    async fn sweep_incomplete(&self) -> Result<usize, StorageError> {
        Ok(0)
    }
}

/// The two artifact kinds produced per generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Pdf,
    Docx,
}

impl ArtifactKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pdf" => Some(ArtifactKind::Pdf),
            "docx" => Some(ArtifactKind::Docx),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ArtifactKind::Pdf => "pdf",
            ArtifactKind::Docx => "docx",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ArtifactKind::Pdf => "application/pdf",
            ArtifactKind::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

/// Builds the storage key for one artifact of a record.
///
/// Layout: `resumes/<identity>/<record>/<token>.<ext>`. The random token keeps keys
/// unguessable from the record id and unique across generations.
pub fn artifact_key(identity_id: Uuid, record_id: Uuid, kind: ArtifactKind) -> String {
    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(KEY_TOKEN_LEN)
        .map(char::from)
        .collect();
    format!(
        "{RESUME_PREFIX}{identity_id}/{record_id}/{token}.{}",
        kind.extension()
    )
}

/// Rejects keys that could escape the storage root.
pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && !key.starts_with('/')
        && key.split('/').all(|segment| {
            !segment.is_empty()
                && segment != "."
                && segment != ".."
                && !segment.starts_with('.')
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        });
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}
