//! Storage for field evidence.
//!
//! The pipeline only ever sees the opaque reference a store hands back; the
//! bytes themselves never enter an application record.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use tracing::debug;

use verification::{EvidenceArtifact, GeoTag};

use crate::types::{EntityKind, PipelineError, Result};

/// An artifact captured in the field, before it is stored.
#[derive(Debug, Clone)]
pub struct EvidenceUpload {
    /// MIME type reported by the capture device
    pub content_type: String,
    pub bytes: Vec<u8>,
    pub captured_at: DateTime<Utc>,
    pub geo_tag: GeoTag,
}

/// Persists evidence and returns an opaque reference.
#[async_trait]
pub trait EvidenceStore: Send + Sync {
    /// Store an artifact. Returns the reference to attach to a task.
    async fn put(&self, upload: EvidenceUpload) -> Result<EvidenceArtifact>;

    /// Whether a reference resolves to stored content.
    async fn contains(&self, reference: &str) -> bool;
}

#[derive(Debug, Clone)]
struct StoredEvidence {
    content_type: String,
    bytes: Vec<u8>,
}

/// Content-addressed in-memory store. Identical bytes share one reference.
#[derive(Default)]
pub struct MemoryEvidenceStore {
    blobs: DashMap<String, StoredEvidence>,
}

impl MemoryEvidenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// `sha256-<hex>` of the content.
    pub fn reference_for(bytes: &[u8]) -> String {
        let digest = Sha256::digest(bytes);
        format!("sha256-{}", hex::encode(digest))
    }

    /// Fetch stored bytes and content type.
    pub fn get(&self, reference: &str) -> Result<(String, Vec<u8>)> {
        self.blobs
            .get(reference)
            .map(|stored| (stored.content_type.clone(), stored.bytes.clone()))
            .ok_or_else(|| PipelineError::NotFound {
                kind: EntityKind::Evidence,
                id: reference.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

#[async_trait]
impl EvidenceStore for MemoryEvidenceStore {
    async fn put(&self, upload: EvidenceUpload) -> Result<EvidenceArtifact> {
        if upload.bytes.is_empty() {
            return Err(PipelineError::InvalidEvidence("artifact is empty".to_string()));
        }

        let reference = Self::reference_for(&upload.bytes);
        debug!(%reference, size = upload.bytes.len(), content_type = %upload.content_type, "Evidence stored");
        self.blobs
            .entry(reference.clone())
            .or_insert_with(|| StoredEvidence {
                content_type: upload.content_type,
                bytes: upload.bytes,
            });

        Ok(EvidenceArtifact::new(reference, upload.captured_at, upload.geo_tag))
    }

    async fn contains(&self, reference: &str) -> bool {
        self.blobs.contains_key(reference)
    }
}
