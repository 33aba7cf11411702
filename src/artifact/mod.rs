//! Artifact generation pipeline.
//!
//! Successful file and image uploads enqueue an [`ArtifactJob`]. An external
//! worker claims jobs, renders one derivative per configured size, and writes
//! each next to the original blob as `<localPath>_<size>`.

mod queue;

pub use queue::{ClaimedJob, SqlArtifactQueue};

use async_trait::async_trait;

use crate::Result;

/// Sizes the worker renders derivatives at.
pub const DEFAULT_VARIANT_SIZES: [u32; 3] = [500, 250, 100];

/// A request to generate derivatives for one uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtifactJob {
    /// Entry ID of the uploaded file.
    pub file_id: i64,
    /// Owner of the file.
    pub user_id: i64,
}

impl ArtifactJob {
    pub fn new(file_id: i64, user_id: i64) -> Self {
        Self { file_id, user_id }
    }
}

/// Producer side of the durable job queue.
///
/// Delivery is at-least-once; consumers must tolerate duplicates.
#[async_trait]
pub trait ArtifactQueue: Send + Sync {
    /// Append a job.
    async fn enqueue(&self, job: ArtifactJob) -> Result<()>;
}

/// Path of the derivative of `path` at `size`. Size 0 names the original.
pub fn variant_path(path: &str, size: u32) -> String {
    if size == 0 {
        path.to_string()
    } else {
        format!("{path}_{size}")
    }
}
