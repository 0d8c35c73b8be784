//! Persistence trait for scheduled jobs.

use async_trait::async_trait;

use crate::{
    Result,
    types::{JobPatch, ScheduledJob},
};

/// Persistence backend for the schedule store.
///
/// The store is one snapshot: every mutation rewrites the full job list.
/// That bounds it to small job counts, which is the intended scale.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Load all jobs. Initializes an empty store if the backing file is
    /// missing, and backfills ids on legacy records (migration-on-read).
    async fn list(&self) -> Result<Vec<ScheduledJob>>;

    /// Append a job, assigning an id if it has none. Returns the stored job.
    async fn append(&self, job: ScheduledJob) -> Result<ScheduledJob>;

    /// Remove a job by id. Returns whether a removal occurred; a miss does
    /// not rewrite the store.
    async fn remove(&self, id: &str) -> Result<bool>;

    /// Apply a field-level patch to a job. Errors with
    /// [`crate::Error::JobNotFound`] if no job matches.
    async fn update(&self, id: &str, patch: JobPatch) -> Result<ScheduledJob>;

    /// Re-persist the given snapshot wholesale.
    async fn save_all(&self, jobs: &[ScheduledJob]) -> Result<()>;
}
