//! In-memory store for testing.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::{
    error::{Error, Result},
    store::JobStore,
    types::{JobPatch, ScheduledJob},
};

/// In-memory store backed by a `Vec`. No persistence — for tests only.
pub struct MemoryStore {
    jobs: Mutex<Vec<ScheduledJob>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            jobs: Mutex::new(Vec::new()),
        }
    }

    pub fn with_jobs(jobs: Vec<ScheduledJob>) -> Self {
        Self {
            jobs: Mutex::new(jobs),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn list(&self) -> Result<Vec<ScheduledJob>> {
        let mut jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        for job in jobs.iter_mut() {
            if job.id.is_empty() {
                job.id = uuid::Uuid::new_v4().to_string();
            }
        }
        Ok(jobs.clone())
    }

    async fn append(&self, mut job: ScheduledJob) -> Result<ScheduledJob> {
        let mut jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        if job.id.is_empty() {
            job.id = uuid::Uuid::new_v4().to_string();
        }
        jobs.push(job.clone());
        Ok(job)
    }

    async fn remove(&self, id: &str) -> Result<bool> {
        let mut jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        let before = jobs.len();
        jobs.retain(|j| j.id != id);
        Ok(jobs.len() != before)
    }

    async fn update(&self, id: &str, patch: JobPatch) -> Result<ScheduledJob> {
        let mut jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        let job = jobs
            .iter_mut()
            .find(|j| j.id == id)
            .ok_or_else(|| Error::job_not_found(id))?;

        if let Some(expr) = patch.cron_schedule {
            job.cron_schedule = expr;
        }
        if let Some(caption) = patch.caption {
            job.caption = caption;
        }
        if let Some(recurring) = patch.recurring {
            job.recurring = recurring;
        }
        Ok(job.clone())
    }

    async fn save_all(&self, snapshot: &[ScheduledJob]) -> Result<()> {
        let mut jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        *jobs = snapshot.to_vec();
        Ok(())
    }
}
