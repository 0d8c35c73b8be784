//! JSON file-backed job store with atomic writes.

use std::path::PathBuf;

use {async_trait::async_trait, tokio::fs, tracing::info};

use crate::{
    error::{Error, Result},
    store::JobStore,
    types::{JobPatch, ScheduledJob},
};

/// File-backed store: all jobs in a single JSON array.
///
/// Every operation takes the internal write lock, so the tick loop and
/// on-demand requests cannot interleave read-modify-write cycles and lose
/// updates.
pub struct FileStore {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Atomic write: write to temp, rename over target, keep `.bak`.
    async fn atomic_write(&self, jobs: &[ScheduledJob]) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(jobs)?;
        let tmp = self.path.with_extension("json.tmp");

        fs::write(&tmp, json.as_bytes()).await?;

        // Backup existing file.
        if fs::try_exists(&self.path).await.unwrap_or(false) {
            let bak = self.path.with_extension("json.bak");
            let _ = fs::rename(&self.path, &bak).await;
        }

        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Load the snapshot and backfill missing ids. Caller must hold the
    /// write lock. Persists when the file was absent or a backfill happened.
    async fn load_locked(&self) -> Result<Vec<ScheduledJob>> {
        if !fs::try_exists(&self.path).await.unwrap_or(false) {
            info!(path = %self.path.display(), "initializing empty schedule store");
            self.atomic_write(&[]).await?;
            return Ok(Vec::new());
        }

        let data = fs::read_to_string(&self.path).await?;
        let mut jobs: Vec<ScheduledJob> = serde_json::from_str(&data)?;

        let mut modified = false;
        for job in &mut jobs {
            if job.id.is_empty() {
                job.id = uuid::Uuid::new_v4().to_string();
                modified = true;
            }
        }
        if modified {
            info!(path = %self.path.display(), "backfilled ids on legacy job records");
            self.atomic_write(&jobs).await?;
        }

        Ok(jobs)
    }
}

#[async_trait]
impl JobStore for FileStore {
    async fn list(&self) -> Result<Vec<ScheduledJob>> {
        let _guard = self.write_lock.lock().await;
        self.load_locked().await
    }

    async fn append(&self, mut job: ScheduledJob) -> Result<ScheduledJob> {
        let _guard = self.write_lock.lock().await;
        let mut jobs = self.load_locked().await?;
        if job.id.is_empty() {
            job.id = uuid::Uuid::new_v4().to_string();
        }
        jobs.push(job.clone());
        self.atomic_write(&jobs).await?;
        Ok(job)
    }

    async fn remove(&self, id: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut jobs = self.load_locked().await?;
        let before = jobs.len();
        jobs.retain(|j| j.id != id);
        if jobs.len() == before {
            return Ok(false);
        }
        self.atomic_write(&jobs).await?;
        Ok(true)
    }

    async fn update(&self, id: &str, patch: JobPatch) -> Result<ScheduledJob> {
        let _guard = self.write_lock.lock().await;
        let mut jobs = self.load_locked().await?;
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

        let updated = job.clone();
        self.atomic_write(&jobs).await?;
        Ok(updated)
    }

    async fn save_all(&self, jobs: &[ScheduledJob]) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.atomic_write(jobs).await
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, crate::types::MediaKind, std::path::Path, tempfile::TempDir};

    fn make_store(dir: &Path) -> FileStore {
        FileStore::new(dir.join("scheduled_posts.json"))
    }

    fn make_job(caption: &str) -> ScheduledJob {
        ScheduledJob {
            id: String::new(),
            media_path: "uploads/post.jpg".into(),
            media_kind: MediaKind::Image,
            caption: caption.into(),
            thumbnail_path: None,
            account: "main".into(),
            cron_schedule: "0 12 * * *".into(),
            recurring: true,
            created_at_ms: 1000,
        }
    }

    #[tokio::test]
    async fn missing_file_initializes_empty_store() {
        let tmp = TempDir::new().unwrap();
        let store = make_store(tmp.path());

        assert!(store.list().await.unwrap().is_empty());
        assert!(tmp.path().join("scheduled_posts.json").exists());
    }

    #[tokio::test]
    async fn append_assigns_id_and_roundtrips() {
        let tmp = TempDir::new().unwrap();
        let store = make_store(tmp.path());

        let stored = store.append(make_job("first")).await.unwrap();
        assert!(!stored.id.is_empty());

        let jobs = store.list().await.unwrap();
        assert_eq!(jobs.len(), 1);
        // Identical except for the assigned id.
        let mut expected = make_job("first");
        expected.id = stored.id.clone();
        assert_eq!(jobs[0], expected);
    }

    #[tokio::test]
    async fn list_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let store = make_store(tmp.path());
        store.append(make_job("a")).await.unwrap();
        store.append(make_job("b")).await.unwrap();

        let first = store.list().await.unwrap();
        let second = store.list().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn legacy_records_get_ids_backfilled_once() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("scheduled_posts.json");
        std::fs::write(
            &path,
            r#"[{
                "mediaPath": "uploads/old.jpg",
                "mediaKind": "image",
                "caption": "legacy",
                "account": "main",
                "cronSchedule": "0 12 * * *"
            }]"#,
        )
        .unwrap();

        let store = FileStore::new(path.clone());
        let jobs = store.list().await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert!(!jobs[0].id.is_empty());

        // Backfill happened exactly once; ids are stable across reads.
        let again = store.list().await.unwrap();
        assert_eq!(jobs, again);

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains(&jobs[0].id));
    }

    #[tokio::test]
    async fn remove_existing_job() {
        let tmp = TempDir::new().unwrap();
        let store = make_store(tmp.path());
        let a = store.append(make_job("a")).await.unwrap();
        let b = store.append(make_job("b")).await.unwrap();

        assert!(store.remove(&a.id).await.unwrap());

        let jobs = store.list().await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].id, b.id);
    }

    #[tokio::test]
    async fn remove_missing_job_is_false_and_leaves_store_untouched() {
        let tmp = TempDir::new().unwrap();
        let store = make_store(tmp.path());
        store.append(make_job("a")).await.unwrap();
        let before = store.list().await.unwrap();

        assert!(!store.remove("no-such-id").await.unwrap());
        assert_eq!(store.list().await.unwrap(), before);
    }

    #[tokio::test]
    async fn update_patches_cron_schedule() {
        let tmp = TempDir::new().unwrap();
        let store = make_store(tmp.path());
        let job = store.append(make_job("a")).await.unwrap();

        let updated = store
            .update(&job.id, JobPatch {
                cron_schedule: Some("30 9 * * 1".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(updated.cron_schedule, "30 9 * * 1");

        let jobs = store.list().await.unwrap();
        assert_eq!(jobs[0].cron_schedule, "30 9 * * 1");
        assert_eq!(jobs[0].caption, "a");
    }

    #[tokio::test]
    async fn update_missing_job_reports_not_found() {
        let tmp = TempDir::new().unwrap();
        let store = make_store(tmp.path());

        let err = store.update("ghost", JobPatch::default()).await.unwrap_err();
        assert!(matches!(err, Error::JobNotFound { .. }));
    }

    #[tokio::test]
    async fn rewrite_keeps_backup() {
        let tmp = TempDir::new().unwrap();
        let store = make_store(tmp.path());
        store.append(make_job("a")).await.unwrap();
        store.append(make_job("b")).await.unwrap();

        assert!(tmp.path().join("scheduled_posts.json.bak").exists());
    }

    #[tokio::test]
    async fn save_all_rewrites_snapshot() {
        let tmp = TempDir::new().unwrap();
        let store = make_store(tmp.path());
        let a = store.append(make_job("a")).await.unwrap();

        store.save_all(&[a.clone()]).await.unwrap();
        assert_eq!(store.list().await.unwrap(), vec![a]);
    }
}
