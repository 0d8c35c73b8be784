//! Scheduler service: one-minute timer loop, due evaluation, job CRUD.

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use {
    chrono::{DateTime, Utc},
    chrono_tz::Tz,
    tokio::{
        sync::{Mutex, RwLock},
        task::JoinHandle,
        time::MissedTickBehavior,
    },
    tracing::{error, info, warn},
};

use crate::{
    Result,
    builder::{ScheduleSpec, build_cron_expression},
    schedule::is_due,
    store::JobStore,
    types::{JobCreate, JobPatch, ScheduledJob},
};

/// Result of handing a due job to the publish pipeline. The pipeline's
/// contract is an outcome value, never a propagated error.
#[derive(Debug, Clone)]
pub struct FireOutcome {
    pub success: bool,
    pub message: String,
}

/// Callback that publishes a due job.
pub type PublishFn =
    Arc<dyn Fn(ScheduledJob) -> Pin<Box<dyn Future<Output = FireOutcome> + Send>> + Send + Sync>;

/// Tick cadence. Due evaluation is at minute resolution, so the timer is a
/// fixed one-minute interval rather than a computed next-wake sleep.
const TICK_INTERVAL: Duration = Duration::from_secs(60);

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// The scheduling engine.
///
/// Polls the job store every minute and fires due jobs sequentially in store
/// order. A slow publish delays later jobs within the same tick; with the
/// small job counts this store targets, that is an accepted ceiling.
pub struct SchedulerService {
    store: Arc<dyn JobStore>,
    timezone: Tz,
    on_publish: PublishFn,
    timer_handle: Mutex<Option<JoinHandle<()>>>,
    running: RwLock<bool>,
}

impl SchedulerService {
    pub fn new(store: Arc<dyn JobStore>, timezone: Tz, on_publish: PublishFn) -> Arc<Self> {
        Arc::new(Self {
            store,
            timezone,
            on_publish,
            timer_handle: Mutex::new(None),
            running: RwLock::new(false),
        })
    }

    /// Load jobs (running id migration if needed) and start the timer loop.
    pub async fn start(self: &Arc<Self>) -> Result<()> {
        let loaded = self.store.list().await?;
        info!(count = loaded.len(), timezone = %self.timezone, "loaded scheduled jobs");

        *self.running.write().await = true;

        let svc = Arc::clone(self);
        let handle = tokio::spawn(async move {
            svc.timer_loop().await;
        });

        *self.timer_handle.lock().await = Some(handle);
        Ok(())
    }

    /// Stop the timer loop.
    pub async fn stop(&self) {
        *self.running.write().await = false;

        let mut handle = self.timer_handle.lock().await;
        if let Some(h) = handle.take() {
            h.abort();
        }
        info!("scheduler stopped");
    }

    /// Create a job from a schedule choice. The cron expression is built and
    /// validated here, before the store is touched.
    pub async fn add(&self, create: JobCreate) -> Result<ScheduledJob> {
        let expr = build_cron_expression(&create.schedule)?;
        let job = ScheduledJob {
            id: String::new(),
            media_path: create.media_path,
            media_kind: create.media_kind,
            caption: create.caption,
            thumbnail_path: create.thumbnail_path,
            account: create.account,
            cron_schedule: expr,
            recurring: create.recurring,
            created_at_ms: now_ms(),
        };
        let stored = self.store.append(job).await?;
        info!(id = %stored.id, expr = %stored.cron_schedule, "job scheduled");
        Ok(stored)
    }

    /// Replace a job's schedule with a newly built expression.
    pub async fn reschedule(&self, id: &str, spec: &ScheduleSpec) -> Result<ScheduledJob> {
        let expr = build_cron_expression(spec)?;
        let updated = self
            .store
            .update(id, JobPatch {
                cron_schedule: Some(expr),
                ..Default::default()
            })
            .await?;
        info!(id, expr = %updated.cron_schedule, "job rescheduled");
        Ok(updated)
    }

    /// Cancel a job. Returns whether anything was removed.
    pub async fn cancel(&self, id: &str) -> Result<bool> {
        let removed = self.store.remove(id).await?;
        if removed {
            info!(id, "job cancelled");
        } else {
            warn!(id, "cancel requested for unknown job");
        }
        Ok(removed)
    }

    /// List all jobs.
    pub async fn jobs(&self) -> Result<Vec<ScheduledJob>> {
        self.store.list().await
    }

    // ── Internal ────────────────────────────────────────────────────────

    async fn timer_loop(self: &Arc<Self>) {
        let mut interval = tokio::time::interval(TICK_INTERVAL);
        // A tick that runs long drops the windows it covered; occurrences
        // missed while busy or down are never replayed.
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            if !*self.running.read().await {
                break;
            }
            let now = Utc::now().with_timezone(&self.timezone);
            self.tick_at(now).await;
        }
    }

    /// Evaluate one tick against a fixed clock.
    async fn tick_at(&self, now: DateTime<Tz>) {
        let jobs = match self.store.list().await {
            Ok(jobs) => jobs,
            Err(e) => {
                error!(error = %e, "tick: failed to load schedule store");
                return;
            },
        };

        let mut fired_one_shots: Vec<String> = Vec::new();

        for job in &jobs {
            let due = match is_due(&job.cron_schedule, now) {
                Ok(due) => due,
                Err(e) => {
                    // Configuration error: skip but keep the record so the
                    // owner can fix it.
                    warn!(
                        id = %job.id,
                        expr = %job.cron_schedule,
                        error = %e,
                        "skipping job with invalid cron expression"
                    );
                    continue;
                },
            };
            if !due {
                continue;
            }

            info!(id = %job.id, account = %job.account, "job due, publishing");
            let outcome = (self.on_publish)(job.clone()).await;
            if outcome.success {
                info!(id = %job.id, "scheduled publish succeeded");
                if !job.recurring {
                    fired_one_shots.push(job.id.clone());
                }
            } else {
                error!(id = %job.id, message = %outcome.message, "scheduled publish failed");
            }
        }

        // One-shot jobs leave the store after a successful fire. Recurring
        // jobs stay; the snapshot is re-persisted as read so the file also
        // reflects any migration that happened on load.
        if fired_one_shots.is_empty() {
            if let Err(e) = self.store.save_all(&jobs).await {
                error!(error = %e, "tick: failed to re-persist schedule store");
            }
        } else {
            for id in &fired_one_shots {
                if let Err(e) = self.store.remove(id).await {
                    warn!(id, error = %e, "failed to remove one-shot job after fire");
                }
            }
        }
    }
}
