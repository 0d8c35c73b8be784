//! `jobs`: create, list, cancel, and reschedule scheduled posts.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use {
    gramflow_config::GramflowConfig,
    gramflow_cron::{
        FileStore, JobPatch, JobStore, ScheduleChoice, ScheduleSpec, ScheduledJob,
        build_cron_expression,
    },
};

use crate::publish_commands::media_kind_for;

#[derive(Args)]
pub struct ScheduleArgs {
    /// Schedule option: daily, weekly, or custom.
    #[arg(long, default_value = "daily")]
    pub when: String,
    /// "HH:MM", required with --when custom.
    #[arg(long)]
    pub time: Option<String>,
    /// Weekday index 0-6 (repeatable), required with --when custom.
    #[arg(long = "weekday")]
    pub weekdays: Vec<u8>,
}

impl ScheduleArgs {
    fn to_spec(&self) -> anyhow::Result<ScheduleSpec> {
        let choice: ScheduleChoice = self.when.parse()?;
        Ok(ScheduleSpec {
            choice,
            custom_time: self.time.clone(),
            weekdays: self.weekdays.clone(),
        })
    }
}

#[derive(Subcommand)]
pub enum JobAction {
    /// Schedule a new post.
    Add {
        #[arg(long)]
        account: String,
        #[arg(long)]
        media: PathBuf,
        #[arg(long, default_value = "")]
        caption: String,
        /// Treat the media as video (otherwise inferred from the extension).
        #[arg(long, default_value_t = false)]
        video: bool,
        #[arg(long)]
        thumbnail: Option<PathBuf>,
        /// Remove the job after its first successful fire.
        #[arg(long, default_value_t = false)]
        once: bool,
        #[command(flatten)]
        schedule: ScheduleArgs,
    },
    /// List all scheduled posts.
    List,
    /// Cancel a scheduled post by id.
    Cancel { id: String },
    /// Change the schedule of an existing post.
    Reschedule {
        id: String,
        #[command(flatten)]
        schedule: ScheduleArgs,
    },
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

pub async fn handle(config: &GramflowConfig, action: JobAction) -> anyhow::Result<()> {
    let store = FileStore::new(config.store.jobs_path.clone());

    match action {
        JobAction::Add {
            account,
            media,
            caption,
            video,
            thumbnail,
            once,
            schedule,
        } => {
            if config.account(&account).is_none() {
                anyhow::bail!("unknown account: {account}");
            }
            // Built and validated before anything touches the store.
            let expr = build_cron_expression(&schedule.to_spec()?)?;
            let media_kind = media_kind_for(&media, video);

            let job = store
                .append(ScheduledJob {
                    id: String::new(),
                    media_path: media,
                    media_kind,
                    caption,
                    thumbnail_path: thumbnail,
                    account,
                    cron_schedule: expr,
                    recurring: !once,
                    created_at_ms: now_ms(),
                })
                .await?;
            println!("scheduled {} ({})", job.id, job.cron_schedule);
        },
        JobAction::List => {
            let jobs = store.list().await?;
            if jobs.is_empty() {
                println!("no scheduled posts");
                return Ok(());
            }
            for job in jobs {
                println!(
                    "{}  {}  {:?}  \"{}\"  {}  {}",
                    job.id,
                    job.account,
                    job.media_kind,
                    job.cron_schedule,
                    if job.recurring { "recurring" } else { "once" },
                    job.media_path.display(),
                );
            }
        },
        JobAction::Cancel { id } => {
            if store.remove(&id).await? {
                println!("cancelled {id}");
            } else {
                anyhow::bail!("no job with id {id}");
            }
        },
        JobAction::Reschedule { id, schedule } => {
            let expr = build_cron_expression(&schedule.to_spec()?)?;
            let job = store
                .update(&id, JobPatch {
                    cron_schedule: Some(expr),
                    ..Default::default()
                })
                .await?;
            println!("rescheduled {} ({})", job.id, job.cron_schedule);
        },
    }

    Ok(())
}
