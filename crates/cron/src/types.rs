//! Core data types for the scheduled publishing system.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// What kind of media a job publishes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum MediaKind {
    Image,
    Video,
}

/// A persisted publish job.
///
/// Jobs reference their platform account by name; credentials are resolved
/// from configuration at publish time and never written to the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledJob {
    /// Empty only for legacy records; [`crate::store::JobStore::list`]
    /// backfills an id on first read.
    #[serde(default)]
    pub id: String,
    pub media_path: PathBuf,
    pub media_kind: MediaKind,
    #[serde(default)]
    pub caption: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_path: Option<PathBuf>,
    pub account: String,
    pub cron_schedule: String,
    /// A non-recurring job leaves the store after its first successful fire.
    #[serde(default = "default_true")]
    pub recurring: bool,
    #[serde(default)]
    pub created_at_ms: u64,
}

fn default_true() -> bool {
    true
}

/// Input for creating a new job. The schedule is still the user's choice
/// here; the cron expression is built and validated before anything is
/// stored.
#[derive(Debug, Clone)]
pub struct JobCreate {
    pub media_path: PathBuf,
    pub media_kind: MediaKind,
    pub caption: String,
    pub thumbnail_path: Option<PathBuf>,
    pub account: String,
    pub schedule: crate::builder::ScheduleSpec,
    pub recurring: bool,
}

/// Field-level patch for updating an existing job.
#[derive(Debug, Clone, Default)]
pub struct JobPatch {
    pub cron_schedule: Option<String>,
    pub caption: Option<String>,
    pub recurring: Option<bool>,
}
