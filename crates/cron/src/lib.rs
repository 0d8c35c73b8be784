//! Scheduled publishing engine: durable job store, cron-expression builder,
//! per-minute due matcher, and the tick loop that hands due jobs to the
//! publish pipeline.
//! Persistent storage is a single JSON snapshot file (see [`store_file`]).

pub mod builder;
pub mod error;
pub mod schedule;
pub mod service;
pub mod store;
pub mod store_file;
pub mod store_memory;
pub mod types;

pub use {
    builder::{ScheduleChoice, ScheduleSpec, build_cron_expression},
    error::{Error, Result},
    schedule::{is_due, validate_expression},
    service::{FireOutcome, PublishFn, SchedulerService},
    store::JobStore,
    store_file::FileStore,
    types::{JobCreate, JobPatch, MediaKind, ScheduledJob},
};
