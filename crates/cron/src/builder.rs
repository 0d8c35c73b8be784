//! Builds cron expressions from the schedule choices the surface exposes.

use std::str::FromStr;

use chrono::NaiveTime;

use crate::{
    error::{Error, Result},
    schedule::validate_expression,
};

/// How the user asked for a job to repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleChoice {
    /// Every day at midday.
    Daily,
    /// Every Monday at midday.
    Weekly,
    /// A specific time on a specific set of weekdays.
    Custom,
}

impl FromStr for ScheduleChoice {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "custom" => Ok(Self::Custom),
            other => Err(Error::invalid_schedule(format!(
                "unknown schedule option: {other}"
            ))),
        }
    }
}

/// A schedule choice plus the fields only `custom` needs.
#[derive(Debug, Clone)]
pub struct ScheduleSpec {
    pub choice: ScheduleChoice,
    /// "HH:MM", required for [`ScheduleChoice::Custom`].
    pub custom_time: Option<String>,
    /// Weekday indices 0 (Sunday) through 6, required non-empty for
    /// [`ScheduleChoice::Custom`].
    pub weekdays: Vec<u8>,
}

impl ScheduleSpec {
    pub fn daily() -> Self {
        Self {
            choice: ScheduleChoice::Daily,
            custom_time: None,
            weekdays: Vec::new(),
        }
    }

    pub fn weekly() -> Self {
        Self {
            choice: ScheduleChoice::Weekly,
            custom_time: None,
            weekdays: Vec::new(),
        }
    }

    pub fn custom(time: impl Into<String>, weekdays: Vec<u8>) -> Self {
        Self {
            choice: ScheduleChoice::Custom,
            custom_time: Some(time.into()),
            weekdays,
        }
    }
}

/// Build a 5-field cron expression from a schedule spec.
///
/// Fails with [`Error::InvalidSchedule`] before anything touches the store;
/// there is no silent defaulting. The produced expression is checked against
/// the cron grammar in the same call.
pub fn build_cron_expression(spec: &ScheduleSpec) -> Result<String> {
    let expr = match spec.choice {
        ScheduleChoice::Daily => "0 12 * * *".to_string(),
        ScheduleChoice::Weekly => "0 12 * * 1".to_string(),
        ScheduleChoice::Custom => {
            let time = spec
                .custom_time
                .as_deref()
                .ok_or_else(|| Error::invalid_schedule("custom schedule requires a time"))?;
            let parsed = NaiveTime::parse_from_str(time, "%H:%M").map_err(|_| {
                Error::invalid_schedule(format!("invalid time '{time}', expected HH:MM"))
            })?;

            if spec.weekdays.is_empty() {
                return Err(Error::invalid_schedule(
                    "custom schedule requires at least one weekday",
                ));
            }
            if let Some(bad) = spec.weekdays.iter().find(|d| **d > 6) {
                return Err(Error::invalid_schedule(format!(
                    "weekday out of range 0-6: {bad}"
                )));
            }

            use chrono::Timelike;
            let days = spec
                .weekdays
                .iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join(",");
            format!("{} {} * * {days}", parsed.minute(), parsed.hour())
        },
    };

    validate_expression(&expr)?;
    Ok(expr)
}
