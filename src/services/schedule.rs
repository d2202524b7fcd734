//! Resolution of weekly close times in a group's timezone.

use chrono::{
    DateTime, Datelike, Days, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta,
    TimeZone, Utc,
};
use chrono_tz::Tz;
use thiserror::Error;
use time::OffsetDateTime;

use crate::dao::models::ScheduleEntity;

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

/// [`Clock`] reading the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("unknown timezone `{0}`")]
    InvalidTimezone(String),
    #[error("weekday must be between 0 (Monday) and 6 (Sunday), got {0}")]
    InvalidWeekday(u8),
    #[error("invalid time of day {hour:02}:{minute:02}")]
    InvalidTime { hour: u8, minute: u8 },
    #[error("could not resolve {0} in the schedule timezone")]
    Unresolvable(String),
}

/// Check the schedule fields and return its parsed timezone.
pub fn validate(schedule: &ScheduleEntity) -> Result<Tz, ScheduleError> {
    if schedule.weekday > 6 {
        return Err(ScheduleError::InvalidWeekday(schedule.weekday));
    }
    if schedule.hour > 23 || schedule.minute > 59 {
        return Err(ScheduleError::InvalidTime {
            hour: schedule.hour,
            minute: schedule.minute,
        });
    }
    schedule
        .timezone
        .parse::<Tz>()
        .map_err(|_| ScheduleError::InvalidTimezone(schedule.timezone.clone()))
}

/// First instant strictly after `now` falling on the schedule's weekday and wall time.
///
/// Wall times skipped by a daylight-saving jump resolve one hour later; wall times
/// repeated by a fall-back resolve to their first occurrence.
pub fn next_occurrence(
    now: OffsetDateTime,
    schedule: &ScheduleEntity,
) -> Result<OffsetDateTime, ScheduleError> {
    let tz = validate(schedule)?;
    let wall_time = NaiveTime::from_hms_opt(u32::from(schedule.hour), u32::from(schedule.minute), 0)
        .ok_or(ScheduleError::InvalidTime {
            hour: schedule.hour,
            minute: schedule.minute,
        })?;

    let now_local = Utc
        .timestamp_opt(now.unix_timestamp(), now.nanosecond())
        .single()
        .ok_or_else(|| ScheduleError::Unresolvable(now.to_string()))?
        .with_timezone(&tz);

    let today = now_local.date_naive();
    let current = today.weekday().num_days_from_monday();
    let days_ahead = (u32::from(schedule.weekday) + 7 - current) % 7;

    let date = add_days(today, u64::from(days_ahead))?;
    let mut candidate = resolve_local(tz, date.and_time(wall_time))?;
    if to_offset_datetime(candidate)? <= now {
        candidate = resolve_local(tz, add_days(date, 7)?.and_time(wall_time))?;
    }

    to_offset_datetime(candidate)
}

fn add_days(date: NaiveDate, days: u64) -> Result<NaiveDate, ScheduleError> {
    date.checked_add_days(Days::new(days))
        .ok_or_else(|| ScheduleError::Unresolvable(date.to_string()))
}

fn resolve_local(tz: Tz, naive: NaiveDateTime) -> Result<DateTime<Tz>, ScheduleError> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(resolved) => Ok(resolved),
        LocalResult::Ambiguous(first, second) => Ok(first.min(second)),
        LocalResult::None => tz
            .from_local_datetime(&(naive + TimeDelta::hours(1)))
            .earliest()
            .ok_or_else(|| ScheduleError::Unresolvable(naive.to_string())),
    }
}

fn to_offset_datetime(value: DateTime<Tz>) -> Result<OffsetDateTime, ScheduleError> {
    OffsetDateTime::from_unix_timestamp(value.timestamp())
        .map_err(|_| ScheduleError::Unresolvable(value.to_rfc3339()))
}
