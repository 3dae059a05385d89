//! Working-hours window and per-call planning options.

use chrono::{
    DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Timelike, Utc,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Wall-clock time of day, written `HH:MM`. Stored as minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(u32);

impl ClockTime {
    /// Build from hour and minute.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidClockTime`] when out of range.
    pub fn new(hour: u32, minute: u32) -> Result<Self, ValidationError> {
        if hour < 24 && minute < 60 {
            Ok(Self(hour * 60 + minute))
        } else {
            Err(ValidationError::InvalidClockTime(format!(
                "{hour:02}:{minute:02}"
            )))
        }
    }

    pub fn hour(&self) -> u32 {
        self.0 / 60
    }

    pub fn minute(&self) -> u32 {
        self.0 % 60
    }

    pub fn minutes_since_midnight(&self) -> u32 {
        self.0
    }
}

impl FromStr for ClockTime {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let time = NaiveTime::parse_from_str(s.trim(), "%H:%M")
            .map_err(|_| ValidationError::InvalidClockTime(s.to_string()))?;
        Self::new(time.hour(), time.minute())
    }
}

impl TryFrom<String> for ClockTime {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClockTime> for String {
    fn from(value: ClockTime) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

const DEFAULT_WORK_START: ClockTime = ClockTime(9 * 60);
const DEFAULT_WORK_END: ClockTime = ClockTime(17 * 60);

/// Options for a single planning call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanOptions {
    pub work_start: ClockTime,
    pub work_end: ClockTime,
    /// Fixed "now" for reproducible plans; wall clock when absent.
    pub now: Option<DateTime<Utc>>,
    /// Day to plan; the local date of `now` when absent.
    pub day: Option<NaiveDate>,
    /// Offset that working hours and the day are expressed in.
    pub utc_offset: FixedOffset,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            work_start: DEFAULT_WORK_START,
            work_end: DEFAULT_WORK_END,
            now: None,
            day: None,
            utc_offset: Utc.fix(),
        }
    }
}

impl PlanOptions {
    /// Working hours `start..end` with everything else defaulted.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidWorkingHours`] unless `end > start`.
    pub fn new(work_start: ClockTime, work_end: ClockTime) -> Result<Self, ValidationError> {
        if work_end <= work_start {
            return Err(ValidationError::InvalidWorkingHours {
                start: work_start.to_string(),
                end: work_end.to_string(),
            });
        }
        Ok(Self {
            work_start,
            work_end,
            ..Self::default()
        })
    }

    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    pub fn with_day(mut self, day: NaiveDate) -> Self {
        self.day = Some(day);
        self
    }

    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = offset;
        self
    }

    /// Local date being planned.
    pub fn planned_day(&self, now: DateTime<Utc>) -> NaiveDate {
        self.day
            .unwrap_or_else(|| now.with_timezone(&self.utc_offset).date_naive())
    }

    /// Working window of `day` as UTC instants.
    pub fn window(&self, day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        (
            self.local_to_utc(day, self.work_start),
            self.local_to_utc(day, self.work_end),
        )
    }

    fn local_to_utc(&self, day: NaiveDate, time: ClockTime) -> DateTime<Utc> {
        let shift = Duration::seconds(i64::from(self.utc_offset.local_minus_utc()));
        let local = day.and_time(NaiveTime::default())
            + Duration::minutes(i64::from(time.minutes_since_midnight()));
        Utc.from_utc_datetime(&(local - shift))
    }

    /// `now` rounded up to the next multiple of `granularity_minutes` on the
    /// local clock. An instant already on a boundary is kept.
    pub fn round_up(&self, now: DateTime<Utc>, granularity_minutes: u32) -> DateTime<Utc> {
        if granularity_minutes == 0 {
            return now;
        }
        let step = i64::from(granularity_minutes) * 60;
        let nanos = now.timestamp_subsec_nanos();
        let whole = now - Duration::nanoseconds(i64::from(nanos));
        let local_secs = whole.timestamp() + i64::from(self.utc_offset.local_minus_utc());
        let rem = local_secs.rem_euclid(step);
        if rem == 0 && nanos == 0 {
            whole
        } else {
            whole + Duration::seconds(step - rem)
        }
    }
}
