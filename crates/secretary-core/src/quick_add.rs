//! Quick-add parser for free-text entries.
//!
//! Recognizes a day keyword (`today`, `tomorrow`), a 12-hour time
//! (`5pm`, `at 9:30am`), and a trailing place (`at Starbucks`, `in London`,
//! `at home`). Whatever is left becomes the title.

use chrono::{DateTime, Days, FixedOffset, NaiveDate, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::planner::ClockTime;
use crate::record::{TaskRecord, DEFAULT_DURATION_MINUTES};

static TOMORROW_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\btomorrow\b").expect("valid tomorrow regex"));
static TODAY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\btoday\b").expect("valid today regex"));
static TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:at\s+)?(\d{1,2})(?::(\d{2}))?\s*(am|pm)\b").expect("valid time regex")
});
static PLACE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:at|in)\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)").expect("valid place regex")
});
static TRAILING_PLACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s+(?:at|in)\s+([a-z]+)$").expect("valid trailing place regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Draft entry extracted from text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedEntry {
    pub title: String,
    /// Only set when a day keyword was present
    pub date: Option<NaiveDate>,
    pub time: Option<ClockTime>,
    pub location: Option<String>,
    pub duration_minutes: u32,
}

impl ParsedEntry {
    pub fn has_time(&self) -> bool {
        self.time.is_some()
    }

    /// Start instant, if the text named a time. A time without a day keyword
    /// falls on `today`.
    pub fn start(&self, today: NaiveDate, offset: FixedOffset) -> Option<DateTime<Utc>> {
        let time = self.time?;
        let day = self.date.unwrap_or(today);
        let local = day.and_hms_opt(time.hour(), time.minute(), 0)?;
        offset
            .from_local_datetime(&local)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Turn the draft into a flexible task record.
    pub fn to_record(&self, today: NaiveDate, offset: FixedOffset) -> TaskRecord {
        let mut record = TaskRecord::task(self.title.clone()).with_duration(self.duration_minutes);
        record.date = self.start(today, offset);
        record.location = self.location.clone();
        record
    }
}

/// Parse `text` relative to `today`.
pub fn parse(text: &str, today: NaiveDate) -> ParsedEntry {
    let mut entry = ParsedEntry {
        title: text.to_string(),
        date: None,
        time: None,
        location: None,
        duration_minutes: DEFAULT_DURATION_MINUTES,
    };

    if text.trim().is_empty() {
        entry.title = String::new();
        return entry;
    }

    if TOMORROW_RE.is_match(text) {
        entry.date = today.checked_add_days(Days::new(1));
        entry.title = TOMORROW_RE.replace(&entry.title, "").trim().to_string();
    } else if TODAY_RE.is_match(text) {
        entry.date = Some(today);
        entry.title = TODAY_RE.replace(&entry.title, "").trim().to_string();
    }

    if let Some(caps) = TIME_RE.captures(text) {
        let hours: u32 = caps[1].parse().unwrap_or(u32::MAX);
        let minutes: u32 = caps.get(2).map_or(Ok(0), |m| m.as_str().parse()).unwrap_or(u32::MAX);
        let pm = caps[3].eq_ignore_ascii_case("pm");
        let hours = match (pm, hours) {
            (true, h) if h < 12 => h + 12,
            (false, 12) => 0,
            (_, h) => h,
        };
        if let Ok(time) = ClockTime::new(hours, minutes) {
            entry.time = Some(time);
            entry.title = entry.title.replacen(&caps[0], "", 1).trim().to_string();
        }
    }

    if let Some(caps) = PLACE_RE.captures(text) {
        entry.location = Some(caps[1].to_string());
        entry.title = entry.title.replacen(&caps[0], "", 1).trim().to_string();
    } else if let Some(caps) = TRAILING_PLACE_RE.captures(text) {
        entry.location = Some(caps[1].to_string());
        entry.title = entry.title.replacen(&caps[0], "", 1).trim().to_string();
    }

    entry.title = WHITESPACE_RE.replace_all(&entry.title, " ").trim().to_string();
    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Offset;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
    }

    #[test]
    fn extracts_day_time_and_place() {
        let entry = parse("Coffee tomorrow at 5pm at Starbucks", today());
        assert_eq!(entry.title, "Coffee");
        assert_eq!(entry.date, NaiveDate::from_ymd_opt(2024, 3, 5));
        assert_eq!(entry.time, Some(ClockTime::new(17, 0).unwrap()));
        assert_eq!(entry.location.as_deref(), Some("Starbucks"));
        assert_eq!(entry.duration_minutes, 30);
    }

    #[test]
    fn keywords_may_lead_the_title() {
        let entry = parse("tomorrow at 5pm Coffee at Starbucks", today());
        assert_eq!(entry.title, "Coffee");
        assert_eq!(entry.time, Some(ClockTime::new(17, 0).unwrap()));
        assert_eq!(entry.location.as_deref(), Some("Starbucks"));
    }

    #[test]
    fn twelve_hour_edge_cases() {
        assert_eq!(
            parse("Lunch 12pm", today()).time,
            Some(ClockTime::new(12, 0).unwrap())
        );
        assert_eq!(
            parse("Wake 12am", today()).time,
            Some(ClockTime::new(0, 0).unwrap())
        );
        assert_eq!(
            parse("Call at 9:30AM", today()).time,
            Some(ClockTime::new(9, 30).unwrap())
        );
    }

    #[test]
    fn lowercase_trailing_place() {
        let entry = parse("Read book at home", today());
        assert_eq!(entry.title, "Read book");
        assert_eq!(entry.location.as_deref(), Some("home"));
    }

    #[test]
    fn multi_word_capitalized_place() {
        let entry = parse("Dinner today in New York", today());
        assert_eq!(entry.title, "Dinner");
        assert_eq!(entry.date, Some(today()));
        assert_eq!(entry.location.as_deref(), Some("New York"));
    }

    #[test]
    fn plain_text_is_left_alone() {
        let entry = parse("Write   quarterly report", today());
        assert_eq!(entry.title, "Write quarterly report");
        assert!(entry.date.is_none());
        assert!(!entry.has_time());
        assert!(entry.location.is_none());
    }

    #[test]
    fn empty_input() {
        let entry = parse("   ", today());
        assert_eq!(entry.title, "");
        assert!(entry.date.is_none());
    }

    #[test]
    fn record_uses_today_when_only_time_is_given() {
        let entry = parse("Standup 9am", today());
        let record = entry.to_record(today(), Utc.fix());
        assert_eq!(
            record.date,
            Some(Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap())
        );
        assert!(record.is_flexible());
        assert_eq!(record.title, "Standup");
    }
}
