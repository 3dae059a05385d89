//! Provider payloads to [`EventRecord`]s.
//!
//! Covers the Google Calendar v3 event resource, the Microsoft Graph event
//! resource, and iCalendar feeds (Apple and other public `.ics` links).
//! Floating and `TZID`-qualified times are read as UTC.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use icalendar::{Calendar, CalendarComponent, Component};
use serde::{Deserialize, Serialize};

use crate::error::NormalizeError;
use crate::sync::types::{EventRecord, Provider, SyncStatus};

/// Shape of a fetched payload handed to [`normalize_payload`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadFormat {
    /// Already a JSON array of `EventRecord`s.
    #[default]
    Normalized,
    Google,
    Outlook,
    Ics,
}

impl FromStr for PayloadFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "normalized" | "json" => Ok(PayloadFormat::Normalized),
            "google" => Ok(PayloadFormat::Google),
            "outlook" => Ok(PayloadFormat::Outlook),
            "ics" | "ical" => Ok(PayloadFormat::Ics),
            other => Err(format!("unknown payload format: {other}")),
        }
    }
}

/// Start or end of a Google event. All-day events carry `date` only.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleEventTime {
    pub date_time: Option<DateTime<Utc>>,
    pub date: Option<NaiveDate>,
    pub time_zone: Option<String>,
}

impl GoogleEventTime {
    fn resolve(&self) -> Option<DateTime<Utc>> {
        self.date_time.or_else(|| self.date.map(midnight_utc))
    }
}

/// Subset of the Google Calendar event resource we read.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleEvent {
    pub id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub start: GoogleEventTime,
    #[serde(default)]
    pub end: GoogleEventTime,
    pub location: Option<String>,
    pub updated: Option<DateTime<Utc>>,
    pub html_link: Option<String>,
    pub hangout_link: Option<String>,
    /// `confirmed`, `tentative` or `cancelled`
    pub status: Option<String>,
}

impl GoogleEvent {
    /// Incremental sync reports deletions as cancelled stubs.
    pub fn is_cancelled(&self) -> bool {
        self.status.as_deref() == Some("cancelled")
    }
}

/// Normalize one Google event.
///
/// # Errors
///
/// Returns [`NormalizeError::BadPayload`] if the event has no usable start.
pub fn from_google(event: &GoogleEvent) -> Result<EventRecord, NormalizeError> {
    let start = event.start.resolve().ok_or_else(|| NormalizeError::BadPayload {
        provider: Provider::Google.to_string(),
        message: format!("event {:?} has no start", event.id),
    })?;

    let mut metadata = BTreeMap::new();
    if let Some(link) = &event.html_link {
        metadata.insert("html_link".to_string(), link.clone());
    }
    if let Some(link) = &event.hangout_link {
        metadata.insert("hangout_link".to_string(), link.clone());
    }

    let mut record = EventRecord::new(
        Provider::Google,
        event.summary.clone().unwrap_or_default(),
        start,
    );
    record.provider_event_id = event.id.clone();
    record.description = event.description.clone().unwrap_or_default();
    record.end_time = event.end.resolve();
    record.timezone = event.start.time_zone.clone();
    record.is_all_day = event.start.date.is_some() && event.start.date_time.is_none();
    record.location = event.location.clone().unwrap_or_default();
    record.last_modified = event.updated;
    record.metadata = metadata;
    Ok(record)
}

/// Start or end of a Graph event: a local wall time plus a zone name.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlookDateTime {
    pub date_time: String,
    pub time_zone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlookLocation {
    pub display_name: Option<String>,
}

/// Subset of the Microsoft Graph event resource we read.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlookEvent {
    pub id: Option<String>,
    pub subject: Option<String>,
    pub body_preview: Option<String>,
    pub start: OutlookDateTime,
    pub end: Option<OutlookDateTime>,
    #[serde(default)]
    pub is_all_day: bool,
    #[serde(default)]
    pub location: OutlookLocation,
    pub last_modified_date_time: Option<DateTime<Utc>>,
    pub importance: Option<String>,
    pub is_cancelled: Option<bool>,
    pub web_link: Option<String>,
}

/// Normalize one Microsoft Graph event.
///
/// # Errors
///
/// Returns [`NormalizeError::BadTimestamp`] if the start or end cannot be
/// parsed.
pub fn from_outlook(event: &OutlookEvent) -> Result<EventRecord, NormalizeError> {
    let start = parse_graph_datetime(&event.start.date_time)?;
    let end = event
        .end
        .as_ref()
        .map(|end| parse_graph_datetime(&end.date_time))
        .transpose()?;

    let mut metadata = BTreeMap::new();
    if let Some(importance) = &event.importance {
        metadata.insert("importance".to_string(), importance.clone());
    }
    if let Some(cancelled) = event.is_cancelled {
        metadata.insert("is_cancelled".to_string(), cancelled.to_string());
    }
    if let Some(link) = &event.web_link {
        metadata.insert("web_link".to_string(), link.clone());
    }

    let mut record = EventRecord::new(
        Provider::Outlook,
        event.subject.clone().unwrap_or_default(),
        start,
    );
    record.provider_event_id = event.id.clone();
    record.description = event.body_preview.clone().unwrap_or_default();
    record.end_time = end;
    record.timezone = event.start.time_zone.clone();
    record.is_all_day = event.is_all_day;
    record.location = event.location.display_name.clone().unwrap_or_default();
    record.last_modified = event.last_modified_date_time;
    record.metadata = metadata;
    Ok(record)
}

/// Graph returns `2024-03-04T10:00:00.0000000` with the zone in a sibling
/// field.
fn parse_graph_datetime(value: &str) -> Result<DateTime<Utc>, NormalizeError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|_| NormalizeError::BadTimestamp(value.to_string()))
}

/// Parse an iCalendar feed into Apple-provider events.
///
/// `VEVENT`s without `UID` or a parseable `DTSTART` are skipped.
///
/// # Errors
///
/// Returns [`NormalizeError::Ics`] if the feed is not valid iCalendar.
pub fn parse_ics(data: &str) -> Result<Vec<EventRecord>, NormalizeError> {
    let calendar: Calendar = data.parse().map_err(|e| NormalizeError::Ics(format!("{e}")))?;

    let mut events = Vec::new();
    for component in &calendar.components {
        let CalendarComponent::Event(vevent) = component else {
            continue;
        };

        let props = vevent.properties();
        let uid = vevent.get_uid().map(str::to_string);
        let start = props.get("DTSTART").and_then(|p| parse_ics_date(p.value()));

        let (Some(uid), Some(start)) = (uid, start) else {
            tracing::warn!(
                summary = vevent.get_summary().unwrap_or_default(),
                "skipping VEVENT without UID or DTSTART"
            );
            continue;
        };

        let is_all_day = props
            .get("DTSTART")
            .is_some_and(|p| p.value().trim().len() == 8);

        let mut record = EventRecord::new(
            Provider::Apple,
            vevent.get_summary().unwrap_or("Untitled Event"),
            start,
        );
        record.provider_event_id = Some(uid);
        record.description = vevent.get_description().unwrap_or_default().to_string();
        record.end_time = props.get("DTEND").and_then(|p| parse_ics_date(p.value()));
        record.is_all_day = is_all_day;
        record.location = props
            .get("LOCATION")
            .map(|p| p.value().to_string())
            .unwrap_or_default();
        record.last_modified = props
            .get("LAST-MODIFIED")
            .and_then(|p| parse_ics_date(p.value()));
        record.sync_status = SyncStatus::Synced;
        events.push(record);
    }

    Ok(events)
}

/// `20231027T100000Z`, floating `20231027T100000`, or date-only `20231027`.
fn parse_ics_date(value: &str) -> Option<DateTime<Utc>> {
    let val = value.trim();
    if val.len() == 8 {
        NaiveDate::parse_from_str(val, "%Y%m%d").ok().map(midnight_utc)
    } else {
        NaiveDateTime::parse_from_str(
            val,
            if val.ends_with('Z') {
                "%Y%m%dT%H%M%SZ"
            } else {
                "%Y%m%dT%H%M%S"
            },
        )
        .ok()
        .map(|d| Utc.from_utc_datetime(&d))
    }
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::default()))
}

/// Either a bare array or the provider's list envelope.
#[derive(Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Bare(Vec<T>),
    Google { items: Vec<T> },
    Graph { value: Vec<T> },
}

impl<T> Listing<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Listing::Bare(items) => items,
            Listing::Google { items } => items,
            Listing::Graph { value } => value,
        }
    }
}

/// Normalize a whole fetched payload.
///
/// Individual provider events that cannot be normalized are skipped with a
/// warning rather than failing the batch.
///
/// # Errors
///
/// Returns an error only when the payload as a whole cannot be decoded.
pub fn normalize_payload(
    format: PayloadFormat,
    payload: &str,
) -> Result<Vec<EventRecord>, NormalizeError> {
    let bad = |provider: &str, e: serde_json::Error| NormalizeError::BadPayload {
        provider: provider.to_string(),
        message: e.to_string(),
    };

    match format {
        PayloadFormat::Normalized => {
            let items: Vec<serde_json::Value> =
                serde_json::from_str(payload).map_err(|e| bad("normalized", e))?;
            Ok(keep_valid(items.into_iter().map(|item| {
                serde_json::from_value::<EventRecord>(item).map_err(|e| bad("normalized", e))
            })))
        }
        PayloadFormat::Google => {
            let listing: Listing<serde_json::Value> =
                serde_json::from_str(payload).map_err(|e| bad("google", e))?;
            let events = listing.into_vec().into_iter().filter_map(|item| {
                match serde_json::from_value::<GoogleEvent>(item) {
                    Ok(event) if event.is_cancelled() => {
                        tracing::debug!(id = ?event.id, "dropping cancelled google event");
                        None
                    }
                    Ok(event) => Some(from_google(&event)),
                    Err(e) => Some(Err(bad("google", e))),
                }
            });
            Ok(keep_valid(events))
        }
        PayloadFormat::Outlook => {
            let listing: Listing<serde_json::Value> =
                serde_json::from_str(payload).map_err(|e| bad("outlook", e))?;
            Ok(keep_valid(listing.into_vec().into_iter().map(|item| {
                let event: OutlookEvent =
                    serde_json::from_value(item).map_err(|e| bad("outlook", e))?;
                from_outlook(&event)
            })))
        }
        PayloadFormat::Ics => parse_ics(payload),
    }
}

fn keep_valid(
    results: impl Iterator<Item = Result<EventRecord, NormalizeError>>,
) -> Vec<EventRecord> {
    results
        .filter_map(|result| match result {
            Ok(event) => Some(event),
            Err(e) => {
                tracing::warn!(error = %e, "skipping event that could not be normalized");
                None
            }
        })
        .collect()
}
