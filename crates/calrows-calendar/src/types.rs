//! Calendar API types and the event record derived from them.

use serde::{Deserialize, Serialize};

use crate::error::CalendarError;

/// Summary used when the feed omits one.
pub const DEFAULT_SUMMARY: &str = "No summary available";

/// Calendar event as read from one calendar's feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub calendar_id: String,
    pub summary: String,
    pub start: EventTime,
    pub end: EventTime,
    /// Attendee emails; entries without an email are dropped.
    pub attendees: Vec<String>,
    pub created: Option<String>,
}

/// Event boundary - either an all-day date or a timestamp with offset.
///
/// The raw feed string is kept verbatim so rows show exactly what Google sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventTime {
    Date(String),
    DateTime(String),
}

impl EventTime {
    pub fn as_str(&self) -> &str {
        match self {
            EventTime::Date(s) | EventTime::DateTime(s) => s,
        }
    }
}

// API Response Types

/// Google Calendar API event resource (only the fields we flatten).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEvent {
    pub id: Option<String>,
    pub summary: Option<String>,
    pub start: Option<ApiEventTime>,
    pub end: Option<ApiEventTime>,
    #[serde(default)]
    pub attendees: Vec<ApiAttendee>,
    pub created: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEventTime {
    pub date_time: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiAttendee {
    pub email: Option<String>,
}

/// API response for event list.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventListResponse {
    #[serde(default)]
    pub items: Vec<ApiEvent>,
    pub next_page_token: Option<String>,
}

impl Event {
    /// Convert an API event from `calendar_id` into an event record.
    ///
    /// Fails when the id is missing or a boundary carries neither `date`
    /// nor `dateTime`.
    pub fn from_api(api: ApiEvent, calendar_id: &str) -> Result<Self, CalendarError> {
        let id = api
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| CalendarError::InvalidEventData("event without id".to_string()))?;

        let start = select_time(api.start.as_ref()).ok_or_else(|| {
            CalendarError::InvalidEventData(format!("event {} has no start date or dateTime", id))
        })?;
        let end = select_time(api.end.as_ref()).ok_or_else(|| {
            CalendarError::InvalidEventData(format!("event {} has no end date or dateTime", id))
        })?;

        let attendees = api
            .attendees
            .into_iter()
            .filter_map(|a| a.email)
            .collect();

        Ok(Self {
            id,
            calendar_id: calendar_id.to_string(),
            summary: api.summary.unwrap_or_else(|| DEFAULT_SUMMARY.to_string()),
            start,
            end,
            attendees,
            created: api.created,
        })
    }
}

/// Prefer the all-day `date`, else `dateTime`.
fn select_time(api: Option<&ApiEventTime>) -> Option<EventTime> {
    let api = api?;
    let non_empty = |s: &Option<String>| s.as_ref().filter(|s| !s.is_empty()).cloned();

    non_empty(&api.date)
        .map(EventTime::Date)
        .or_else(|| non_empty(&api.date_time).map(EventTime::DateTime))
}
