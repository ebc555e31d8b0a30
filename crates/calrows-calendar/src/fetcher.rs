//! Walks the configured calendars and pages through each event feed.

use chrono::{DateTime, Utc};
use tracing::instrument;

use crate::client::CalendarClient;
use crate::error::CalendarError;
use crate::types::Event;

pub struct EventFetcher<'a> {
    client: &'a CalendarClient,
    calendar_ids: &'a [String],
    time_min: DateTime<Utc>,
    page_size: u32,
}

impl<'a> EventFetcher<'a> {
    pub fn new(
        client: &'a CalendarClient,
        calendar_ids: &'a [String],
        time_min: DateTime<Utc>,
        page_size: u32,
    ) -> Self {
        Self {
            client,
            calendar_ids,
            time_min,
            page_size,
        }
    }

    /// Fetch every event of every calendar, calendar by calendar.
    ///
    /// Request failures abort the whole fetch. Malformed events are skipped.
    pub async fn fetch_all(&self) -> Result<Vec<Event>, CalendarError> {
        let mut events = Vec::new();

        for calendar_id in self.calendar_ids {
            let fetched = self.fetch_calendar(calendar_id).await?;
            events.extend(fetched);
        }

        tracing::info!(
            "Fetched {} events from {} calendars",
            events.len(),
            self.calendar_ids.len()
        );
        Ok(events)
    }

    /// Follow `nextPageToken` until the feed of one calendar is exhausted.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch_calendar(&self, calendar_id: &str) -> Result<Vec<Event>, CalendarError> {
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;
        let mut first_page = true;

        loop {
            let page = self
                .client
                .list_events(
                    calendar_id,
                    self.time_min,
                    self.page_size,
                    page_token.as_deref(),
                )
                .await?;

            if first_page && page.items.is_empty() {
                tracing::info!("No upcoming events found in calendar {}", calendar_id);
            }
            first_page = false;

            for api_event in page.items {
                match Event::from_api(api_event, calendar_id) {
                    Ok(event) => events.push(event),
                    Err(e) => tracing::warn!("Skipping event in {}: {}", calendar_id, e),
                }
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use wiremock::matchers::{method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn time_min() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn ids(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_malformed_events_skipped() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/calendars/primary/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [
                    {"id": "ok1", "start": {"date": "2024-02-01"}, "end": {"date": "2024-02-02"}},
                    {"id": "bad", "start": {}, "end": {"date": "2024-02-02"}},
                    {"start": {"date": "2024-02-01"}, "end": {"date": "2024-02-02"}},
                    {"id": "ok2", "start": {"dateTime": "2024-02-03T10:00:00Z"}, "end": {"dateTime": "2024-02-03T11:00:00Z"}}
                ]
            })))
            .mount(&mock_server)
            .await;

        let client = CalendarClient::new("t", &mock_server.uri());
        let calendars = ids(&["primary"]);
        let fetcher = EventFetcher::new(&client, &calendars, time_min(), 2500);

        let events = fetcher.fetch_all().await.unwrap();
        let fetched: Vec<_> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(fetched, vec!["ok1", "ok2"]);
    }

    #[tokio::test]
    async fn test_empty_calendar_does_not_stop_the_walk() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/calendars/empty/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": []
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/calendars/busy/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [
                    {"id": "e1", "start": {"date": "2024-02-01"}, "end": {"date": "2024-02-02"}}
                ]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = CalendarClient::new("t", &mock_server.uri());
        let calendars = ids(&["empty", "busy"]);
        let fetcher = EventFetcher::new(&client, &calendars, time_min(), 2500);

        let events = fetcher.fetch_all().await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].calendar_id, "busy");
    }

    #[tokio::test]
    async fn test_follows_page_tokens() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/calendars/primary/events"))
            .and(query_param_is_missing("pageToken"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [
                    {"id": "e1", "start": {"date": "2024-02-01"}, "end": {"date": "2024-02-02"}}
                ],
                "nextPageToken": "page-2"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/calendars/primary/events"))
            .and(query_param("pageToken", "page-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [
                    {"id": "e2", "start": {"date": "2024-02-03"}, "end": {"date": "2024-02-04"}}
                ]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = CalendarClient::new("t", &mock_server.uri());
        let calendars = ids(&["primary"]);
        let fetcher = EventFetcher::new(&client, &calendars, time_min(), 1);

        let events = fetcher.fetch_calendar("primary").await.unwrap();
        let fetched: Vec<_> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(fetched, vec!["e1", "e2"]);
    }

    #[tokio::test]
    async fn test_request_failure_aborts_run() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/calendars/first/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [
                    {"id": "e1", "start": {"date": "2024-02-01"}, "end": {"date": "2024-02-02"}}
                ]
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/calendars/second/events"))
            .respond_with(ResponseTemplate::new(500).set_body_string("backend error"))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/calendars/third/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": []
            })))
            .expect(0)
            .mount(&mock_server)
            .await;

        let client = CalendarClient::new("t", &mock_server.uri());
        let calendars = ids(&["first", "second", "third"]);
        let fetcher = EventFetcher::new(&client, &calendars, time_min(), 2500);

        let result = fetcher.fetch_all().await;
        match result {
            Err(CalendarError::ApiError(msg)) => assert!(msg.contains("500")),
            other => panic!("unexpected result: {:?}", other.map(|e| e.len())),
        }
    }
}
