//! Google Calendar API client.

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::instrument;

use crate::error::CalendarError;
use crate::types::EventListResponse;

pub struct CalendarClient {
    client: reqwest::Client,
    access_token: String,
    base_url: String,
}

impl CalendarClient {
    /// Client for the API rooted at `base_url` (no trailing slash needed).
    pub fn new(access_token: &str, base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            access_token: access_token.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    /// Fetch one page of single events from a calendar, ordered by start time.
    #[instrument(skip(self), level = "debug")]
    pub async fn list_events(
        &self,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<EventListResponse, CalendarError> {
        let url = format!(
            "{}/calendars/{}/events",
            self.base_url,
            urlencoding::encode(calendar_id),
        );

        let response = self
            .client
            .get(&url)
            .header("Authorization", self.auth_header())
            .query(&build_query_parameters(time_min, page_size, page_token))
            .send()
            .await?;

        let page: EventListResponse = self.handle_response(response, calendar_id).await?;
        tracing::debug!(
            "fetched {} events from {} (more: {})",
            page.items.len(),
            calendar_id,
            page.next_page_token.is_some()
        );
        Ok(page)
    }

    /// Helper to handle API responses and errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
        calendar_id: &str,
    ) -> Result<T, CalendarError> {
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| CalendarError::ApiError(format!("JSON parse error: {}", e)))
        } else if status.as_u16() == 401 {
            Err(CalendarError::TokenExpired)
        } else if status.as_u16() == 403 {
            Err(CalendarError::AuthRequired)
        } else if status.as_u16() == 404 {
            Err(CalendarError::CalendarNotFound(calendar_id.to_string()))
        } else if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            Err(CalendarError::RateLimited(retry_after))
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(CalendarError::ApiError(format!("{}: {}", status, text)))
        }
    }
}

fn build_query_parameters(
    time_min: DateTime<Utc>,
    page_size: u32,
    page_token: Option<&str>,
) -> Vec<(&'static str, String)> {
    let mut query_parameters = vec![
        // expand recurring events into their instances
        ("singleEvents", "true".to_owned()),
        ("orderBy", "startTime".to_owned()),
        ("timeMin", time_min.to_rfc3339_opts(SecondsFormat::Secs, true)),
        ("maxResults", page_size.to_string()),
    ];

    if let Some(token) = page_token {
        query_parameters.push(("pageToken", token.to_owned()));
    }

    query_parameters
}
