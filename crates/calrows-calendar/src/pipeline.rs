//! Fetch, normalize, and optionally persist in one pass.

use calrows_core::{CalendarConfig, SinkConfig};

use crate::client::CalendarClient;
use crate::error::CalendarError;
use crate::fetcher::EventFetcher;
use crate::normalize::EventTable;
use crate::sink::SqliteSink;

/// What happened to the rows after they were fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    Disabled,
    Persisted(usize),
    Failed,
}

#[derive(Debug)]
pub struct PipelineOutput {
    pub table: EventTable,
    pub persist: PersistOutcome,
}

pub struct Pipeline {
    calendar: CalendarConfig,
    sink: SinkConfig,
}

impl Pipeline {
    pub fn new(calendar: CalendarConfig, sink: SinkConfig) -> Self {
        Self { calendar, sink }
    }

    /// Run once against `client`.
    ///
    /// Fetch errors are returned. Sink errors are logged and reported as
    /// [`PersistOutcome::Failed`].
    pub async fn run(&self, client: &CalendarClient) -> Result<PipelineOutput, CalendarError> {
        let fetcher = EventFetcher::new(
            client,
            &self.calendar.calendar_ids,
            self.calendar.time_min,
            self.calendar.page_size,
        );
        let events = fetcher.fetch_all().await?;
        let table = EventTable::from_events(&events);

        let persist = if self.sink.enabled {
            self.persist(&table)
        } else {
            tracing::debug!("Sink disabled, skipping database write");
            PersistOutcome::Disabled
        };

        Ok(PipelineOutput { table, persist })
    }

    fn persist(&self, table: &EventTable) -> PersistOutcome {
        let result = SqliteSink::from_config(&self.sink).and_then(|sink| sink.write(table));
        match result {
            Ok(n) => PersistOutcome::Persisted(n),
            Err(e) => {
                tracing::error!("Failed to store events: {} ({})", e.user_message(), e);
                PersistOutcome::Failed
            }
        }
    }
}
