//! Google Calendar event export.
//!
//! Pages through the events of each configured calendar, flattens them into
//! rows and optionally stores the rows in SQLite.

pub mod client;
pub mod error;
pub mod fetcher;
pub mod normalize;
pub mod pipeline;
pub mod sink;
pub mod timestamp;
pub mod types;

pub use client::CalendarClient;
pub use error::CalendarError;
pub use fetcher::EventFetcher;
pub use normalize::{EventRow, EventTable, COLUMNS};
pub use pipeline::{PersistOutcome, Pipeline, PipelineOutput};
pub use sink::SqliteSink;
pub use timestamp::{parse_timestamp, Timestamp, TimestampError};
pub use types::{Event, EventTime};
