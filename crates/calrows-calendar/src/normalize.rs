//! Flattening of event records into fixed-column rows.

use serde::Serialize;
use std::fmt;

use crate::types::Event;

pub const COLUMNS: [&str; 7] = [
    "ID",
    "Calendar ID",
    "Summary",
    "Start Time",
    "End Time",
    "Guests",
    "Created At",
];

/// One flattened event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventRow {
    pub id: String,
    pub calendar_id: String,
    pub summary: String,
    pub start_time: String,
    pub end_time: String,
    /// Attendee emails joined with `", "`
    pub guests: String,
    pub created_at: Option<String>,
}

impl From<&Event> for EventRow {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id.clone(),
            calendar_id: event.calendar_id.clone(),
            summary: event.summary.clone(),
            start_time: event.start.as_str().to_string(),
            end_time: event.end.as_str().to_string(),
            guests: event.attendees.join(", "),
            created_at: event.created.clone(),
        }
    }
}

impl EventRow {
    fn cells(&self) -> [&str; 7] {
        [
            &self.id,
            &self.calendar_id,
            &self.summary,
            &self.start_time,
            &self.end_time,
            &self.guests,
            self.created_at.as_deref().unwrap_or(""),
        ]
    }
}

/// All rows of a run, in fetch order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EventTable {
    rows: Vec<EventRow>,
}

impl EventTable {
    pub fn from_events<'a, I>(events: I) -> Self
    where
        I: IntoIterator<Item = &'a Event>,
    {
        Self {
            rows: events.into_iter().map(EventRow::from).collect(),
        }
    }

    pub fn rows(&self) -> &[EventRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Renders an aligned text table, one line per row.
impl fmt::Display for EventTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rows.is_empty() {
            return writeln!(f, "Empty table (0 rows)");
        }

        let mut widths = COLUMNS.map(|c| c.chars().count());
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row.cells()) {
                *width = (*width).max(cell.chars().count());
            }
        }

        write_line(f, &COLUMNS, &widths)?;
        for row in &self.rows {
            write_line(f, &row.cells(), &widths)?;
        }
        writeln!(f, "[{} rows x {} columns]", self.rows.len(), COLUMNS.len())
    }
}

fn write_line(f: &mut fmt::Formatter<'_>, cells: &[&str; 7], widths: &[usize; 7]) -> fmt::Result {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect::<Vec<_>>()
        .join("  ");
    writeln!(f, "{}", line.trim_end())
}
