//! SQLite sink for flattened event rows.

use calrows_core::config::is_valid_identifier;
use calrows_core::{DatabaseError, RusqliteErrorExt, SinkConfig};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use tracing::instrument;

use crate::normalize::EventTable;
use crate::timestamp::parse_column;

/// Appends an [`EventTable`] to one table of a SQLite database.
///
/// Each call opens its own connection and closes it before returning.
/// Rows are never deduplicated; every write adds one row per table row.
#[derive(Debug, Clone)]
pub struct SqliteSink {
    database_path: PathBuf,
    table: String,
}

impl SqliteSink {
    pub fn new<P: AsRef<Path>>(database_path: P, table: &str) -> Result<Self, DatabaseError> {
        if !is_valid_identifier(table) {
            return Err(DatabaseError::QueryFailed(format!(
                "invalid table name: {:?}",
                table
            )));
        }
        Ok(Self {
            database_path: database_path.as_ref().to_path_buf(),
            table: table.to_string(),
        })
    }

    pub fn from_config(config: &SinkConfig) -> Result<Self, DatabaseError> {
        Self::new(&config.database_path, &config.table)
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    fn connect(&self) -> Result<Connection, DatabaseError> {
        Connection::open(&self.database_path).map_err(|e| {
            DatabaseError::ConnectionFailed(format!("{}: {}", self.database_path.display(), e))
        })
    }

    fn init_schema(&self, conn: &Connection) -> Result<(), DatabaseError> {
        conn.execute_batch(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS main."{}" (
                id TEXT NOT NULL,
                calendar_id TEXT NOT NULL,
                summary TEXT,
                start_time TEXT,
                end_time TEXT,
                guests TEXT,
                created_at TEXT
            );
            "#,
            self.table
        ))
        .map_err(|e| e.into_database_error())
    }

    /// Insert every row in one transaction. Returns the number of rows written.
    ///
    /// Nothing is committed unless every insert succeeds.
    #[instrument(skip(self, table), fields(rows = table.len(), table_name = %self.table))]
    pub fn write(&self, table: &EventTable) -> Result<usize, DatabaseError> {
        let mut conn = self.connect()?;
        self.init_schema(&conn)?;

        let tx = conn.transaction().map_err(|e| e.into_database_error())?;
        {
            let mut stmt = tx
                .prepare_cached(&format!(
                    r#"INSERT INTO main."{}"
                    (id, calendar_id, summary, start_time, end_time, guests, created_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#,
                    self.table
                ))
                .map_err(|e| e.into_database_error())?;

            for row in table.rows() {
                let start = parse_column(Some(row.start_time.as_str()), "start_time", &row.id);
                let end = parse_column(Some(row.end_time.as_str()), "end_time", &row.id);
                let created = parse_column(row.created_at.as_deref(), "created_at", &row.id);

                stmt.execute(params![
                    row.id,
                    row.calendar_id,
                    row.summary,
                    start.map(|t| t.to_string()),
                    end.map(|t| t.to_string()),
                    row.guests,
                    created.map(|t| t.to_string()),
                ])
                .map_err(|e| e.into_database_error())?;
            }
        }
        tx.commit().map_err(|e| e.into_database_error())?;

        tracing::info!(
            "Stored {} rows in {}",
            table.len(),
            self.database_path.display()
        );
        Ok(table.len())
    }

    /// Count rows currently in the table.
    pub fn count_rows(&self) -> Result<usize, DatabaseError> {
        let conn = self.connect()?;
        self.init_schema(&conn)?;
        let count: i64 = conn
            .query_row(
                &format!(r#"SELECT COUNT(*) FROM main."{}""#, self.table),
                [],
                |row| row.get(0),
            )
            .map_err(|e| e.into_database_error())?;
        Ok(count.max(0) as usize)
    }
}
