//! Storage layer for the duty logbook.
//!
//! Provides persistence for duty events and annotations using `rusqlite`,
//! and the applier that turns a merge outcome list into row operations.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but
//! not `Sync`. A `Database` instance can be moved between threads but cannot
//! be shared across threads without external synchronization.
//!
//! # Schema
//!
//! Timestamps are stored as TEXT in RFC 3339 format (e.g.
//! `2024-01-15T10:30:00.000Z`) so lexicographic ordering matches
//! chronological ordering and values stay human-readable. Origin and status
//! are stored as their canonical strings and parsed back through the core
//! enums, so an unknown value surfaces as an error instead of a silently
//! wrong record.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, params};
use thiserror::Error;

use eld_core::{
    Annotation, AnnotationId, AnnotationStore, DriverId, DutyEvent, EventId, Origin, Outcome,
    OutcomeKind,
};

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Failed to parse a stored timestamp.
    #[error("invalid timestamp for {record_id}: {timestamp}")]
    TimestampParse {
        record_id: String,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A stored row holds a value the domain enums reject.
    #[error("invalid stored data for {record_id}: {message}")]
    InvalidRecord { record_id: String, message: String },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// Formats a timestamp for storage.
fn format_timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses a stored timestamp.
fn parse_timestamp(record_id: &str, raw: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|source| DbError::TimestampParse {
            record_id: record_id.to_string(),
            timestamp: raw.to_string(),
            source,
        })
}

/// A raw `duty_events` row before domain validation.
struct EventRow {
    id: String,
    driver: Option<String>,
    datetime: String,
    origin: String,
    status: String,
    location: Option<String>,
    odometer: Option<f64>,
    engine_hours: Option<f64>,
    miles_accumulated: Option<f64>,
    hours_accumulated: Option<f64>,
    duration_minutes: Option<i64>,
}

const EVENT_COLUMNS: &str = "id, driver, datetime, origin, status, location, odometer, \
     engine_hours, miles_accumulated, hours_accumulated, duration_minutes";

fn read_event_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EventRow> {
    Ok(EventRow {
        id: row.get(0)?,
        driver: row.get(1)?,
        datetime: row.get(2)?,
        origin: row.get(3)?,
        status: row.get(4)?,
        location: row.get(5)?,
        odometer: row.get(6)?,
        engine_hours: row.get(7)?,
        miles_accumulated: row.get(8)?,
        hours_accumulated: row.get(9)?,
        duration_minutes: row.get(10)?,
    })
}

impl EventRow {
    fn into_event(self) -> Result<DutyEvent, DbError> {
        let invalid = |message: String| DbError::InvalidRecord {
            record_id: self.id.clone(),
            message,
        };

        let id = EventId::new(self.id.clone()).map_err(|e| invalid(e.to_string()))?;
        let driver = match &self.driver {
            Some(raw) => Some(DriverId::new(raw.clone()).map_err(|e| invalid(e.to_string()))?),
            None => None,
        };
        let origin: Origin = self.origin.parse().map_err(
            |e: eld_core::ValidationError| invalid(e.to_string()),
        )?;
        let status = self
            .status
            .parse()
            .map_err(|e: eld_core::ValidationError| invalid(e.to_string()))?;
        let datetime = parse_timestamp(&self.id, &self.datetime)?;

        Ok(DutyEvent {
            id,
            driver,
            datetime,
            origin,
            status,
            location: self.location,
            odometer: self.odometer,
            engine_hours: self.engine_hours,
            miles_accumulated: self.miles_accumulated,
            hours_accumulated: self.hours_accumulated,
            duration_minutes: self.duration_minutes,
        })
    }
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection
    /// closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            -- Duty events: one row per timeline interval start
            -- datetime: RFC 3339 format (e.g. '2024-01-15T10:30:00.000Z')
            -- driver: NULL for unidentified records
            CREATE TABLE IF NOT EXISTS duty_events (
                id TEXT PRIMARY KEY,
                driver TEXT,
                datetime TEXT NOT NULL,
                origin TEXT NOT NULL,
                status TEXT NOT NULL,
                location TEXT,
                odometer REAL,
                engine_hours REAL,
                miles_accumulated REAL,
                hours_accumulated REAL,
                duration_minutes INTEGER
            );

            CREATE INDEX IF NOT EXISTS idx_duty_events_driver_datetime
                ON duty_events(driver, datetime);
            CREATE INDEX IF NOT EXISTS idx_duty_events_datetime
                ON duty_events(datetime);

            CREATE TABLE IF NOT EXISTS annotations (
                id TEXT PRIMARY KEY,
                driver TEXT,
                event_id TEXT NOT NULL,
                recorded_at TEXT NOT NULL,
                comment TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_annotations_event
                ON annotations(event_id);
            ",
        )?;
        Ok(())
    }

    /// Inserts a single event, failing on a duplicate ID.
    pub fn insert_event(&mut self, event: &DutyEvent) -> Result<(), DbError> {
        let tx = self.conn.transaction()?;
        insert_event_tx(&tx, event)?;
        tx.commit()?;
        Ok(())
    }

    /// The driver's timeline, ordered ascending by start time.
    pub fn duty_timeline(&self, driver: &DriverId) -> Result<Vec<DutyEvent>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "
            SELECT {EVENT_COLUMNS}
            FROM duty_events
            WHERE driver = ?
            ORDER BY datetime ASC, id ASC
            "
        ))?;
        let rows = stmt.query_map([driver.as_str()], read_event_row)?;
        let mut events = Vec::new();
        for row in rows {
            events.push(row?.into_event()?);
        }
        Ok(events)
    }

    /// Looks up one event by ID.
    pub fn get_event(&self, id: &EventId) -> Result<Option<DutyEvent>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {EVENT_COLUMNS} FROM duty_events WHERE id = ?"
        ))?;
        let mut rows = stmt.query_map([id.as_str()], read_event_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?.into_event()?)),
            None => Ok(None),
        }
    }

    /// Applies a merge outcome list as row operations in one transaction.
    ///
    /// Either every outcome is persisted or none is: a failure part-way
    /// rolls the whole batch back.
    pub fn apply_outcomes(&mut self, outcomes: &[Outcome]) -> Result<(), DbError> {
        if outcomes.is_empty() {
            return Ok(());
        }
        let tx = self.conn.transaction()?;
        for outcome in outcomes {
            match outcome.kind {
                OutcomeKind::New => insert_event_tx(&tx, &outcome.event)?,
                OutcomeKind::Edited | OutcomeKind::Rejected | OutcomeKind::CloseDrive => {
                    upsert_event_tx(&tx, &outcome.event)?;
                }
                OutcomeKind::Removed => {
                    tx.execute(
                        "DELETE FROM duty_events WHERE id = ?",
                        [outcome.event.id.as_str()],
                    )?;
                }
                OutcomeKind::NoChange => {}
            }
        }
        tx.commit()?;
        tracing::debug!(outcomes = outcomes.len(), "applied merge outcomes");
        Ok(())
    }

    /// The stored annotation for a duty event, if any.
    pub fn annotation_for_event(&self, event: &EventId) -> Result<Option<Annotation>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, driver, event_id, recorded_at, comment
            FROM annotations
            WHERE event_id = ?
            ",
        )?;
        let mut rows = stmt.query_map([event.as_str()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;
        let Some(row) = rows.next() else {
            return Ok(None);
        };
        let (id, driver, event_id, recorded_at, comment) = row?;
        let invalid = |message: String| DbError::InvalidRecord {
            record_id: id.clone(),
            message,
        };
        Ok(Some(Annotation {
            id: AnnotationId::new(id.clone()).map_err(|e| invalid(e.to_string()))?,
            driver: match driver {
                Some(raw) => Some(DriverId::new(raw).map_err(|e| invalid(e.to_string()))?),
                None => None,
            },
            recorded_at: parse_timestamp(&id, &recorded_at)?,
            event_id: EventId::new(event_id).map_err(|e| invalid(e.to_string()))?,
            comment,
        }))
    }

    /// Inserts or replaces an annotation.
    pub fn upsert_annotation(&mut self, annotation: &Annotation) -> Result<(), DbError> {
        self.conn.execute(
            "
            INSERT OR REPLACE INTO annotations
            (id, driver, event_id, recorded_at, comment)
            VALUES (?, ?, ?, ?, ?)
            ",
            params![
                annotation.id.as_str(),
                annotation.driver.as_ref().map(DriverId::as_str),
                annotation.event_id.as_str(),
                format_timestamp(annotation.recorded_at),
                annotation.comment,
            ],
        )?;
        Ok(())
    }
}

impl AnnotationStore for Database {
    type Error = DbError;

    fn annotation_for(&self, event: &EventId) -> Result<Option<Annotation>, Self::Error> {
        self.annotation_for_event(event)
    }
}

fn insert_event_tx(tx: &rusqlite::Transaction<'_>, event: &DutyEvent) -> Result<(), DbError> {
    write_event_tx(
        tx,
        &format!(
            "INSERT INTO duty_events ({EVENT_COLUMNS}) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ),
        event,
    )
}

fn upsert_event_tx(tx: &rusqlite::Transaction<'_>, event: &DutyEvent) -> Result<(), DbError> {
    write_event_tx(
        tx,
        &format!(
            "INSERT OR REPLACE INTO duty_events ({EVENT_COLUMNS}) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ),
        event,
    )
}

fn write_event_tx(
    tx: &rusqlite::Transaction<'_>,
    sql: &str,
    event: &DutyEvent,
) -> Result<(), DbError> {
    tx.execute(
        sql,
        params![
            event.id.as_str(),
            event.driver.as_ref().map(DriverId::as_str),
            format_timestamp(event.datetime),
            event.origin.as_str(),
            event.status.as_str(),
            event.location,
            event.odometer,
            event.engine_hours,
            event.miles_accumulated,
            event.hours_accumulated,
            event.duration_minutes,
        ],
    )?;
    Ok(())
}
