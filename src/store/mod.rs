//! Durable detection storage.
//!
//! Append-only SQLite log of consolidated detections plus the recency query.
//! Rows are immutable once inserted; retention and cleanup are out of scope.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use tracing::debug;

use crate::clipper::Detection;
use crate::error::{Error, Result};

/// One persisted detection row.
///
/// The seven payload fields are a stable on-disk schema shared with
/// downstream consumers; their names and meaning must not change.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DetectionRecord {
    /// Row id.
    pub id: i64,
    /// Species common name.
    pub common_name: String,
    /// Species scientific name.
    pub scientific_name: String,
    /// Confidence of the representative raw hit.
    pub confidence: f64,
    /// Classifier-internal label tag.
    pub label: String,
    /// Evidence clip path; NULL when no clip directory was configured or the
    /// clip write failed.
    pub file_path: Option<String>,
    /// Window-relative start time in seconds.
    pub start_time: f64,
    /// Window-relative end time in seconds.
    pub end_time: f64,
    /// Creation timestamp assigned by the store at insert time.
    pub timestamp: DateTime<Utc>,
}

/// Append-only store of consolidated detections.
///
/// Writes are atomic single-row inserts; WAL journal mode lets concurrent
/// readers (the query surface, external display layers) run against the
/// appending writer without blocking it.
pub struct DetectionStore {
    pool: SqlitePool,
    // Clamp against wall-clock steps so assigned timestamps never decrease.
    last_timestamp: Mutex<DateTime<Utc>>,
}

impl DetectionStore {
    /// Open (creating if missing) the detection database at `path`.
    pub async fn open(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| Error::StoreOpen {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(Self {
            pool,
            last_timestamp: Mutex::new(DateTime::<Utc>::MIN_UTC),
        })
    }

    /// Create the schema if it does not exist.
    ///
    /// Explicit and idempotent; called once at process startup, safe to call
    /// again.
    pub async fn init(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS detections (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                common_name TEXT NOT NULL,
                scientific_name TEXT NOT NULL,
                confidence REAL NOT NULL,
                label TEXT NOT NULL,
                file_path TEXT,
                start_time REAL NOT NULL,
                end_time REAL NOT NULL,
                timestamp TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_detections_species_ts
             ON detections (common_name, timestamp)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Append one detection, assigning its creation timestamp.
    ///
    /// No uniqueness constraint applies: repeated species within or across
    /// windows persist as separate rows, and deduplication happens at read
    /// time. Returns the assigned timestamp.
    pub async fn insert(&self, detection: &Detection) -> Result<DateTime<Utc>> {
        let timestamp = self.next_timestamp();

        sqlx::query(
            r"
            INSERT INTO detections
                (common_name, scientific_name, confidence, label, file_path,
                 start_time, end_time, timestamp)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(&detection.common_name)
        .bind(&detection.scientific_name)
        .bind(f64::from(detection.confidence))
        .bind(&detection.label)
        .bind(
            detection
                .clip_path
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned()),
        )
        .bind(detection.start_time)
        .bind(detection.end_time)
        .bind(timestamp)
        .execute(&self.pool)
        .await?;

        debug!(
            "stored detection: {} ({:.2})",
            detection.common_name, detection.confidence
        );
        Ok(timestamp)
    }

    /// The most recent detection per distinct species within a trailing
    /// window, subject to a confidence floor.
    ///
    /// The latest-per-species row is chosen over the *unfiltered* history
    /// first; the window and confidence filters apply to that row afterwards.
    /// A species whose latest sighting is stale or under-confident therefore
    /// yields nothing, even when an older row would have passed — the query
    /// answers "is each species' most recent sighting itself recent and
    /// confident", not "what is the most recent confident sighting ever".
    /// Equal timestamps (possible after a backward clock step, since insert
    /// clamps rather than bumps) tie-break on rowid, so exactly one row per
    /// species survives. Results are ordered by creation timestamp
    /// descending, newest insert first.
    pub async fn query_recent(
        &self,
        limit: u32,
        min_confidence: f32,
        window: Duration,
    ) -> Result<Vec<DetectionRecord>> {
        let cutoff = Utc::now() - window;

        let records = sqlx::query_as::<_, DetectionRecord>(
            r"
            SELECT id, common_name, scientific_name, confidence, label,
                   file_path, start_time, end_time, timestamp
            FROM detections
            WHERE timestamp >= ? AND confidence >= ?
              AND id = (
                  SELECT d2.id
                  FROM detections AS d2
                  WHERE d2.common_name = detections.common_name
                  ORDER BY d2.timestamp DESC, d2.id DESC
                  LIMIT 1
              )
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
            ",
        )
        .bind(cutoff)
        .bind(f64::from(min_confidence))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    fn next_timestamp(&self) -> DateTime<Utc> {
        let mut last = match self.last_timestamp.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let now = Utc::now().max(*last);
        *last = now;
        now
    }
}
