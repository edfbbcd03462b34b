//! SQLite-backed [`EventStore`] for discovered vendor events.
//!
//! One table, `vendor_event`, unique on `(vendor_id, source_url)`. Writes go
//! through a single-permit semaphore so concurrent refreshes for the same
//! vendor never race on the uniqueness check.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scout_common::{CandidateEvent, Result, ScoutError, StoredEvent};
use scout_discovery::EventStore;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS vendor_event (
  id            INTEGER PRIMARY KEY AUTOINCREMENT,
  vendor_id     TEXT NOT NULL,
  event_name    TEXT NOT NULL,
  description   TEXT NOT NULL,
  location      TEXT NOT NULL,
  contact_phone TEXT,
  contact_email TEXT,
  stall_info    TEXT NOT NULL,
  event_date    TEXT NOT NULL,
  source_url    TEXT NOT NULL,
  created_at    TEXT NOT NULL,
  UNIQUE (vendor_id, source_url)
);
CREATE INDEX IF NOT EXISTS vendor_event_vendor ON vendor_event (vendor_id);
"#;

pub struct SqliteEventStore {
    pool: SqlitePool,
    write_limit: Arc<Semaphore>,
}

impl SqliteEventStore {
    /// Open (creating if needed) the database at `database_url` and apply the schema.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let opts = SqliteConnectOptions::from_str(database_url)
            .map_err(store_err)?
            .create_if_missing(true);
        let max_connections = if database_url.contains(":memory:") { 1 } else { 4 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(opts)
            .await
            .map_err(store_err)?;
        info!(database_url = %database_url, "store.connect");

        let store = Self::from_pool(pool);
        store.migrate().await?;
        Ok(store)
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            write_limit: Arc::new(Semaphore::new(1)),
        }
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        debug!("store.migrate");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl EventStore for SqliteEventStore {
    async fn insert_if_absent(&self, vendor_id: &str, event: &CandidateEvent) -> Result<bool> {
        let _permit = self
            .write_limit
            .acquire()
            .await
            .map_err(|e| ScoutError::Store(e.to_string()))?;

        let res = sqlx::query(
            r#"INSERT INTO vendor_event
            (vendor_id, event_name, description, location, contact_phone,
             contact_email, stall_info, event_date, source_url, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT (vendor_id, source_url) DO NOTHING
        "#,
        )
        .bind(vendor_id)
        .bind(&event.event_name)
        .bind(&event.description)
        .bind(&event.location)
        .bind(event.contact_phone.as_deref())
        .bind(event.contact_email.as_deref())
        .bind(&event.stall_info)
        .bind(&event.event_date)
        .bind(&event.source_url)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        info!(
            vendor_id = %vendor_id,
            source_url = %event.source_url,
            rows = res.rows_affected(),
            "store.insert_event"
        );
        Ok(res.rows_affected() > 0)
    }

    async fn events_for_vendor(&self, vendor_id: &str) -> Result<Vec<StoredEvent>> {
        let rows = sqlx::query(
            r#"
            SELECT id, vendor_id, event_name, description, location, contact_phone,
                   contact_email, stall_info, event_date, source_url, created_at
            FROM vendor_event
            WHERE vendor_id = ?1
            ORDER BY id ASC
            "#,
        )
        .bind(vendor_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;
        debug!(vendor_id = %vendor_id, rows = rows.len(), "store.events_for_vendor");

        rows.iter().map(stored_event).collect()
    }

    async fn events_matching_location(
        &self,
        vendor_id: &str,
        needle: &str,
    ) -> Result<Vec<StoredEvent>> {
        let rows = sqlx::query(
            r#"
            SELECT id, vendor_id, event_name, description, location, contact_phone,
                   contact_email, stall_info, event_date, source_url, created_at
            FROM vendor_event
            WHERE vendor_id = ?1
              AND instr(lower(location), lower(?2)) > 0
            ORDER BY id ASC
            "#,
        )
        .bind(vendor_id) // ?1
        .bind(needle) // ?2
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;
        info!(
            vendor_id = %vendor_id,
            location = %needle,
            rows = rows.len(),
            "store.events_matching_location"
        );

        rows.iter().map(stored_event).collect()
    }
}

fn stored_event(r: &SqliteRow) -> Result<StoredEvent> {
    let event = CandidateEvent {
        event_name: r.try_get("event_name").map_err(store_err)?,
        description: r.try_get("description").map_err(store_err)?,
        location: r.try_get("location").map_err(store_err)?,
        contact_phone: r.try_get("contact_phone").map_err(store_err)?,
        contact_email: r.try_get("contact_email").map_err(store_err)?,
        stall_info: r.try_get("stall_info").map_err(store_err)?,
        event_date: r.try_get("event_date").map_err(store_err)?,
        source_url: r.try_get("source_url").map_err(store_err)?,
        relevance_score: 0,
    };
    Ok(StoredEvent {
        id: r.try_get("id").map_err(store_err)?,
        vendor_id: r.try_get("vendor_id").map_err(store_err)?,
        event,
        created_at: r
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(store_err)?,
    })
}

fn store_err(err: sqlx::Error) -> ScoutError {
    ScoutError::Store(err.to_string())
}
