use crate::db::Database;
use crate::error::Result;
use crate::models::ClimateSeries;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Row};
use tracing::warn;

/// A cached series and when it was fetched upstream
#[derive(Debug, Clone)]
pub struct CachedClimate {
    pub series: ClimateSeries,
    pub source: String,
    pub fetched_at: DateTime<Utc>,
}

/// Cache key for a location. Four decimals is roughly 11 m, far finer than
/// any gridded climate product.
pub fn location_key(latitude: f64, longitude: f64) -> (String, String) {
    (format!("{:.4}", latitude), format!("{:.4}", longitude))
}

fn timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

// Climate Cache Queries

impl Database {
    pub fn get_cached_climate(
        &self,
        latitude: f64,
        longitude: f64,
        year: i32,
    ) -> Result<Option<CachedClimate>> {
        let (lat_key, lon_key) = location_key(latitude, longitude);
        self.with_conn(|conn| {
            conn.query_row(
                r#"
                SELECT source, payload, fetched_at FROM climate_cache
                WHERE latitude_key = ?1 AND longitude_key = ?2 AND year = ?3
                "#,
                params![lat_key, lon_key, year],
                row_to_cached_climate,
            )
            .optional()
            .map(Option::flatten)
            .map_err(Into::into)
        })
    }

    pub fn put_cached_climate(
        &self,
        series: &ClimateSeries,
        source: &str,
        fetched_at: DateTime<Utc>,
    ) -> Result<()> {
        let (lat_key, lon_key) = location_key(series.latitude, series.longitude);
        let payload = serde_json::to_string(series)?;
        self.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT OR REPLACE INTO climate_cache
                    (latitude_key, longitude_key, year, source, payload, fetched_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    lat_key,
                    lon_key,
                    series.year,
                    source,
                    payload,
                    timestamp(fetched_at),
                ],
            )?;
            Ok(())
        })
    }

    /// Remove entries fetched before `cutoff`; returns how many were removed
    pub fn purge_climate_cache(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM climate_cache WHERE fetched_at < ?1",
                params![timestamp(cutoff)],
            )?;
            Ok(removed)
        })
    }

    pub fn count_cached_climate(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM climate_cache", [], |row| row.get(0))?;
            Ok(count as usize)
        })
    }
}

/// Rows with an unreadable payload or timestamp are treated as misses
fn row_to_cached_climate(row: &Row) -> rusqlite::Result<Option<CachedClimate>> {
    let source: String = row.get("source")?;
    let payload: String = row.get("payload")?;
    let fetched_at_str: String = row.get("fetched_at")?;

    let fetched_at = match DateTime::parse_from_rfc3339(&fetched_at_str) {
        Ok(dt) => dt.with_timezone(&Utc),
        Err(e) => {
            warn!("Invalid fetched_at '{}' in climate cache: {}", fetched_at_str, e);
            return Ok(None);
        }
    };

    match serde_json::from_str::<ClimateSeries>(&payload) {
        Ok(series) => Ok(Some(CachedClimate {
            series,
            source,
            fetched_at,
        })),
        Err(e) => {
            warn!("Corrupt climate cache payload: {}", e);
            Ok(None)
        }
    }
}

trait OptionalExt<T> {
    fn optional(self) -> rusqlite::Result<Option<T>>;
}

impl<T> OptionalExt<T> for rusqlite::Result<T> {
    fn optional(self) -> rusqlite::Result<Option<T>> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
