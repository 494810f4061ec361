use super::ClimateProvider;
use crate::db::Database;
use crate::error::Result;
use crate::models::ClimateSeries;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Arc;

/// Read-through SQLite cache in front of another climate provider.
///
/// Entries are keyed by location (4 decimals) and year and expire after the
/// TTL. Cache read or write failures are logged and the inner provider is
/// used directly.
pub struct CachedClimateProvider {
    inner: Arc<dyn ClimateProvider>,
    db: Database,
    ttl: Duration,
}

impl CachedClimateProvider {
    pub fn new(inner: Arc<dyn ClimateProvider>, db: Database, ttl_hours: i64) -> Self {
        Self {
            inner,
            db,
            ttl: Duration::hours(ttl_hours),
        }
    }

    fn lookup(&self, latitude: f64, longitude: f64, year: i32) -> Option<ClimateSeries> {
        match self.db.get_cached_climate(latitude, longitude, year) {
            Ok(Some(entry)) if Utc::now() - entry.fetched_at < self.ttl => {
                tracing::debug!(year, source = %entry.source, "Climate cache hit");
                Some(entry.series)
            }
            Ok(Some(_)) => {
                tracing::debug!(year, "Climate cache entry expired");
                None
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Climate cache read failed: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl ClimateProvider for CachedClimateProvider {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn fetch_climate_series(
        &self,
        latitude: f64,
        longitude: f64,
        year: i32,
    ) -> Result<ClimateSeries> {
        if let Some(series) = self.lookup(latitude, longitude, year) {
            return Ok(series);
        }

        let series = self
            .inner
            .fetch_climate_series(latitude, longitude, year)
            .await?;

        if series.is_empty() {
            return Ok(series);
        }

        if let Err(e) = self
            .db
            .put_cached_climate(&series, self.inner.name(), Utc::now())
        {
            tracing::warn!("Climate cache write failed: {}", e);
        }

        Ok(series)
    }
}
