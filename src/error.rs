use thiserror::Error;

#[derive(Error, Debug)]
pub enum HomeGrownError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid polygon: {0}")]
    InvalidPolygon(String),

    #[error("Polygon area {actual_m2:.1} m² exceeds the maximum of {max_m2:.1} m²")]
    AreaTooLarge { actual_m2: f64, max_m2: f64 },

    #[error("{source_name} returned {status}: {message}")]
    Upstream {
        source_name: String,
        status: u16,
        message: String,
    },

    #[error("{0} is rate-limiting requests, try again later")]
    RateLimited(String),

    #[error("Data source unavailable: {0}")]
    DataSourceUnavailable(String),

    #[error("Invalid crop '{crop_id}': {reason}")]
    InvalidCrop { crop_id: String, reason: String },

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl HomeGrownError {
    /// Input errors are raised before any upstream call is made.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            HomeGrownError::InvalidPolygon(_) | HomeGrownError::AreaTooLarge { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, HomeGrownError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn area_error_reports_both_bounds() {
        let err = HomeGrownError::AreaTooLarge {
            actual_m2: 1_500_000.0,
            max_m2: 1_000_000.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("1500000.0"));
        assert!(msg.contains("1000000.0"));
        assert!(err.is_input_error());
    }

    #[test]
    fn upstream_error_carries_status() {
        let err = HomeGrownError::Upstream {
            source_name: "NASA POWER".into(),
            status: 503,
            message: "Service Unavailable".into(),
        };
        assert_eq!(err.to_string(), "NASA POWER returned 503: Service Unavailable");
        assert!(!err.is_input_error());
    }
}
