//! Error taxonomy for the analytics engine.
//!
//! Only data-integrity problems are errors. Layout infeasibility and empty
//! input are resolved locally with documented fallbacks and never surface here.

/// Convenience result type used across the engine.
pub type ReportResult<T> = Result<T, ReportError>;

/// Typed failures returned by aggregation and apportionment.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ReportError {
    /// An event carries an intensity level outside `1..=LEVEL_COUNT`.
    #[error(
        "event '{event_id}' has intensity level {level}, expected 1..={max}",
        max = crate::model::LEVEL_COUNT
    )]
    IntensityOutOfRange { event_id: String, level: i32 },

    /// An event timestamp cannot be represented as a calendar date.
    #[error("event '{event_id}' has an unrepresentable timestamp {timestamp}")]
    TimestampOutOfRange { event_id: String, timestamp: i64 },

    /// A seat-allocation weight is negative, NaN or infinite.
    #[error("weight for '{key}' must be a finite non-negative number, got {weight}")]
    InvalidWeight { key: String, weight: f64 },

    /// A rolling window was requested with zero days.
    #[error("a rolling window must cover at least one day")]
    EmptyWindow,

    /// A rolling window is too long or starts before the earliest calendar date.
    #[error("a rolling window of {days} days is out of range")]
    WindowOutOfRange { days: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intensity_error_names_event() {
        let err = ReportError::IntensityOutOfRange {
            event_id: "evt-7".to_string(),
            level: 7,
        };
        let message = err.to_string();
        assert!(message.contains("evt-7"));
        assert!(message.contains("1..=6"));
    }

    #[test]
    fn test_weight_error_names_key() {
        let err = ReportError::InvalidWeight {
            key: "work".to_string(),
            weight: -1.0,
        };
        assert!(err.to_string().contains("'work'"));
    }
}
