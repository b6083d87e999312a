use floors_core::FloorError;

use crate::metrics::FetchFailure;

/// Why a single fetch of a floor endpoint failed.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Network, DNS, timeout or body read failure.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Floor endpoint returned HTTP {0}")]
    HttpStatus(u16),

    #[error("Response size exceeds max file size of {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("Malformed floor data: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("{0}")]
    Invalid(#[from] FloorError),
}

impl FetchError {
    /// Metric classification of this failure.
    pub fn failure(&self) -> FetchFailure {
        match self {
            Self::Request(_) | Self::HttpStatus(_) => FetchFailure::Request,
            Self::TooLarge { .. } => FetchFailure::TooLarge,
            Self::Malformed(_) => FetchFailure::Malformed,
            Self::Invalid(_) => FetchFailure::Invalid,
        }
    }
}

/// Why the worker pool refused a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("Worker pool is at capacity")]
    Full,

    #[error("Worker pool has been stopped")]
    Stopped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_map_to_metric_codes() {
        assert_eq!(FetchError::HttpStatus(404).failure().code(), 1);
        assert_eq!(FetchError::TooLarge { limit: 1024 }.failure().code(), 2);
        let malformed = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(FetchError::from(malformed).failure().code(), 3);
        let invalid = FloorError::InvalidFetchedRules("empty".into());
        assert_eq!(FetchError::from(invalid).failure().code(), 4);
    }

    #[test]
    fn display_messages() {
        assert_eq!(
            FetchError::HttpStatus(503).to_string(),
            "Floor endpoint returned HTTP 503"
        );
        assert_eq!(
            FetchError::TooLarge { limit: 2048 }.to_string(),
            "Response size exceeds max file size of 2048 bytes"
        );
    }
}
