use serde::{Deserialize, Serialize};

use crate::error::TrimValidationError;

/// Shortest clip a trim may produce, in seconds
pub const MIN_TRIM_SECONDS: f64 = 0.1;

/// Requested time range against a source of known duration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrimRequest {
    pub start_seconds: f64,
    pub end_seconds: f64,
    pub known_duration: f64,
}

/// Validated `[start, end)` range in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimRange {
    start: f64,
    end: f64,
}

impl TrimRange {
    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

impl TrimRequest {
    pub fn new(start_seconds: f64, end_seconds: f64, known_duration: f64) -> Self {
        Self {
            start_seconds,
            end_seconds,
            known_duration,
        }
    }

    /// Check the request; the first failing rule wins.
    pub fn validate(&self) -> Result<TrimRange, TrimValidationError> {
        let (start, end) = (self.start_seconds, self.end_seconds);

        if !start.is_finite() || !end.is_finite() {
            return Err(TrimValidationError::NonFiniteTime);
        }
        if start < 0.0 {
            return Err(TrimValidationError::NegativeStart);
        }
        if self.known_duration.is_nan() || end > self.known_duration {
            return Err(TrimValidationError::EndBeyondDuration {
                end,
                duration: self.known_duration,
            });
        }
        if start >= end {
            return Err(TrimValidationError::StartNotBeforeEnd);
        }
        if end - start < MIN_TRIM_SECONDS {
            return Err(TrimValidationError::RangeTooShort {
                min: MIN_TRIM_SECONDS,
            });
        }

        Ok(TrimRange { start, end })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_range() {
        let range = TrimRequest::new(2.0, 7.0, 10.0).validate().unwrap();
        assert_eq!(range.start(), 2.0);
        assert_eq!(range.end(), 7.0);
        assert_eq!(range.duration(), 5.0);
    }

    #[test]
    fn test_full_length_range_is_valid() {
        assert!(TrimRequest::new(0.0, 10.0, 10.0).validate().is_ok());
    }

    #[test]
    fn test_non_finite_times_rejected_first() {
        // Also negative, but the finiteness rule wins
        let err = TrimRequest::new(-1.0, f64::NAN, 10.0).validate().unwrap_err();
        assert_eq!(err, TrimValidationError::NonFiniteTime);

        let err = TrimRequest::new(f64::INFINITY, 5.0, 10.0).validate().unwrap_err();
        assert_eq!(err, TrimValidationError::NonFiniteTime);
    }

    #[test]
    fn test_negative_start_before_duration_check() {
        let err = TrimRequest::new(-0.5, 12.0, 10.0).validate().unwrap_err();
        assert_eq!(err, TrimValidationError::NegativeStart);
    }

    #[test]
    fn test_end_beyond_duration_before_ordering_check() {
        let err = TrimRequest::new(11.0, 10.5, 10.0).validate().unwrap_err();
        assert_eq!(
            err,
            TrimValidationError::EndBeyondDuration {
                end: 10.5,
                duration: 10.0
            }
        );
    }

    #[test]
    fn test_start_after_end() {
        let err = TrimRequest::new(5.0, 4.0, 10.0).validate().unwrap_err();
        assert_eq!(err, TrimValidationError::StartNotBeforeEnd);
        assert_eq!(err.to_string(), "Start time must be less than end time");
    }

    #[test]
    fn test_equal_start_and_end() {
        let err = TrimRequest::new(3.0, 3.0, 10.0).validate().unwrap_err();
        assert_eq!(err, TrimValidationError::StartNotBeforeEnd);
    }

    #[test]
    fn test_too_short_range() {
        let err = TrimRequest::new(3.0, 3.05, 10.0).validate().unwrap_err();
        assert_eq!(err, TrimValidationError::RangeTooShort { min: 0.1 });
    }
}
