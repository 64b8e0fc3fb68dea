//! Error handling for the rPPG framework
//!
//! One error type covers every framework operation. Only `ConfigurationError`
//! is ever surfaced through the public pipeline API; the per-pass variants are
//! absorbed internally and show up as lock-state / confidence changes instead.

use std::fmt;

/// Result type alias for rPPG framework operations
pub type RppgResult<T> = Result<T, RppgError>;

/// Error type for all rPPG framework operations
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum RppgError {
    /// Invalid configuration, rejected at construction time
    ConfigurationError {
        /// Description of the configuration problem
        message: String,
    },

    /// Window variance too low to normalize (flat signal, no subject)
    InsufficientSignal {
        /// Description of why the window is unusable
        reason: String,
    },

    /// No spectrum bin fell inside the configured frequency band
    NoValidPeak {
        /// Lower band edge in Hz
        band_low_hz: f32,
        /// Upper band edge in Hz
        band_high_hz: f32,
    },

    /// Estimated BPM outside the plausible physiological range
    OutOfRangeBpm {
        /// The rejected value
        bpm: f32,
        /// Lower plausibility bound
        min_bpm: f32,
        /// Upper plausibility bound
        max_bpm: f32,
    },

    /// Internal processing invariant failure
    ProcessingError {
        /// Description of the failure
        message: String,
    },

    /// Sample stream channel fault
    StreamError {
        /// Description of the stream problem
        message: String,
    },
}

impl fmt::Display for RppgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RppgError::ConfigurationError { message } => {
                write!(f, "Invalid configuration: {}", message)
            }
            RppgError::InsufficientSignal { reason } => {
                write!(f, "Insufficient signal: {}", reason)
            }
            RppgError::NoValidPeak { band_low_hz, band_high_hz } => {
                write!(f, "No spectral peak found in band {:.2}-{:.2} Hz",
                       band_low_hz, band_high_hz)
            }
            RppgError::OutOfRangeBpm { bpm, min_bpm, max_bpm } => {
                write!(f, "BPM {:.1} outside plausible range {:.0}-{:.0}",
                       bpm, min_bpm, max_bpm)
            }
            RppgError::ProcessingError { message } => {
                write!(f, "Processing error: {}", message)
            }
            RppgError::StreamError { message } => {
                write!(f, "Stream error: {}", message)
            }
        }
    }
}

impl std::error::Error for RppgError {}

impl RppgError {
    /// True for the per-pass conditions the pipeline absorbs internally
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, RppgError::ConfigurationError { .. })
    }
}

/// Convenience macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::error::RppgError::ConfigurationError {
            message: format!($($arg)*),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = RppgError::OutOfRangeBpm {
            bpm: 250.0,
            min_bpm: 40.0,
            max_bpm: 200.0,
        };
        let display = format!("{}", error);
        assert!(display.contains("250"));
        assert!(display.contains("40"));
        assert!(display.contains("200"));
    }

    #[test]
    fn test_error_equality() {
        let error1 = RppgError::InsufficientSignal {
            reason: "flat window".to_string(),
        };
        let error2 = RppgError::InsufficientSignal {
            reason: "flat window".to_string(),
        };
        assert_eq!(error1, error2);
    }

    #[test]
    fn test_recoverable_split() {
        let fatal = RppgError::ConfigurationError {
            message: "bad band".to_string(),
        };
        assert!(!fatal.is_recoverable());

        let per_pass = RppgError::NoValidPeak {
            band_low_hz: 0.7,
            band_high_hz: 4.0,
        };
        assert!(per_pass.is_recoverable());
    }

    #[test]
    fn test_config_error_macro() {
        let error = config_error!("cutoff {} above Nyquist {}", 20.0, 15.0);
        let display = format!("{}", error);
        assert!(display.contains("cutoff 20 above Nyquist 15"));
    }
}
