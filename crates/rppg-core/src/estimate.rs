//! Externally visible estimation state
//!
//! [`BpmEstimate`] is the public output of the pipeline: the smoothed BPM, a
//! confidence score, and the lock state. The previous estimate persists
//! between passes so readers never see a flicker to zero.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Readiness state of the estimation pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LockState {
    /// No samples recorded yet
    Empty,
    /// Collecting samples, no reliable estimate so far
    Acquiring,
    /// Buffer full and the latest passes are reliable
    Locked,
    /// Tracking lost after consecutive unreliable passes
    Lost,
}

impl LockState {
    pub fn is_locked(&self) -> bool {
        matches!(self, LockState::Locked)
    }
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockState::Empty => write!(f, "empty"),
            LockState::Acquiring => write!(f, "acquiring"),
            LockState::Locked => write!(f, "locked"),
            LockState::Lost => write!(f, "lost"),
        }
    }
}

/// Dominant in-band frequency selected by one estimation pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectralPeak {
    /// Peak frequency in Hz
    pub frequency_hz: f32,
    /// Spectrum magnitude at the peak bin
    pub magnitude: f32,
}

impl SpectralPeak {
    pub fn new(frequency_hz: f32, magnitude: f32) -> Self {
        Self { frequency_hz, magnitude }
    }

    /// Heart rate implied by this peak
    pub fn bpm(&self) -> f32 {
        self.frequency_hz * 60.0
    }
}

/// Current best heart-rate estimate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BpmEstimate {
    /// Smoothed beats per minute; meaningful only when locked
    pub bpm: f32,
    /// Estimate confidence, 0.0 to 1.0
    pub confidence: f32,
    /// Pipeline readiness state
    pub state: LockState,
}

impl BpmEstimate {
    /// The state before any sample has been recorded
    pub fn empty() -> Self {
        Self {
            bpm: 0.0,
            confidence: 0.0,
            state: LockState::Empty,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.state.is_locked()
    }
}

impl Default for BpmEstimate {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for BpmEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} BPM (confidence {:.2}, {})",
               self.bpm, self.confidence, self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peak_to_bpm() {
        let peak = SpectralPeak::new(1.2, 10.0);
        assert!((peak.bpm() - 72.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_estimate() {
        let estimate = BpmEstimate::empty();
        assert_eq!(estimate.bpm, 0.0);
        assert_eq!(estimate.confidence, 0.0);
        assert_eq!(estimate.state, LockState::Empty);
        assert!(!estimate.is_locked());
    }

    #[test]
    fn test_lock_state_display() {
        assert_eq!(format!("{}", LockState::Acquiring), "acquiring");
        assert_eq!(format!("{}", LockState::Locked), "locked");
    }

    #[test]
    fn test_estimate_display() {
        let estimate = BpmEstimate {
            bpm: 71.96,
            confidence: 0.87,
            state: LockState::Locked,
        };
        let text = format!("{}", estimate);
        assert!(text.contains("72.0 BPM"));
        assert!(text.contains("locked"));
    }
}
