//! BPM tracking and lock-state management
//!
//! The tracker turns per-pass spectral peaks into the public heart-rate
//! estimate: range check, rolling average over recent reliable passes,
//! confidence scoring, and the EMPTY/ACQUIRING/LOCKED/LOST lifecycle.

use std::collections::VecDeque;

use rppg_core::{BpmEstimate, LockState, RppgError};
use tracing::{debug, info};

use crate::config::PulseConfig;
use crate::spectral::BandSpectrum;

/// Confidence multiplier applied on every unreliable pass
const UNRELIABLE_CONFIDENCE_DECAY: f32 = 0.5;

/// Heart-rate estimate tracker
///
/// Owns the published [`BpmEstimate`], which persists between passes; an
/// unreliable pass decays confidence but never blanks the BPM value.
#[derive(Debug, Clone)]
pub struct BpmTracker {
    min_bpm: f32,
    max_bpm: f32,
    smoothing_window: usize,
    lost_after_unreliable: u32,
    /// Recent reliable BPM readings, newest last
    history: VecDeque<f32>,
    unreliable_streak: u32,
    estimate: BpmEstimate,
}

impl BpmTracker {
    pub fn new(config: &PulseConfig) -> Self {
        Self {
            min_bpm: config.min_bpm,
            max_bpm: config.max_bpm,
            smoothing_window: config.smoothing_window.max(1),
            lost_after_unreliable: config.lost_after_unreliable.max(1),
            history: VecDeque::with_capacity(config.smoothing_window.max(1)),
            unreliable_streak: 0,
            estimate: BpmEstimate::empty(),
        }
    }

    /// Record that a sample entered the buffer. The first one moves the
    /// tracker out of EMPTY.
    pub fn note_sample_pushed(&mut self) {
        if self.estimate.state == LockState::Empty {
            self.set_state(LockState::Acquiring);
        }
    }

    /// Score a completed spectral pass. A reliable peak updates the published
    /// estimate, but the tracker locks only once `fill_ratio` reports a full
    /// window; a partial window stays in its current state.
    ///
    /// A peak whose BPM falls outside the configured range is routed through
    /// the unreliable path, exactly like a pass with no peak at all.
    pub fn record_spectrum(&mut self, spectrum: &BandSpectrum, fill_ratio: f32) -> BpmEstimate {
        let bpm_raw = spectrum.peak.bpm();
        if bpm_raw < self.min_bpm || bpm_raw > self.max_bpm {
            let err = RppgError::OutOfRangeBpm {
                bpm: bpm_raw,
                min_bpm: self.min_bpm,
                max_bpm: self.max_bpm,
            };
            return self.record_unreliable(&err);
        }

        self.history.push_back(bpm_raw);
        while self.history.len() > self.smoothing_window {
            self.history.pop_front();
        }
        let smoothed = self.history.iter().sum::<f32>() / self.history.len() as f32;

        let peak_share = if spectrum.in_band_magnitude_sum > f32::EPSILON {
            spectrum.peak.magnitude / spectrum.in_band_magnitude_sum
        } else {
            0.0
        };
        let confidence = (peak_share * fill_ratio).clamp(0.0, 1.0);

        self.unreliable_streak = 0;
        self.estimate.bpm = smoothed;
        self.estimate.confidence = confidence;
        if fill_ratio >= 1.0 {
            self.set_state(LockState::Locked);
        }

        debug!(
            bpm_raw,
            bpm = smoothed,
            confidence,
            "reliable pass recorded"
        );
        self.estimate
    }

    /// Score a pass that produced no usable peak.
    ///
    /// Confidence decays by half; after `lost_after_unreliable` consecutive
    /// failures a LOCKED tracker drops to LOST. The BPM value is untouched.
    pub fn record_unreliable(&mut self, reason: &RppgError) -> BpmEstimate {
        self.unreliable_streak = self.unreliable_streak.saturating_add(1);
        self.estimate.confidence *= UNRELIABLE_CONFIDENCE_DECAY;

        if self.estimate.state == LockState::Locked
            && self.unreliable_streak >= self.lost_after_unreliable
        {
            self.set_state(LockState::Lost);
        }

        debug!(
            streak = self.unreliable_streak,
            error = %reason,
            "unreliable pass recorded"
        );
        self.estimate
    }

    pub fn estimate(&self) -> BpmEstimate {
        self.estimate
    }

    pub fn state(&self) -> LockState {
        self.estimate.state
    }

    /// Consecutive unreliable passes since the last reliable one
    pub fn unreliable_streak(&self) -> u32 {
        self.unreliable_streak
    }

    /// Drop all history and return to EMPTY.
    pub fn reset(&mut self) {
        self.history.clear();
        self.unreliable_streak = 0;
        self.estimate = BpmEstimate::empty();
    }

    fn set_state(&mut self, next: LockState) {
        let prior = self.estimate.state;
        if prior != next {
            info!(from = %prior, to = %next, bpm = self.estimate.bpm, "lock state changed");
            self.estimate.state = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rppg_core::SpectralPeak;

    fn spectrum(freq_hz: f32, magnitude: f32, sum: f32) -> BandSpectrum {
        BandSpectrum {
            peak: SpectralPeak::new(freq_hz, magnitude),
            in_band_magnitude_sum: sum,
            freq_resolution_hz: 30.0 / 256.0,
        }
    }

    fn no_peak() -> RppgError {
        RppgError::NoValidPeak {
            band_low_hz: 0.7,
            band_high_hz: 4.0,
        }
    }

    #[test]
    fn test_first_sample_leaves_empty() {
        let mut tracker = BpmTracker::new(&PulseConfig::default());
        assert_eq!(tracker.state(), LockState::Empty);

        tracker.note_sample_pushed();

        assert_eq!(tracker.state(), LockState::Acquiring);
    }

    #[test]
    fn test_reliable_pass_locks() {
        let mut tracker = BpmTracker::new(&PulseConfig::default());
        tracker.note_sample_pushed();

        let estimate = tracker.record_spectrum(&spectrum(1.2, 10.0, 20.0), 1.0);

        assert_eq!(estimate.state, LockState::Locked);
        assert!((estimate.bpm - 72.0).abs() < 1e-3);
        assert!((estimate.confidence - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_rolling_average_uses_last_window() {
        let mut tracker = BpmTracker::new(&PulseConfig::default());
        for bpm in [60.0f32, 62.0, 64.0, 66.0, 68.0] {
            tracker.record_spectrum(&spectrum(bpm / 60.0, 10.0, 20.0), 1.0);
        }
        assert!((tracker.estimate().bpm - 64.0).abs() < 1e-3);

        // A sixth pass pushes the oldest reading out of the average
        tracker.record_spectrum(&spectrum(70.0 / 60.0, 10.0, 20.0), 1.0);

        assert!((tracker.estimate().bpm - 66.0).abs() < 1e-3);
    }

    #[test]
    fn test_partial_window_pass_does_not_lock() {
        let mut tracker = BpmTracker::new(&PulseConfig::default());
        tracker.note_sample_pushed();

        let estimate = tracker.record_spectrum(&spectrum(1.2, 10.0, 20.0), 0.6);

        assert_eq!(estimate.state, LockState::Acquiring);
        assert!((estimate.bpm - 72.0).abs() < 1e-3, "estimate still updates");

        let estimate = tracker.record_spectrum(&spectrum(1.2, 10.0, 20.0), 1.0);

        assert_eq!(estimate.state, LockState::Locked);
    }

    #[test]
    fn test_out_of_range_bpm_scored_unreliable() {
        let mut tracker = BpmTracker::new(&PulseConfig::default());
        tracker.record_spectrum(&spectrum(1.2, 10.0, 20.0), 1.0);
        let before = tracker.estimate();

        // 5 Hz is 300 BPM, far above max_bpm
        let estimate = tracker.record_spectrum(&spectrum(5.0, 10.0, 20.0), 1.0);

        assert_eq!(estimate.state, LockState::Locked);
        assert!((estimate.bpm - before.bpm).abs() < 1e-6, "bpm must persist");
        assert!((estimate.confidence - before.confidence * 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_locked_drops_to_lost_after_streak() {
        let config = PulseConfig::default();
        let mut tracker = BpmTracker::new(&config);
        tracker.record_spectrum(&spectrum(1.2, 10.0, 20.0), 1.0);

        for i in 0..config.lost_after_unreliable {
            let estimate = tracker.record_unreliable(&no_peak());
            if i + 1 < config.lost_after_unreliable {
                assert_eq!(estimate.state, LockState::Locked, "lost too early at {}", i);
            } else {
                assert_eq!(estimate.state, LockState::Lost);
            }
        }

        let decayed = 0.5f32 * 0.5f32.powi(config.lost_after_unreliable as i32);
        assert!((tracker.estimate().confidence - decayed).abs() < 1e-6);
    }

    #[test]
    fn test_lost_relocks_on_single_reliable_pass() {
        let config = PulseConfig::default();
        let mut tracker = BpmTracker::new(&config);
        tracker.record_spectrum(&spectrum(1.2, 10.0, 20.0), 1.0);
        for _ in 0..config.lost_after_unreliable {
            tracker.record_unreliable(&no_peak());
        }
        assert_eq!(tracker.state(), LockState::Lost);

        let estimate = tracker.record_spectrum(&spectrum(1.3, 10.0, 20.0), 1.0);

        assert_eq!(estimate.state, LockState::Locked);
    }

    #[test]
    fn test_acquiring_never_drops_to_lost() {
        let mut tracker = BpmTracker::new(&PulseConfig::default());
        tracker.note_sample_pushed();

        for _ in 0..20 {
            tracker.record_unreliable(&no_peak());
        }

        assert_eq!(tracker.state(), LockState::Acquiring);
    }

    #[test]
    fn test_reset_returns_to_empty() {
        let mut tracker = BpmTracker::new(&PulseConfig::default());
        tracker.record_spectrum(&spectrum(1.2, 10.0, 20.0), 1.0);
        assert_eq!(tracker.state(), LockState::Locked);

        tracker.reset();

        let estimate = tracker.estimate();
        assert_eq!(estimate.state, LockState::Empty);
        assert_eq!(estimate.bpm, 0.0);
        assert_eq!(estimate.confidence, 0.0);
    }

    #[test]
    fn test_confidence_scales_with_fill_ratio() {
        let mut tracker = BpmTracker::new(&PulseConfig::default());

        let estimate = tracker.record_spectrum(&spectrum(1.2, 10.0, 20.0), 0.5);

        assert!((estimate.confidence - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_confidence_never_exceeds_one() {
        let mut tracker = BpmTracker::new(&PulseConfig::default());

        let estimate = tracker.record_spectrum(&spectrum(1.2, 30.0, 20.0), 1.0);

        assert!(estimate.confidence <= 1.0);
    }
}
