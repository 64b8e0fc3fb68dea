//! Configuration for the pulse estimation pipeline

use rppg_core::{config_error, RppgResult};
use serde::{Deserialize, Serialize};

/// Immutable pipeline configuration
///
/// Built once per monitoring session, validated at pipeline construction,
/// never mutated afterwards. Defaults describe a consumer webcam feed:
/// 30 frames per second, a five second window, and a 0.7-4.0 Hz pass band
/// (42-240 BPM).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PulseConfig {
    /// Nominal sample rate of the incoming frame stream (Hz)
    pub sample_rate_hz: f32,
    /// Sample window length; ~5 seconds of signal at the nominal rate
    pub buffer_capacity: usize,
    /// Lower pass-band edge (Hz)
    pub band_low_hz: f32,
    /// Upper pass-band edge (Hz)
    pub band_high_hz: f32,
    /// Butterworth order per band edge; even, 2 to 8
    pub filter_order: usize,
    /// Polynomial degree for baseline removal; 1 to 3
    pub detrend_degree: usize,
    /// Lowest plausible heart rate (BPM)
    pub min_bpm: f32,
    /// Highest plausible heart rate (BPM)
    pub max_bpm: f32,
    /// Number of reliable BPM values averaged into the published estimate
    pub smoothing_window: usize,
    /// Consecutive unreliable passes before a locked tracker reports lost
    pub lost_after_unreliable: u32,
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 30.0,
            buffer_capacity: 150,
            band_low_hz: 0.7,
            band_high_hz: 4.0,
            filter_order: 4,
            detrend_degree: 1,
            min_bpm: 40.0,
            max_bpm: 200.0,
            smoothing_window: 5,
            lost_after_unreliable: 5,
        }
    }
}

impl PulseConfig {
    /// Standard 30 fps webcam profile (the defaults)
    pub fn webcam() -> Self {
        Self::default()
    }

    /// Profile for a 60 fps capture source; same 5 second window
    pub fn high_frame_rate() -> Self {
        Self {
            sample_rate_hz: 60.0,
            buffer_capacity: 300,
            ..Self::default()
        }
    }

    /// Nyquist frequency of the configured sample rate
    pub fn nyquist_hz(&self) -> f32 {
        self.sample_rate_hz / 2.0
    }

    /// Smallest window that spans two full periods of the low band edge.
    ///
    /// Anything shorter cannot resolve the slowest heart rate the band
    /// admits, so configurations below this are rejected outright.
    pub fn min_viable_capacity(&self) -> usize {
        (2.0 * self.sample_rate_hz / self.band_low_hz).ceil() as usize
    }

    /// Frame interval implied by the sample rate, in milliseconds
    pub fn frame_interval_ms(&self) -> f32 {
        1000.0 / self.sample_rate_hz
    }

    /// Validate all fields; called once at pipeline construction
    pub fn validate(&self) -> RppgResult<()> {
        if !(self.sample_rate_hz > 0.0) || !self.sample_rate_hz.is_finite() {
            return Err(config_error!(
                "sample rate must be positive, got {} Hz",
                self.sample_rate_hz
            ));
        }

        if self.band_low_hz <= 0.0 || self.band_high_hz <= 0.0 {
            return Err(config_error!(
                "band edges must be positive, got {}-{} Hz",
                self.band_low_hz,
                self.band_high_hz
            ));
        }

        if self.band_low_hz >= self.band_high_hz {
            return Err(config_error!(
                "low band edge {} Hz must be below high edge {} Hz",
                self.band_low_hz,
                self.band_high_hz
            ));
        }

        if self.band_high_hz >= self.nyquist_hz() {
            return Err(config_error!(
                "high band edge {} Hz must stay below Nyquist {} Hz",
                self.band_high_hz,
                self.nyquist_hz()
            ));
        }

        if self.filter_order < 2 || self.filter_order > 8 || self.filter_order % 2 != 0 {
            return Err(config_error!(
                "filter order must be even and within 2-8, got {}",
                self.filter_order
            ));
        }

        if self.detrend_degree < 1 || self.detrend_degree > 3 {
            return Err(config_error!(
                "detrend degree must be within 1-3, got {}",
                self.detrend_degree
            ));
        }

        if self.min_bpm <= 0.0 || self.min_bpm >= self.max_bpm {
            return Err(config_error!(
                "BPM bounds must satisfy 0 < min < max, got {}-{}",
                self.min_bpm,
                self.max_bpm
            ));
        }

        if self.smoothing_window == 0 {
            return Err(config_error!("smoothing window must be at least 1"));
        }

        if self.lost_after_unreliable == 0 {
            return Err(config_error!(
                "lost-after-unreliable threshold must be at least 1"
            ));
        }

        let min_capacity = self.min_viable_capacity();
        if self.buffer_capacity < min_capacity {
            return Err(config_error!(
                "buffer capacity {} cannot resolve the {} Hz low edge; need at least {}",
                self.buffer_capacity,
                self.band_low_hz,
                min_capacity
            ));
        }

        Ok(())
    }

    /// Export configuration to JSON
    pub fn to_json(&self) -> RppgResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| config_error!(
            "failed to serialize configuration: {}", e
        ))
    }

    /// Import configuration from JSON
    pub fn from_json(json: &str) -> RppgResult<Self> {
        serde_json::from_str(json).map_err(|e| config_error!(
            "failed to deserialize configuration: {}", e
        ))
    }
}
