//! Synchronous estimation pipeline
//!
//! [`PulsePipeline`] owns every processing stage and the sample buffer. One
//! ROI intensity goes in per camera frame; once the buffer is full, each new
//! sample triggers a complete estimation pass over the current window and the
//! public estimate is refreshed.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, trace};

use rppg_core::{BpmEstimate, LockState, RoiSample, RppgResult, Sample, SampleBuffer};

use crate::config::PulseConfig;
use crate::detrend::Detrender;
use crate::filter::BandpassFilter;
use crate::normalize::Normalizer;
use crate::spectral::SpectralEstimator;
use crate::tracker::BpmTracker;

/// Cumulative pass accounting
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PassStats {
    pub passes: u64,
    pub unreliable_passes: u64,
    pub last_pass_us: u64,
    pub total_pass_us: u64,
}

impl PassStats {
    pub fn average_pass_us(&self) -> u64 {
        if self.passes == 0 {
            0
        } else {
            self.total_pass_us / self.passes
        }
    }
}

/// Heart-rate estimation pipeline for one monitoring session
///
/// Construction is the only fallible step. After that, [`PulsePipeline::ingest`]
/// absorbs every per-frame condition internally and always returns the current
/// estimate; bad input degrades the lock state instead of surfacing errors.
pub struct PulsePipeline {
    config: PulseConfig,
    buffer: SampleBuffer,
    detrender: Detrender,
    normalizer: Normalizer,
    filter: BandpassFilter,
    estimator: SpectralEstimator,
    tracker: BpmTracker,
    filtered_waveform: Vec<f32>,
    stats: PassStats,
    frame_counter: u64,
}

impl PulsePipeline {
    /// Validate the configuration, design the filter, and plan the FFT.
    pub fn new(config: PulseConfig) -> RppgResult<Self> {
        config.validate()?;

        let filter = BandpassFilter::new(&config)?;
        let estimator = SpectralEstimator::new(&config);
        let tracker = BpmTracker::new(&config);
        let buffer = SampleBuffer::new(config.buffer_capacity);
        let detrender = Detrender::new(config.detrend_degree);

        info!(
            sample_rate_hz = config.sample_rate_hz,
            buffer_capacity = config.buffer_capacity,
            band_low_hz = config.band_low_hz,
            band_high_hz = config.band_high_hz,
            "pulse pipeline ready"
        );

        Ok(Self {
            filtered_waveform: vec![0.0; config.buffer_capacity],
            buffer,
            detrender,
            normalizer: Normalizer::new(),
            filter,
            estimator,
            tracker,
            stats: PassStats::default(),
            frame_counter: 0,
            config,
        })
    }

    /// Push one per-frame ROI sample and return the refreshed estimate.
    ///
    /// Missing or non-finite frames leave the buffer untouched. A pass runs
    /// only against a full buffer; until then the persisted estimate comes
    /// back unchanged while the fill ratio reports progress.
    pub fn ingest(&mut self, sample: RoiSample) -> BpmEstimate {
        let frame_index = self.frame_counter;
        self.frame_counter += 1;

        let value = match sample.usable_intensity() {
            Some(value) => value,
            None => return self.tracker.estimate(),
        };

        self.buffer.push(Sample::new(value, frame_index));
        self.tracker.note_sample_pushed();

        if !self.buffer.is_full() {
            return self.tracker.estimate();
        }
        self.run_pass()
    }

    /// One full estimation pass over the current window.
    fn run_pass(&mut self) -> BpmEstimate {
        let started = Instant::now();
        self.stats.passes += 1;

        let window = self.buffer.values();
        let detrended = self.detrender.detrend(&window);

        let estimate = match self.normalizer.normalize(&detrended) {
            Ok(normalized) => {
                self.filtered_waveform = self.filter.apply(&normalized);
                match self.estimator.analyze(&self.filtered_waveform) {
                    Ok(spectrum) => {
                        let fill_ratio = self.buffer.fill_ratio();
                        self.tracker.record_spectrum(&spectrum, fill_ratio)
                    }
                    Err(err) => self.tracker.record_unreliable(&err),
                }
            }
            Err(err) => {
                // Flat window: publish zeros, score the pass unreliable
                self.filtered_waveform = vec![0.0; window.len()];
                self.tracker.record_unreliable(&err)
            }
        };

        if self.tracker.unreliable_streak() > 0 {
            self.stats.unreliable_passes += 1;
        }

        let elapsed_us = started.elapsed().as_micros() as u64;
        self.stats.last_pass_us = elapsed_us;
        self.stats.total_pass_us += elapsed_us;

        trace!(
            pass = self.stats.passes,
            elapsed_us,
            state = %estimate.state,
            "estimation pass complete"
        );
        estimate
    }

    pub fn estimate(&self) -> BpmEstimate {
        self.tracker.estimate()
    }

    pub fn lock_state(&self) -> LockState {
        self.tracker.state()
    }

    pub fn fill_ratio(&self) -> f32 {
        self.buffer.fill_ratio()
    }

    /// Latest zero-phase filtered window; all zeros until the first pass.
    pub fn filtered_waveform(&self) -> &[f32] {
        &self.filtered_waveform
    }

    pub fn buffer_ready(&self) -> bool {
        self.buffer.is_full()
    }

    pub fn stats(&self) -> PassStats {
        self.stats
    }

    pub fn config(&self) -> &PulseConfig {
        &self.config
    }

    /// Clear the buffer, waveform, tracker history, filter memory, and pass
    /// statistics. The estimate reverts to EMPTY with zero confidence. Only
    /// the frame counter survives; the camera keeps running across resets.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.filter.reset();
        self.tracker.reset();
        self.filtered_waveform = vec![0.0; self.config.buffer_capacity];
        self.stats = PassStats::default();
        info!("pipeline reset");
    }
}
