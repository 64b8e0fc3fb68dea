//! Frequency-domain peak estimation
//!
//! The dominant in-band frequency of the filtered window is the heart-rate
//! candidate. The window is zero-padded to a power of two, transformed with a
//! real-input FFT, and scanned over the pulse band for its largest magnitude
//! bin.

use num_complex::Complex;
use realfft::RealFftPlanner;
use rppg_core::{RppgError, RppgResult, SpectralPeak};

use crate::config::PulseConfig;

/// Two in-band bins closer than this in relative magnitude count as a tie,
/// and a tie resolves to the lower frequency.
const PEAK_TIE_REL_TOL: f32 = 1e-6;

/// Spectral content of one filtered window, restricted to the pulse band
#[derive(Debug, Clone)]
pub struct BandSpectrum {
    pub peak: SpectralPeak,
    /// Total magnitude across the band, denominator of the confidence ratio
    pub in_band_magnitude_sum: f32,
    pub freq_resolution_hz: f32,
}

/// Real-input FFT peak estimator
pub struct SpectralEstimator {
    planner: RealFftPlanner<f32>,
    sample_rate_hz: f32,
    band_low_hz: f32,
    band_high_hz: f32,
}

impl SpectralEstimator {
    pub fn new(config: &PulseConfig) -> Self {
        Self {
            planner: RealFftPlanner::new(),
            sample_rate_hz: config.sample_rate_hz,
            band_low_hz: config.band_low_hz,
            band_high_hz: config.band_high_hz,
        }
    }

    /// Locate the dominant pulse-band peak of `window`.
    ///
    /// Returns [`RppgError::NoValidPeak`] when the band contains no FFT bin
    /// and [`RppgError::InsufficientSignal`] when the window is too short or
    /// carries no in-band energy at all.
    pub fn analyze(&mut self, window: &[f32]) -> RppgResult<BandSpectrum> {
        if window.len() < 4 {
            return Err(RppgError::InsufficientSignal {
                reason: format!("window of {} samples is too short for spectral analysis", window.len()),
            });
        }

        let fft_size = window.len().next_power_of_two();
        let fft = self.planner.plan_fft_forward(fft_size);

        let mut fft_input = fft.make_input_vec();
        fft_input[..window.len()].copy_from_slice(window);
        let mut spectrum: Vec<Complex<f32>> = fft.make_output_vec();

        fft.process(&mut fft_input, &mut spectrum)
            .map_err(|e| RppgError::ProcessingError {
                message: format!("FFT failed: {}", e),
            })?;

        let magnitudes: Vec<f32> = spectrum.iter().map(|c| c.norm()).collect();
        let freq_resolution = self.sample_rate_hz / fft_size as f32;

        // In-band bins only, DC always excluded
        let min_bin = ((self.band_low_hz / freq_resolution).ceil() as usize).max(1);
        let max_bin = ((self.band_high_hz / freq_resolution).floor() as usize)
            .min(magnitudes.len() - 1);
        if min_bin > max_bin {
            return Err(RppgError::NoValidPeak {
                band_low_hz: self.band_low_hz,
                band_high_hz: self.band_high_hz,
            });
        }

        let (peak_bin, peak_magnitude, magnitude_sum) =
            scan_band_peak(&magnitudes, min_bin, max_bin);
        if magnitude_sum <= f32::EPSILON {
            return Err(RppgError::InsufficientSignal {
                reason: "no energy in pulse band".to_string(),
            });
        }

        Ok(BandSpectrum {
            peak: SpectralPeak {
                frequency_hz: peak_bin as f32 * freq_resolution,
                magnitude: peak_magnitude,
            },
            in_band_magnitude_sum: magnitude_sum,
            freq_resolution_hz: freq_resolution,
        })
    }

    pub fn band(&self) -> (f32, f32) {
        (self.band_low_hz, self.band_high_hz)
    }
}

/// Scan `magnitudes[min_bin..=max_bin]` for the dominant bin.
///
/// The scan runs in ascending frequency and a later bin takes over only when
/// it beats the incumbent by more than [`PEAK_TIE_REL_TOL`], so equal peaks
/// resolve to the lowest frequency. Also accumulates the band magnitude sum.
fn scan_band_peak(magnitudes: &[f32], min_bin: usize, max_bin: usize) -> (usize, f32, f32) {
    let mut peak_bin = min_bin;
    let mut peak_magnitude = magnitudes[min_bin];
    let mut magnitude_sum = 0.0f32;

    for (bin, &m) in magnitudes
        .iter()
        .enumerate()
        .take(max_bin + 1)
        .skip(min_bin)
    {
        magnitude_sum += m;
        if m > peak_magnitude * (1.0 + PEAK_TIE_REL_TOL) {
            peak_magnitude = m;
            peak_bin = bin;
        }
    }

    (peak_bin, peak_magnitude, magnitude_sum)
}
