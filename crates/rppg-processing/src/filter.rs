//! Zero-phase Butterworth bandpass
//!
//! The pulse band is isolated by cascaded biquad sections: highpass sections
//! at the low band edge followed by lowpass sections at the high edge. Each
//! window is run forward and then backward through the cascade, which cancels
//! the filter's phase shift and keeps waveform peaks where the pulse put them.

use rppg_core::{RppgError, RppgResult};

use crate::config::PulseConfig;

/// Single biquad section (2nd order)
#[derive(Debug, Clone)]
struct BiquadSection {
    // Coefficients: y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2] - a1*y[n-1] - a2*y[n-2]
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    // Filter state
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl BiquadSection {
    fn with_coefficients(b0: f32, b1: f32, b2: f32, a1: f32, a2: f32) -> Self {
        Self {
            b0,
            b1,
            b2,
            a1,
            a2,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    fn process_sample(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }

    fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

/// Butterworth pole term `2*sin(theta_k)` for section `k` of an even-order
/// cascade. Order 2 reduces to the familiar sqrt(2).
fn pole_term(order: usize, section: usize) -> f32 {
    let theta = std::f32::consts::PI * (2 * section + 1) as f32 / (2 * order) as f32;
    2.0 * theta.sin()
}

fn design_lowpass_sections(order: usize, cutoff: f32, fs: f32) -> RppgResult<Vec<BiquadSection>> {
    if cutoff >= fs / 2.0 {
        return Err(RppgError::ConfigurationError {
            message: "cutoff frequency must be less than Nyquist frequency".to_string(),
        });
    }

    // Pre-warp frequency for bilinear transform
    let omega_c = 2.0 * std::f32::consts::PI * cutoff / fs;
    let k = (omega_c / 2.0).tan();
    let k2 = k * k;

    let sections = (0..order / 2)
        .map(|s| {
            let q_term = pole_term(order, s);
            let denom = k2 + q_term * k + 1.0;

            let b0 = k2 / denom;
            let a1 = (2.0 * (k2 - 1.0)) / denom;
            let a2 = (k2 - q_term * k + 1.0) / denom;
            BiquadSection::with_coefficients(b0, 2.0 * b0, b0, a1, a2)
        })
        .collect();
    Ok(sections)
}

fn design_highpass_sections(order: usize, cutoff: f32, fs: f32) -> RppgResult<Vec<BiquadSection>> {
    if cutoff >= fs / 2.0 {
        return Err(RppgError::ConfigurationError {
            message: "cutoff frequency must be less than Nyquist frequency".to_string(),
        });
    }

    let omega_c = 2.0 * std::f32::consts::PI * cutoff / fs;
    let k = (omega_c / 2.0).tan();
    let k2 = k * k;

    let sections = (0..order / 2)
        .map(|s| {
            let q_term = pole_term(order, s);
            let denom = k2 + q_term * k + 1.0;

            let b0 = 1.0 / denom;
            let a1 = (2.0 * (k2 - 1.0)) / denom;
            let a2 = (k2 - q_term * k + 1.0) / denom;
            BiquadSection::with_coefficients(b0, -2.0 * b0, b0, a1, a2)
        })
        .collect();
    Ok(sections)
}

/// Zero-phase Butterworth bandpass over a whole window
///
/// Owns the biquad cascade and its state. [`BandpassFilter::apply`] runs the
/// window forward and backward through the cascade with odd-reflection
/// padding at both ends, so the result has no group delay and no edge
/// transient leaking into the analysis region.
#[derive(Debug, Clone)]
pub struct BandpassFilter {
    sections: Vec<BiquadSection>,
    band_low_hz: f32,
    band_high_hz: f32,
    pad_len: usize,
}

impl BandpassFilter {
    pub fn new(config: &PulseConfig) -> RppgResult<Self> {
        if config.filter_order < 2 || config.filter_order > 8 || config.filter_order % 2 != 0 {
            return Err(RppgError::ConfigurationError {
                message: format!("filter order must be even, 2 to 8, got {}", config.filter_order),
            });
        }
        if config.band_low_hz >= config.band_high_hz {
            return Err(RppgError::ConfigurationError {
                message: format!(
                    "band low edge {} Hz must be below high edge {} Hz",
                    config.band_low_hz, config.band_high_hz
                ),
            });
        }

        let mut sections =
            design_highpass_sections(config.filter_order, config.band_low_hz, config.sample_rate_hz)?;
        sections.extend(design_lowpass_sections(
            config.filter_order,
            config.band_high_hz,
            config.sample_rate_hz,
        )?);

        Ok(Self {
            sections,
            band_low_hz: config.band_low_hz,
            band_high_hz: config.band_high_hz,
            // Long enough for the cascade transient to die out inside the pad
            pad_len: 3 * (2 * config.filter_order + 1),
        })
    }

    pub fn band(&self) -> (f32, f32) {
        (self.band_low_hz, self.band_high_hz)
    }

    /// Filter `window` with zero net phase shift.
    ///
    /// Output length equals input length. Windows of fewer than two samples
    /// pass through unchanged; there is nothing to reflect against.
    pub fn apply(&mut self, window: &[f32]) -> Vec<f32> {
        if window.len() < 2 {
            return window.to_vec();
        }

        let pad = self.pad_len.min(window.len() - 1);
        let mut data = odd_reflect_pad(window, pad);

        self.prime_for_step(data[0]);
        for value in data.iter_mut() {
            *value = self.run_cascade(*value);
        }

        data.reverse();
        self.prime_for_step(data[0]);
        for value in data.iter_mut() {
            *value = self.run_cascade(*value);
        }
        data.reverse();

        data[pad..pad + window.len()].to_vec()
    }

    /// Clear all section state.
    pub fn reset(&mut self) {
        for section in &mut self.sections {
            section.reset();
        }
    }

    /// Load each section with its steady state for a step of height `level`,
    /// so a pass starts settled instead of ringing at the window edge.
    fn prime_for_step(&mut self, level: f32) {
        let mut input = level;
        for section in &mut self.sections {
            let dc_gain =
                (section.b0 + section.b1 + section.b2) / (1.0 + section.a1 + section.a2);
            section.x1 = input;
            section.x2 = input;
            section.y1 = dc_gain * input;
            section.y2 = dc_gain * input;
            input *= dc_gain;
        }
    }

    fn run_cascade(&mut self, input: f32) -> f32 {
        let mut value = input;
        for section in &mut self.sections {
            value = section.process_sample(value);
        }
        value
    }
}

/// Extend `window` by `pad` samples at each end, reflected through the end
/// value so the padded signal stays continuous in value and slope.
fn odd_reflect_pad(window: &[f32], pad: usize) -> Vec<f32> {
    let n = window.len();
    let mut padded = Vec::with_capacity(n + 2 * pad);

    let first = window[0];
    for i in (1..=pad).rev() {
        padded.push(2.0 * first - window[i]);
    }
    padded.extend_from_slice(window);
    let last = window[n - 1];
    for i in 1..=pad {
        padded.push(2.0 * last - window[n - 1 - i]);
    }
    padded
}

#[cfg(test)]
mod tests {
    use super::*;

    const FS: f32 = 30.0;

    fn test_config() -> PulseConfig {
        PulseConfig::default()
    }

    fn tone(freq_hz: f32, n: usize) -> Vec<f32> {
        (0..n)
            .map(|i| (2.0 * std::f32::consts::PI * freq_hz * i as f32 / FS).sin())
            .collect()
    }

    fn rms(signal: &[f32]) -> f32 {
        let sum: f32 = signal.iter().map(|&x| x * x).sum();
        (sum / signal.len() as f32).sqrt()
    }

    fn central(signal: &[f32]) -> &[f32] {
        let quarter = signal.len() / 4;
        &signal[quarter..signal.len() - quarter]
    }

    #[test]
    fn test_passband_tone_passes_through() {
        let mut filter = BandpassFilter::new(&test_config()).unwrap();
        let input = tone(1.5, 300);

        let output = filter.apply(&input);

        assert_eq!(output.len(), input.len());
        let ratio = rms(central(&output)) / rms(central(&input));
        assert!(ratio > 0.8 && ratio < 1.1, "passband gain {}", ratio);
    }

    #[test]
    fn test_slow_drift_attenuated() {
        let mut filter = BandpassFilter::new(&test_config()).unwrap();
        let input = tone(0.1, 300);

        let output = filter.apply(&input);

        let ratio = rms(central(&output)) / rms(central(&input));
        assert!(ratio < 0.05, "drift leaked through, gain {}", ratio);
    }

    #[test]
    fn test_high_frequency_noise_attenuated() {
        let mut filter = BandpassFilter::new(&test_config()).unwrap();
        let input = tone(10.0, 300);

        let output = filter.apply(&input);

        let ratio = rms(central(&output)) / rms(central(&input));
        assert!(ratio < 0.05, "noise leaked through, gain {}", ratio);
    }

    #[test]
    fn test_zero_phase_keeps_peaks_aligned() {
        let mut filter = BandpassFilter::new(&test_config()).unwrap();
        let input = tone(1.5, 300);

        let output = filter.apply(&input);

        // Cross-correlate over a central region; zero lag must win.
        let region = 75..225;
        let mut best_lag = 0i32;
        let mut best_score = f32::MIN;
        for lag in -3i32..=3 {
            let mut score = 0.0f32;
            for i in region.clone() {
                let j = i as i32 + lag;
                score += input[i] * output[j as usize];
            }
            if score > best_score {
                best_score = score;
                best_lag = lag;
            }
        }
        assert_eq!(best_lag, 0, "filtered tone shifted by {} samples", best_lag);
    }

    #[test]
    fn test_constant_input_blocked() {
        let mut filter = BandpassFilter::new(&test_config()).unwrap();
        let input = vec![42.0f32; 300];

        let output = filter.apply(&input);

        for value in &output {
            assert!(value.abs() < 1e-3, "DC leaked through: {}", value);
        }
    }

    #[test]
    fn test_band_above_nyquist_rejected() {
        let mut config = test_config();
        config.band_high_hz = 15.0;

        assert!(matches!(
            BandpassFilter::new(&config),
            Err(RppgError::ConfigurationError { .. })
        ));
    }

    #[test]
    fn test_inverted_band_rejected() {
        let mut config = test_config();
        config.band_low_hz = 4.0;
        config.band_high_hz = 0.7;

        assert!(BandpassFilter::new(&config).is_err());
    }

    #[test]
    fn test_odd_order_rejected() {
        let mut config = test_config();
        config.filter_order = 3;

        assert!(BandpassFilter::new(&config).is_err());
    }

    #[test]
    fn test_tiny_window_passes_through() {
        let mut filter = BandpassFilter::new(&test_config()).unwrap();
        assert_eq!(filter.apply(&[5.0]), vec![5.0]);
        assert!(filter.apply(&[]).is_empty());
    }

    #[test]
    fn test_higher_order_sharpens_rolloff() {
        let mut config2 = test_config();
        config2.filter_order = 2;
        let mut config8 = test_config();
        config8.filter_order = 8;
        let mut gentle = BandpassFilter::new(&config2).unwrap();
        let mut steep = BandpassFilter::new(&config8).unwrap();

        // Just outside the high edge
        let input = tone(5.5, 300);
        let gentle_gain = rms(central(&gentle.apply(&input))) / rms(central(&input));
        let steep_gain = rms(central(&steep.apply(&input))) / rms(central(&input));

        assert!(
            steep_gain < gentle_gain,
            "order 8 gain {} not below order 2 gain {}",
            steep_gain,
            gentle_gain
        );
    }

    #[test]
    fn test_odd_reflect_pad_shape() {
        let padded = odd_reflect_pad(&[1.0, 2.0, 3.0, 4.0], 2);
        assert_eq!(padded, vec![-1.0, 0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }
}
