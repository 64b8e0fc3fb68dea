//! Synthetic ROI intensity generation with a realistic pulse waveform

use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use rppg_core::{config_error, RppgResult};
use serde::{Deserialize, Serialize};

/// Configuration for pulse simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PulseSimConfig {
    /// Simulated heart rate in BPM
    pub heart_rate_bpm: f32,
    /// Camera frame rate in Hz
    pub sampling_rate: f32,
    /// Pulse amplitude in intensity units
    pub pulse_amplitude: f32,
    /// Mean ROI intensity level (8-bit scale)
    pub baseline_level: f32,
    /// Relative strength of the second harmonic (dicrotic notch shape)
    pub second_harmonic: f32,
    /// Noise configuration
    pub noise: NoiseConfig,
    /// Lighting flicker frequency in Hz (None = stable lighting)
    pub flicker_freq: Option<f32>,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
}

/// Noise configuration for realistic camera intensity streams
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// Gaussian sensor noise standard deviation (0.0 = no noise)
    pub gaussian_std: f32,
    /// Baseline wander amplitude (slow lighting drift)
    pub baseline_wander: f32,
    /// Motion artifact probability per frame (0.0 to 1.0)
    pub motion_artifact_prob: f32,
    /// Motion artifact amplitude
    pub motion_artifact_amp: f32,
}

impl NoiseConfig {
    /// No noise at all; useful for deterministic tests
    pub fn silent() -> Self {
        Self {
            gaussian_std: 0.0,
            baseline_wander: 0.0,
            motion_artifact_prob: 0.0,
            motion_artifact_amp: 0.0,
        }
    }
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            gaussian_std: 0.3,
            baseline_wander: 1.5,
            motion_artifact_prob: 0.01,
            motion_artifact_amp: 6.0,
        }
    }
}

impl Default for PulseSimConfig {
    fn default() -> Self {
        Self {
            heart_rate_bpm: 72.0,
            sampling_rate: 30.0,
            pulse_amplitude: 2.5,
            baseline_level: 110.0,
            second_harmonic: 0.3,
            noise: NoiseConfig::default(),
            flicker_freq: Some(5.0),
            seed: None,
        }
    }
}

/// Baseline wander frequency, well below any plausible pulse
const WANDER_FREQ_HZ: f32 = 0.05;
/// Fixed flicker amplitude in intensity units
const FLICKER_AMPLITUDE: f32 = 0.3;

/// ROI intensity simulator
///
/// Produces the mean green-channel intensity a camera would report for a
/// face ROI: a pulse fundamental plus second harmonic riding on a baseline,
/// with drift, flicker, and sensor noise on top. Phase accumulates per
/// sample, so the heart rate can change mid-stream without a waveform jump.
pub struct PulseSimulator {
    config: PulseSimConfig,
    rng: rand::rngs::StdRng,
    normal_dist: Normal<f32>,
    time_offset: f32,
    phase: f32,
}

impl PulseSimulator {
    /// Create new pulse simulator with configuration
    pub fn new(config: PulseSimConfig) -> RppgResult<Self> {
        validate_sim_config(&config)?;

        let seed = config.seed.unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs()
        });

        let rng = rand::rngs::StdRng::seed_from_u64(seed);
        let normal_dist = Normal::new(0.0, config.noise.gaussian_std)
            .map_err(|e| config_error!("invalid gaussian noise level: {}", e))?;

        Ok(PulseSimulator {
            config,
            rng,
            normal_dist,
            time_offset: 0.0,
            phase: 0.0,
        })
    }

    /// Generate the next frame's ROI intensity.
    pub fn next_sample(&mut self) -> f32 {
        let time = self.time_offset;
        let dt = 1.0 / self.config.sampling_rate;

        let mut value = self.pulse_sample();
        value += self.add_noise(time);
        if let Some(flicker_freq) = self.config.flicker_freq {
            value += self.add_flicker(time, flicker_freq);
        }

        // Clamp to the 8-bit sensor range
        value = value.clamp(0.0, 255.0);

        let freq_hz = self.config.heart_rate_bpm / 60.0;
        self.phase = (self.phase + 2.0 * std::f32::consts::PI * freq_hz * dt)
            .rem_euclid(2.0 * std::f32::consts::PI);
        self.time_offset += dt;

        value
    }

    /// Generate a block of samples covering `duration` seconds.
    ///
    /// Time keeps running across calls, so consecutive blocks join without a
    /// discontinuity.
    pub fn generate(&mut self, duration: f32) -> Vec<f32> {
        let sample_count = (duration * self.config.sampling_rate) as usize;
        (0..sample_count).map(|_| self.next_sample()).collect()
    }

    /// Pulse waveform at the current phase
    fn pulse_sample(&self) -> f32 {
        let fundamental = self.phase.sin();
        let harmonic = self.config.second_harmonic
            * (2.0 * self.phase + std::f32::consts::FRAC_PI_4).sin();

        self.config.baseline_level + self.config.pulse_amplitude * (fundamental + harmonic)
    }

    /// Add various noise components
    fn add_noise(&mut self, time: f32) -> f32 {
        let mut noise = 0.0;

        // Gaussian sensor noise
        noise += self.normal_dist.sample(&mut self.rng);

        // Baseline wander (slow lighting drift)
        noise += self.config.noise.baseline_wander
            * (2.0 * std::f32::consts::PI * WANDER_FREQ_HZ * time).sin();

        // Motion artifacts (random jumps)
        if self.rng.gen::<f32>() < self.config.noise.motion_artifact_prob {
            noise += self.config.noise.motion_artifact_amp * self.rng.gen_range(-1.0..1.0);
        }

        noise
    }

    /// Lighting flicker component
    fn add_flicker(&self, time: f32, frequency: f32) -> f32 {
        FLICKER_AMPLITUDE * (2.0 * std::f32::consts::PI * frequency * time).sin()
    }

    /// Change the simulated heart rate. Phase continuity is preserved.
    pub fn set_heart_rate(&mut self, bpm: f32) {
        self.config.heart_rate_bpm = bpm;
    }

    /// Reset time and phase (useful for restarting simulation)
    pub fn reset_time(&mut self) {
        self.time_offset = 0.0;
        self.phase = 0.0;
    }

    /// Get current configuration
    pub fn config(&self) -> &PulseSimConfig {
        &self.config
    }

    /// Update configuration; the noise distribution is rebuilt to match.
    pub fn update_config(&mut self, config: PulseSimConfig) -> RppgResult<()> {
        validate_sim_config(&config)?;

        self.normal_dist = Normal::new(0.0, config.noise.gaussian_std)
            .map_err(|e| config_error!("invalid gaussian noise level: {}", e))?;
        self.config = config;
        Ok(())
    }
}

fn validate_sim_config(config: &PulseSimConfig) -> RppgResult<()> {
    if !config.sampling_rate.is_finite() || config.sampling_rate <= 0.0 {
        return Err(config_error!(
            "sampling rate must be positive, got {}",
            config.sampling_rate
        ));
    }
    if !config.heart_rate_bpm.is_finite() || config.heart_rate_bpm <= 0.0 {
        return Err(config_error!(
            "heart rate must be positive, got {} BPM",
            config.heart_rate_bpm
        ));
    }
    if config.pulse_amplitude < 0.0 {
        return Err(config_error!(
            "pulse amplitude must not be negative, got {}",
            config.pulse_amplitude
        ));
    }
    if config.noise.gaussian_std < 0.0 {
        return Err(config_error!(
            "gaussian noise level must not be negative, got {}",
            config.noise.gaussian_std
        ));
    }
    if !(0.0..=1.0).contains(&config.noise.motion_artifact_prob) {
        return Err(config_error!(
            "motion artifact probability must be within 0.0 to 1.0, got {}",
            config.noise.motion_artifact_prob
        ));
    }
    Ok(())
}
