//! Monitoring scenarios for exercising the pipeline end to end

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::pulse_simulator::NoiseConfig;

/// Scripted subject behavior over a monitoring session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PulseScenario {
    /// Subject at rest, steady 72 BPM
    SteadyRest,
    /// Heart rate climbing linearly over the ramp window
    Ramping {
        start_bpm: f32,
        end_bpm: f32,
        ramp_seconds: f32,
    },
    /// Nobody in frame; every sample is missing
    Absent,
    /// Subject periodically out of frame
    IntermittentDropout { period_s: f32, gap_s: f32 },
    /// Subject present but moving, heavy artifacts
    HighMotion,
}

impl PulseScenario {
    /// Heart rate the subject should show at session time `t`.
    pub fn heart_rate_at(&self, t: f32) -> f32 {
        match self {
            PulseScenario::SteadyRest => 72.0,
            PulseScenario::Ramping {
                start_bpm,
                end_bpm,
                ramp_seconds,
            } => {
                let progress = (t / ramp_seconds).clamp(0.0, 1.0);
                start_bpm + (end_bpm - start_bpm) * progress
            }
            PulseScenario::Absent => 72.0,
            PulseScenario::IntermittentDropout { .. } => 72.0,
            PulseScenario::HighMotion => 84.0,
        }
    }

    /// Whether the ROI is usable at session time `t`. A `false` frame is
    /// delivered as a missing sample.
    pub fn presence_at(&self, t: f32) -> bool {
        match self {
            PulseScenario::Absent => false,
            PulseScenario::IntermittentDropout { period_s, gap_s } => {
                t.rem_euclid(*period_s) < period_s - gap_s
            }
            _ => true,
        }
    }

    /// Noise profile matching the scenario's motion level
    pub fn noise_profile(&self) -> NoiseConfig {
        match self {
            PulseScenario::HighMotion => NoiseConfig {
                gaussian_std: 1.0,
                baseline_wander: 4.0,
                motion_artifact_prob: 0.15,
                motion_artifact_amp: 12.0,
            },
            _ => NoiseConfig::default(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PulseScenario::SteadyRest => "steady",
            PulseScenario::Ramping { .. } => "ramping",
            PulseScenario::Absent => "absent",
            PulseScenario::IntermittentDropout { .. } => "dropout",
            PulseScenario::HighMotion => "motion",
        }
    }

    /// All scenarios with their default parameters
    pub fn presets() -> Vec<PulseScenario> {
        vec![
            PulseScenario::SteadyRest,
            PulseScenario::Ramping {
                start_bpm: 65.0,
                end_bpm: 120.0,
                ramp_seconds: 60.0,
            },
            PulseScenario::Absent,
            PulseScenario::IntermittentDropout {
                period_s: 20.0,
                gap_s: 6.0,
            },
            PulseScenario::HighMotion,
        ]
    }

    /// Look up a preset by its name.
    pub fn from_name(name: &str) -> Option<PulseScenario> {
        Self::presets()
            .into_iter()
            .find(|scenario| scenario.name() == name)
    }
}

impl fmt::Display for PulseScenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PulseScenario::Ramping {
                start_bpm,
                end_bpm,
                ramp_seconds,
            } => write!(
                f,
                "ramping {:.0} to {:.0} BPM over {:.0}s",
                start_bpm, end_bpm, ramp_seconds
            ),
            PulseScenario::IntermittentDropout { period_s, gap_s } => {
                write!(f, "dropout {:.0}s of every {:.0}s", gap_s, period_s)
            }
            other => write!(f, "{}", other.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ramping_interpolates_between_endpoints() {
        let scenario = PulseScenario::Ramping {
            start_bpm: 60.0,
            end_bpm: 120.0,
            ramp_seconds: 30.0,
        };

        assert!((scenario.heart_rate_at(0.0) - 60.0).abs() < 1e-6);
        assert!((scenario.heart_rate_at(15.0) - 90.0).abs() < 1e-6);
        assert!((scenario.heart_rate_at(30.0) - 120.0).abs() < 1e-6);
        // Holds the final rate past the ramp
        assert!((scenario.heart_rate_at(100.0) - 120.0).abs() < 1e-6);
    }

    #[test]
    fn test_dropout_presence_pattern() {
        let scenario = PulseScenario::IntermittentDropout {
            period_s: 10.0,
            gap_s: 3.0,
        };

        assert!(scenario.presence_at(0.0));
        assert!(scenario.presence_at(6.9));
        assert!(!scenario.presence_at(7.5));
        assert!(!scenario.presence_at(9.9));
        assert!(scenario.presence_at(10.1));
    }

    #[test]
    fn test_absent_is_never_present() {
        assert!(!PulseScenario::Absent.presence_at(0.0));
        assert!(!PulseScenario::Absent.presence_at(100.0));
    }

    #[test]
    fn test_lookup_by_name() {
        for scenario in PulseScenario::presets() {
            let found = PulseScenario::from_name(scenario.name());
            assert_eq!(found, Some(scenario));
        }
        assert_eq!(PulseScenario::from_name("nope"), None);
    }

    #[test]
    fn test_high_motion_noise_is_heavier() {
        let calm = PulseScenario::SteadyRest.noise_profile();
        let rough = PulseScenario::HighMotion.noise_profile();

        assert!(rough.gaussian_std > calm.gaussian_std);
        assert!(rough.motion_artifact_prob > calm.motion_artifact_prob);
    }
}
