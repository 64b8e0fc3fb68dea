//! Per-frame sample types produced by the ROI sampler
//!
//! The sampler collaborator reduces each video frame to one scalar: the mean
//! intensity over the tracked skin region. Frames where no region was found
//! arrive as [`RoiSample::Missing`] and must be dropped, never zero-filled.

use serde::{Deserialize, Serialize};

/// One recorded intensity sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Mean region intensity for this frame
    pub value: f32,
    /// Monotonic frame counter at the time of capture
    pub frame_index: u64,
}

impl Sample {
    pub fn new(value: f32, frame_index: u64) -> Self {
        Self { value, frame_index }
    }
}

/// Raw per-frame output of the ROI sampler
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RoiSample {
    /// Mean intensity of the detected skin region
    Intensity(f32),
    /// No usable region in this frame
    Missing,
}

impl RoiSample {
    /// Intensity value if this frame carries one that is safe to record.
    ///
    /// Non-finite intensities are treated the same as a missing region so a
    /// misbehaving sampler cannot poison the detrend and filter stages.
    pub fn usable_intensity(&self) -> Option<f32> {
        match self {
            RoiSample::Intensity(value) if value.is_finite() => Some(*value),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, RoiSample::Missing)
    }
}

impl From<f32> for RoiSample {
    fn from(value: f32) -> Self {
        RoiSample::Intensity(value)
    }
}

impl From<Option<f32>> for RoiSample {
    fn from(value: Option<f32>) -> Self {
        match value {
            Some(v) => RoiSample::Intensity(v),
            None => RoiSample::Missing,
        }
    }
}
