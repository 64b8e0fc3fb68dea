//! Z-score normalization
//!
//! Raw ROI intensities vary with exposure and skin tone. Scaling each window
//! to zero mean and unit variance makes the downstream filter and spectral
//! stages independent of absolute signal level.

use rppg_core::{RppgError, RppgResult};
use tracing::debug;

/// Standard deviation below this is a flat window with no pulse information.
const FLAT_SIGNAL_EPS: f32 = 1e-10;

#[derive(Debug, Clone, Default)]
pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Scale `window` to zero mean, unit variance.
    ///
    /// A window with standard deviation below [`FLAT_SIGNAL_EPS`] carries no
    /// usable pulse and is rejected as
    /// [`RppgError::InsufficientSignal`] rather than divided to garbage.
    pub fn normalize(&self, window: &[f32]) -> RppgResult<Vec<f32>> {
        if window.is_empty() {
            return Err(RppgError::InsufficientSignal {
                reason: "empty window".to_string(),
            });
        }

        let n = window.len() as f32;
        let mean = window.iter().copied().sum::<f32>() / n;
        let variance = window.iter().map(|&x| (x - mean) * (x - mean)).sum::<f32>() / n;
        let std_dev = variance.sqrt();

        if std_dev < FLAT_SIGNAL_EPS {
            debug!(std_dev, "window rejected as flat");
            return Err(RppgError::InsufficientSignal {
                reason: format!("flat window, std {:.3e}", std_dev),
            });
        }

        Ok(window.iter().map(|&x| (x - mean) / std_dev).collect())
    }
}
