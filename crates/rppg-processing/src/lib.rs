//! RPPG-Processing: Heart-rate estimation pipeline
//!
//! Turns a stream of per-frame ROI intensities into a smoothed BPM estimate:
//! detrend, normalize, zero-phase bandpass, spectral peak search, tracking.

pub mod config;
pub mod detrend;
pub mod filter;
pub mod normalize;
pub mod pipeline;
pub mod spectral;
pub mod tracker;

pub use config::PulseConfig;
pub use detrend::Detrender;
pub use filter::BandpassFilter;
pub use normalize::Normalizer;
pub use pipeline::{PassStats, PulsePipeline};
pub use spectral::{BandSpectrum, SpectralEstimator};
pub use tracker::BpmTracker;
