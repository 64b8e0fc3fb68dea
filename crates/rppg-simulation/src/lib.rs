//! RPPG-Simulation: Synthetic ROI intensity generation
//!
//! Provides realistic pulse signal simulation for testing and development.

pub mod pulse_simulator;
pub mod scenarios;
pub mod stream;

pub use pulse_simulator::*;
pub use scenarios::*;
pub use stream::*;
