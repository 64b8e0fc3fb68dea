//! RPPG-Core: Foundation types for remote photoplethysmography
//!
//! Shared types for the heart-rate estimation pipeline: per-frame samples,
//! the fixed-capacity sample window, estimate/lock-state outputs, session
//! identity, and the framework error taxonomy.

pub mod error;
pub mod estimate;
pub mod ring_buffer;
pub mod sample;
pub mod session;

pub use estimate::*;
pub use ring_buffer::*;
pub use sample::*;
pub use session::*;
pub use error::{RppgError, RppgResult};
