//! Basic usage examples for the heart-rate estimation pipeline
//!
//! This example demonstrates the fundamental operations of the pipeline
//! including configuration, lock acquisition, graceful degradation on bad
//! input, and session reset.

use rppg_core::{LockState, RoiSample, RppgResult};
use rppg_processing::{PulseConfig, PulsePipeline};

fn main() -> RppgResult<()> {
    println!("=== RPPG Pipeline Basic Usage Examples ===\n");

    // Example 1: Locking onto a clean synthetic pulse
    clean_pulse_example()?;

    // Example 2: Degrading gracefully on a flat frame stream
    flat_signal_example()?;

    // Example 3: Resetting between monitoring sessions
    reset_example()?;

    // Example 4: Configuration import and export
    config_roundtrip_example()?;

    println!("\n=== All examples completed successfully! ===");
    Ok(())
}

/// Example 1: Estimate the rate of a clean 72 BPM pulse
fn clean_pulse_example() -> RppgResult<()> {
    println!("1. Clean Pulse Example");
    println!("   Feeding 10 seconds of synthetic 72 BPM video intensities...");

    let config = PulseConfig::webcam();
    let mut pipeline = PulsePipeline::new(config)?;

    // Simulate mean ROI green-channel intensity: 72 BPM pulse plus slow
    // lighting drift and a little sensor noise
    for frame in 0..300u32 {
        let t = frame as f32 / 30.0;
        let pulse = 2.5 * (2.0 * std::f32::consts::PI * 1.2 * t).sin();
        let drift = 4.0 * (2.0 * std::f32::consts::PI * 0.05 * t).sin();
        let value = 112.0 + pulse + drift + 0.3 * rand_noise();

        let estimate = pipeline.ingest(RoiSample::from(value));
        if frame % 60 == 0 {
            println!(
                "   t={:>4.1}s  fill={:>5.1}%  {}",
                t,
                pipeline.fill_ratio() * 100.0,
                estimate
            );
        }
    }

    let estimate = pipeline.estimate();
    println!("   ✓ Final estimate: {}", estimate);
    println!("   ✓ Locked: {}", estimate.is_locked());

    let stats = pipeline.stats();
    println!(
        "   ✓ {} passes, average {}us per pass",
        stats.passes,
        stats.average_pass_us()
    );

    Ok(())
}

/// Example 2: A covered camera produces flat frames, never a lock
fn flat_signal_example() -> RppgResult<()> {
    println!("\n2. Flat Signal Example");
    println!("   Feeding 200 identical frames (covered lens)...");

    let mut pipeline = PulsePipeline::new(PulseConfig::default())?;

    for _ in 0..200 {
        pipeline.ingest(RoiSample::from(96.0));
    }

    let estimate = pipeline.estimate();
    let stats = pipeline.stats();
    println!("   ✓ State: {} (never locked)", estimate.state);
    println!(
        "   ✓ {} of {} passes scored unreliable",
        stats.unreliable_passes, stats.passes
    );

    Ok(())
}

/// Example 3: Reset when the subject leaves the frame
fn reset_example() -> RppgResult<()> {
    println!("\n3. Session Reset Example");

    let mut pipeline = PulsePipeline::new(PulseConfig::default())?;
    for frame in 0..200u32 {
        let t = frame as f32 / 30.0;
        let value = 100.0 + 3.0 * (2.0 * std::f32::consts::PI * 1.1 * t).sin();
        pipeline.ingest(RoiSample::from(value));
    }
    println!("   Before reset: {}", pipeline.estimate());

    pipeline.reset();

    let estimate = pipeline.estimate();
    println!("   After reset:  {}", estimate);
    println!(
        "   ✓ State back to {:?}, fill ratio {:.0}%",
        LockState::Empty,
        pipeline.fill_ratio() * 100.0
    );

    Ok(())
}

/// Example 4: Persist a tuned configuration as JSON
fn config_roundtrip_example() -> RppgResult<()> {
    println!("\n4. Configuration Round-trip Example");

    let mut config = PulseConfig::high_frame_rate();
    config.smoothing_window = 8;

    let json = config.to_json()?;
    println!("   Exported configuration:\n{}", json);

    let restored = PulseConfig::from_json(&json)?;
    restored.validate()?;
    println!(
        "   ✓ Restored: {} Hz, buffer {}, band {:.1}-{:.1} Hz",
        restored.sample_rate_hz,
        restored.buffer_capacity,
        restored.band_low_hz,
        restored.band_high_hz
    );

    Ok(())
}

fn rand_noise() -> f32 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    use std::time::{SystemTime, UNIX_EPOCH};

    let mut hasher = DefaultHasher::new();
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos()
        .hash(&mut hasher);
    let hash = hasher.finish();

    // Convert to [-1, 1] range
    ((hash % 10000) as f32 / 5000.0) - 1.0
}
