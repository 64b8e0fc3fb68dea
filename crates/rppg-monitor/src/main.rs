//! rPPG Monitor - Headless heart-rate estimation session

mod service;

use anyhow::{anyhow, Context, Result};
use rppg_core::SessionId;
use rppg_processing::PulseConfig;
use rppg_simulation::{start_roi_stream, PulseScenario, StreamCommand, StreamConfig};
use service::{start_monitor_service, MonitorCommand, MonitorUpdate};
use tokio::sync::broadcast;
use tokio::time::{sleep, Duration, Instant};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().collect();
    let scenario = match args.get(1).map(String::as_str) {
        Some(name) => PulseScenario::from_name(name).ok_or_else(|| {
            let known: Vec<&str> = PulseScenario::presets()
                .iter()
                .map(|scenario| scenario.name())
                .collect();
            anyhow!("unknown scenario '{}', expected one of {:?}", name, known)
        })?,
        None => PulseScenario::SteadyRest,
    };
    let duration_s: u64 = match args.get(2) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("invalid session duration '{}'", raw))?,
        None => 30,
    };

    let session_id = SessionId::new();
    println!("Starting rPPG monitoring session {}", session_id);
    println!("Signal Flow: ROI Sampler → Estimation Pipeline → BPM Estimate");
    println!("Scenario: {}, duration: {}s", scenario, duration_s);

    let config = PulseConfig::default();
    info!(%session_id, scenario = %scenario, "session configured");

    let stream_config = StreamConfig::for_scenario(scenario);
    let (frame_receiver, stream_commands, _stream_stats) =
        start_roi_stream(stream_config).await?;

    let (updates, monitor_commands, monitor_stats) =
        start_monitor_service(frame_receiver, config)?;

    monitor_commands.send(MonitorCommand::Start).await?;
    stream_commands.send(StreamCommand::Start).await?;

    run_session(updates, session_id, Duration::from_secs(duration_s)).await;

    stream_commands.send(StreamCommand::Stop).await?;
    monitor_commands.send(MonitorCommand::Stop).await?;
    sleep(Duration::from_millis(100)).await;

    let stats = monitor_stats.lock().await.clone();
    println!("\n--- Session report ({}) ---", session_id);
    println!("Frames ingested:   {}", stats.frames_ingested);
    println!("Missing frames:    {}", stats.missing_frames);
    println!("Estimation passes: {}", stats.passes);
    println!("Unreliable passes: {}", stats.unreliable_passes);
    println!("Average pass time: {} us", stats.average_pass_us);
    println!("Final lock state:  {}", stats.lock_state);

    Ok(())
}

/// Consume estimate updates until the deadline, logging one line per second.
async fn run_session(
    mut updates: broadcast::Receiver<MonitorUpdate>,
    session_id: SessionId,
    duration: Duration,
) {
    let deadline = Instant::now() + duration;
    let mut last_report = Instant::now();
    let mut last_state = None;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }

        let update = tokio::select! {
            received = updates.recv() => match received {
                Ok(update) => update,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = sleep(remaining) => break,
        };

        let estimate = update.estimate;
        if last_state != Some(estimate.state) {
            info!(%session_id, state = %estimate.state, "lock state changed");
            last_state = Some(estimate.state);
        }

        if last_report.elapsed() >= Duration::from_secs(1) {
            if estimate.is_locked() {
                println!(
                    "locked:    {:5.1} BPM (confidence {:.2})",
                    estimate.bpm, estimate.confidence
                );
            } else {
                println!(
                    "searching: {} (buffer {:3.0}%)",
                    estimate.state,
                    update.fill_ratio * 100.0
                );
            }
            last_report = Instant::now();
        }
    }
}
