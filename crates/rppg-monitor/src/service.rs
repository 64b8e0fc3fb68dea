//! Monitoring service bridging the ROI stream and the estimation pipeline

use std::sync::Arc;

use rppg_core::{BpmEstimate, LockState, RoiSample, RppgResult};
use rppg_processing::{PulseConfig, PulsePipeline};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, Mutex};
use tracing::{info, warn};

/// Commands for controlling monitoring
#[derive(Debug, Clone)]
pub enum MonitorCommand {
    Start,
    Stop,
    Pause,
    Resume,
    /// Clear the pipeline without stopping ingestion (subject left frame)
    Reset,
}

/// Per-frame output for display consumers
#[derive(Debug, Clone, Copy)]
pub struct MonitorUpdate {
    pub estimate: BpmEstimate,
    pub fill_ratio: f32,
}

/// Statistics about monitoring progress
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorStats {
    pub is_running: bool,
    pub frames_ingested: u64,
    pub missing_frames: u64,
    pub passes: u64,
    pub unreliable_passes: u64,
    pub average_pass_us: u64,
    pub lock_state: LockState,
}

impl Default for MonitorStats {
    fn default() -> Self {
        Self {
            is_running: false,
            frames_ingested: 0,
            missing_frames: 0,
            passes: 0,
            unreliable_passes: 0,
            average_pass_us: 0,
            lock_state: LockState::Empty,
        }
    }
}

/// Real-time heart-rate monitoring service
pub struct MonitorService {
    pipeline: PulsePipeline,
    frame_receiver: broadcast::Receiver<RoiSample>,
    update_sender: broadcast::Sender<MonitorUpdate>,
    command_receiver: mpsc::Receiver<MonitorCommand>,
    command_sender: mpsc::Sender<MonitorCommand>,
    is_running: Arc<Mutex<bool>>,
    stats: Arc<Mutex<MonitorStats>>,
    frames_ingested: u64,
    missing_frames: u64,
}

impl MonitorService {
    /// Create new monitoring service; the pipeline is built up front so a bad
    /// configuration fails here, not mid-session.
    pub fn new(
        frame_receiver: broadcast::Receiver<RoiSample>,
        config: PulseConfig,
    ) -> RppgResult<Self> {
        let pipeline = PulsePipeline::new(config)?;
        let (update_sender, _) = broadcast::channel(64);
        let (command_sender, command_receiver) = mpsc::channel(32);

        Ok(MonitorService {
            pipeline,
            frame_receiver,
            update_sender,
            command_receiver,
            command_sender,
            is_running: Arc::new(Mutex::new(false)),
            stats: Arc::new(Mutex::new(MonitorStats::default())),
            frames_ingested: 0,
            missing_frames: 0,
        })
    }

    /// Get a receiver for per-frame estimate updates
    pub fn subscribe_updates(&self) -> broadcast::Receiver<MonitorUpdate> {
        self.update_sender.subscribe()
    }

    /// Get command sender for controlling monitoring
    pub fn command_handle(&self) -> mpsc::Sender<MonitorCommand> {
        self.command_sender.clone()
    }

    /// Main monitoring loop
    pub async fn run(&mut self) -> RppgResult<()> {
        info!("monitor service started");

        loop {
            tokio::select! {
                frame = self.frame_receiver.recv() => {
                    match frame {
                        Ok(sample) => {
                            let is_running = *self.is_running.lock().await;
                            if is_running {
                                self.ingest_frame(sample).await;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(skipped, "monitor lagged behind the frame stream");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            info!("frame stream closed, stopping monitor service");
                            break;
                        }
                    }
                }

                command = self.command_receiver.recv() => {
                    match command {
                        Some(MonitorCommand::Start) | Some(MonitorCommand::Resume) => {
                            *self.is_running.lock().await = true;
                            self.update_stats(|stats| stats.is_running = true).await;
                            info!("monitoring running");
                        }
                        Some(MonitorCommand::Stop) => {
                            *self.is_running.lock().await = false;
                            // Snapshot the session counters before the reset clears them
                            self.publish_stats().await;
                            self.pipeline.reset();
                            self.update_stats(|stats| stats.is_running = false).await;
                            info!("monitoring stopped");
                        }
                        Some(MonitorCommand::Pause) => {
                            *self.is_running.lock().await = false;
                            self.update_stats(|stats| stats.is_running = false).await;
                            info!("monitoring paused");
                        }
                        Some(MonitorCommand::Reset) => {
                            self.pipeline.reset();
                            self.update_stats(|stats| stats.lock_state = LockState::Empty).await;
                            info!("pipeline reset");
                        }
                        None => {
                            info!("monitor command channel closed");
                            break;
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Push one frame through the pipeline and publish the refreshed estimate.
    async fn ingest_frame(&mut self, sample: RoiSample) {
        self.frames_ingested += 1;
        if sample.is_missing() {
            self.missing_frames += 1;
        }

        let estimate = self.pipeline.ingest(sample);
        let update = MonitorUpdate {
            estimate,
            fill_ratio: self.pipeline.fill_ratio(),
        };

        // Ignore if no receivers are subscribed
        let _ = self.update_sender.send(update);

        if self.frames_ingested % 30 == 0 {
            self.publish_stats().await;
        }
    }

    /// Copy the latest pipeline counters into the shared stats snapshot.
    async fn publish_stats(&self) {
        let pass_stats = self.pipeline.stats();
        let lock_state = self.pipeline.lock_state();
        let frames_ingested = self.frames_ingested;
        let missing_frames = self.missing_frames;

        self.update_stats(|stats| {
            stats.frames_ingested = frames_ingested;
            stats.missing_frames = missing_frames;
            stats.passes = pass_stats.passes;
            stats.unreliable_passes = pass_stats.unreliable_passes;
            stats.average_pass_us = pass_stats.average_pass_us();
            stats.lock_state = lock_state;
        })
        .await;
    }

    /// Update stats with a closure
    async fn update_stats<F>(&self, update_fn: F)
    where
        F: FnOnce(&mut MonitorStats),
    {
        let mut stats = self.stats.lock().await;
        update_fn(&mut stats);
    }

    /// Get current monitoring statistics
    pub async fn get_stats(&self) -> MonitorStats {
        self.stats.lock().await.clone()
    }

    /// Check if monitoring is running
    pub async fn is_running(&self) -> bool {
        *self.is_running.lock().await
    }
}

/// Helper function to start the monitor service in the background
pub fn start_monitor_service(
    frame_receiver: broadcast::Receiver<RoiSample>,
    config: PulseConfig,
) -> RppgResult<(
    broadcast::Receiver<MonitorUpdate>,
    mpsc::Sender<MonitorCommand>,
    Arc<Mutex<MonitorStats>>,
)> {
    let mut service = MonitorService::new(frame_receiver, config)?;

    let update_receiver = service.subscribe_updates();
    let command_sender = service.command_handle();
    let stats_handle = service.stats.clone();

    tokio::spawn(async move {
        if let Err(e) = service.run().await {
            warn!("monitor service error: {}", e);
        }
    });

    Ok((update_receiver, command_sender, stats_handle))
}
