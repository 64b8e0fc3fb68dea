//! Real-time ROI sample streaming for live monitoring

use std::sync::Arc;

use rppg_core::{RoiSample, RppgResult};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::time::{interval, Duration};
use tracing::{error, info, warn};

use crate::pulse_simulator::{PulseSimConfig, PulseSimulator};
use crate::scenarios::PulseScenario;

/// Configuration for real-time streaming
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Simulation configuration (frame rate comes from `sampling_rate`)
    pub sim: PulseSimConfig,
    /// Scripted subject behavior
    pub scenario: PulseScenario,
    /// Broadcast channel capacity in frames
    pub channel_capacity: usize,
}

impl StreamConfig {
    /// Stream a scenario with its matching noise profile and starting rate.
    pub fn for_scenario(scenario: PulseScenario) -> Self {
        let mut sim = PulseSimConfig::default();
        sim.noise = scenario.noise_profile();
        sim.heart_rate_bpm = scenario.heart_rate_at(0.0);

        Self {
            sim,
            scenario,
            channel_capacity: 256,
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self::for_scenario(PulseScenario::SteadyRest)
    }
}

/// Commands for controlling the stream
#[derive(Debug, Clone)]
pub enum StreamCommand {
    Start,
    Stop,
    Pause,
    Resume,
    UpdateScenario(PulseScenario),
    ResetTime,
}

/// Stream statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamStats {
    pub is_running: bool,
    pub frames_emitted: u64,
    pub missing_frames: u64,
    pub stream_seconds: f32,
}

/// Real-time ROI sample stream
///
/// Emits one [`RoiSample`] per frame interval over a broadcast channel,
/// following the configured scenario's heart rate and presence script.
pub struct RoiSampleStream {
    config: StreamConfig,
    simulator: PulseSimulator,
    frame_sender: broadcast::Sender<RoiSample>,
    command_receiver: mpsc::Receiver<StreamCommand>,
    command_sender: mpsc::Sender<StreamCommand>,
    is_running: Arc<Mutex<bool>>,
    stats: Arc<Mutex<StreamStats>>,
}

impl RoiSampleStream {
    /// Create new stream; validates the simulation configuration.
    pub fn new(config: StreamConfig) -> RppgResult<Self> {
        let simulator = PulseSimulator::new(config.sim.clone())?;
        let (frame_sender, _) = broadcast::channel(config.channel_capacity.max(1));
        let (command_sender, command_receiver) = mpsc::channel(32);

        Ok(RoiSampleStream {
            config,
            simulator,
            frame_sender,
            command_receiver,
            command_sender,
            is_running: Arc::new(Mutex::new(false)),
            stats: Arc::new(Mutex::new(StreamStats::default())),
        })
    }

    /// Get a receiver for emitted frames
    pub fn subscribe(&self) -> broadcast::Receiver<RoiSample> {
        self.frame_sender.subscribe()
    }

    /// Get control sender for sending commands
    pub fn command_handle(&self) -> mpsc::Sender<StreamCommand> {
        self.command_sender.clone()
    }

    /// Main streaming loop
    pub async fn run(&mut self) -> RppgResult<()> {
        let dt = 1.0 / self.config.sim.sampling_rate;
        let mut ticker = interval(Duration::from_secs_f32(dt));
        let mut session_time = 0.0f32;

        info!(
            scenario = %self.config.scenario,
            fps = self.config.sim.sampling_rate,
            "ROI stream ready"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let is_running = *self.is_running.lock().await;
                    if is_running {
                        let scenario = self.config.scenario;
                        self.simulator.set_heart_rate(scenario.heart_rate_at(session_time));
                        let value = self.simulator.next_sample();

                        let sample = if scenario.presence_at(session_time) {
                            RoiSample::Intensity(value)
                        } else {
                            RoiSample::Missing
                        };

                        {
                            let mut stats = self.stats.lock().await;
                            stats.frames_emitted += 1;
                            if sample.is_missing() {
                                stats.missing_frames += 1;
                            }
                            stats.stream_seconds = session_time;
                        }

                        // Ignore if no receivers are subscribed
                        let _ = self.frame_sender.send(sample);
                        session_time += dt;
                    }
                }

                command = self.command_receiver.recv() => {
                    match command {
                        Some(StreamCommand::Start) | Some(StreamCommand::Resume) => {
                            *self.is_running.lock().await = true;
                            self.stats.lock().await.is_running = true;
                            info!("ROI stream running");
                        }
                        Some(StreamCommand::Stop) => {
                            *self.is_running.lock().await = false;
                            self.simulator.reset_time();
                            session_time = 0.0;
                            let mut stats = self.stats.lock().await;
                            *stats = StreamStats::default();
                            info!("ROI stream stopped");
                        }
                        Some(StreamCommand::Pause) => {
                            *self.is_running.lock().await = false;
                            self.stats.lock().await.is_running = false;
                            info!("ROI stream paused");
                        }
                        Some(StreamCommand::UpdateScenario(scenario)) => {
                            let mut sim_config = self.simulator.config().clone();
                            sim_config.noise = scenario.noise_profile();
                            if let Err(e) = self.simulator.update_config(sim_config) {
                                warn!("scenario update rejected: {}", e);
                            } else {
                                self.config.scenario = scenario;
                                info!(scenario = %scenario, "scenario updated");
                            }
                        }
                        Some(StreamCommand::ResetTime) => {
                            self.simulator.reset_time();
                            session_time = 0.0;
                            info!("stream time reset");
                        }
                        None => {
                            info!("stream control channel closed");
                            break;
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Get current stream statistics
    pub async fn stats(&self) -> StreamStats {
        self.stats.lock().await.clone()
    }

    /// Check if stream is running
    pub async fn is_running(&self) -> bool {
        *self.is_running.lock().await
    }

    /// Get current configuration
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }
}

/// Helper function to create and start a stream in the background
pub async fn start_roi_stream(
    config: StreamConfig,
) -> RppgResult<(
    broadcast::Receiver<RoiSample>,
    mpsc::Sender<StreamCommand>,
    Arc<Mutex<StreamStats>>,
)> {
    let mut stream = RoiSampleStream::new(config)?;
    let frame_receiver = stream.subscribe();
    let command_sender = stream.command_handle();
    let stats_handle = stream.stats.clone();

    tokio::spawn(async move {
        if let Err(e) = stream.run().await {
            error!("ROI stream error: {}", e);
        }
    });

    Ok((frame_receiver, command_sender, stats_handle))
}
