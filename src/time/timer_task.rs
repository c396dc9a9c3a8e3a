/*!
 * Timer Task - Periodic Interrupt Source
 *
 * Background tokio task that drives a `TimeProvider` at a fixed interval,
 * standing in for the hardware timer. Each firing advances the clock by the
 * interval and raises the scheduler's timer interrupt.
 */

use super::provider::TimeProvider;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, trace, warn};

/// Control messages for the timer task
#[derive(Debug, Clone)]
pub enum TimerCommand {
    /// Change the tick interval (milliseconds)
    UpdateInterval(u64),
    /// Stop delivering ticks
    Pause,
    /// Resume delivering ticks
    Resume,
    /// Deliver an interrupt now without advancing the clock
    Trigger,
    /// Stop the task
    Shutdown,
}

/// Handle to the timer background task
pub struct TimerTask {
    command_tx: mpsc::UnboundedSender<TimerCommand>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl TimerTask {
    /// Spawn on the current tokio runtime, ticking every `interval_ms`
    pub fn spawn(provider: Arc<TimeProvider>, interval_ms: u64) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let interval_ms = interval_ms.max(1);

        let handle = tokio::spawn(async move {
            run_timer_loop(provider, interval_ms, command_rx).await;
        });

        info!("Timer task spawned ({}ms interval)", interval_ms);

        Self {
            command_tx,
            handle: Some(handle),
        }
    }

    pub fn update_interval(&self, interval_ms: u64) {
        let _ = self
            .command_tx
            .send(TimerCommand::UpdateInterval(interval_ms));
    }

    pub fn pause(&self) {
        let _ = self.command_tx.send(TimerCommand::Pause);
    }

    pub fn resume(&self) {
        let _ = self.command_tx.send(TimerCommand::Resume);
    }

    pub fn trigger(&self) {
        let _ = self.command_tx.send(TimerCommand::Trigger);
    }

    /// Stop the task and wait for it to finish
    pub async fn shutdown(mut self) {
        let _ = self.command_tx.send(TimerCommand::Shutdown);

        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!("Timer task shutdown error: {}", e);
            } else {
                info!("Timer task shutdown complete");
            }
        }
    }
}

fn new_interval(interval_ms: u64) -> tokio::time::Interval {
    let mut interval = tokio::time::interval(Duration::from_millis(interval_ms));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    interval
}

async fn run_timer_loop(
    provider: Arc<TimeProvider>,
    mut interval_ms: u64,
    mut command_rx: mpsc::UnboundedReceiver<TimerCommand>,
) {
    let mut active = true;
    let mut interval = new_interval(interval_ms);
    // The first tick of a tokio interval completes immediately
    interval.tick().await;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if active {
                    let now = provider.tick(interval_ms);
                    trace!("Timer tick at {}ms", now);
                }
            }

            command = command_rx.recv() => {
                match command {
                    Some(TimerCommand::UpdateInterval(new_interval_ms)) => {
                        interval_ms = new_interval_ms.max(1);
                        info!("Timer interval updated: {}ms", interval_ms);
                        interval = new_interval(interval_ms);
                        interval.tick().await;
                    }
                    Some(TimerCommand::Pause) => {
                        info!("Timer task paused");
                        active = false;
                    }
                    Some(TimerCommand::Resume) => {
                        info!("Timer task resumed");
                        active = true;
                    }
                    Some(TimerCommand::Trigger) => {
                        let now = provider.tick(0);
                        trace!("Manual timer trigger at {}ms", now);
                    }
                    Some(TimerCommand::Shutdown) | None => {
                        info!("Timer task shutting down");
                        break;
                    }
                }
            }
        }
    }
}

impl Drop for TimerTask {
    fn drop(&mut self) {
        if self.handle.is_some() {
            let _ = self.command_tx.send(TimerCommand::Shutdown);
        }
    }
}
