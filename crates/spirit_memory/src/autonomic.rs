//! Autonomic loop - the Spirit's heartbeat between rituals
//!
//! Sleeps a jittered interval, then pulses the Spirit with the simulated
//! hours that passed. A shutdown signal interrupts the sleep; the loop
//! flushes every subsystem before the task completes.

use spirit_core::{RandomSource, SystemRandom};
use spirit_limbic::HeartbeatConfig;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::coordinator::Spirit;

/// Spawn the background pulse task. Send `true` on `shutdown` (or drop the
/// sender) to stop it.
pub fn spawn_autonomic(
    spirit: Arc<Spirit>,
    heartbeat: HeartbeatConfig,
    shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    spawn_autonomic_with(spirit, heartbeat, shutdown, Box::new(SystemRandom::new()))
}

/// As [`spawn_autonomic`], with the jitter drawn from `jitter`.
pub fn spawn_autonomic_with(
    spirit: Arc<Spirit>,
    heartbeat: HeartbeatConfig,
    mut shutdown: watch::Receiver<bool>,
    mut jitter: Box<dyn RandomSource>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut last_tick = Instant::now();
        tracing::info!(
            "Autonomic loop started (interval {:?}, jitter {:.0}%)",
            heartbeat.interval,
            heartbeat.jitter * 100.0
        );

        loop {
            if *shutdown.borrow() {
                break;
            }
            let delay = heartbeat.next_delay(jitter.uniform());

            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    let now = Instant::now();
                    let hours = heartbeat.simulated_hours(now.duration_since(last_tick));
                    last_tick = now;
                    spirit.pulse(hours).await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        tracing::info!("Autonomic loop: shutdown sender dropped");
                        break;
                    }
                }
            }
        }

        spirit.flush().await;
        tracing::info!("Autonomic loop stopped, final state flushed");
    })
}
