//! Fixed-rate drivers for the two tick passes
//!
//! The fast task drains the command queue and runs a simulation step; the
//! slow task builds snapshots. Both lock the world for the whole pass, so a
//! pass never observes another one half-done. Outgoing packets are queued
//! before the lock is released. Snapshots go to a bounded channel with
//! `try_send` and are dropped when it is full. Every other packet goes to an
//! unbounded control channel and is never dropped while the sender lives.

use crate::commands::Command;
use crate::tick::{fast_tick, slow_tick, Outbound};
use crate::world::World;
use log::{debug, info};
use shared::Packet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

const STATS_EVERY_TICKS: u64 = 300;

/// The two queues the tick tasks write into.
#[derive(Clone)]
pub struct Outlets {
    /// `Init` and `PlayerDied`. Unbounded.
    pub control: mpsc::UnboundedSender<Outbound>,
    /// `GameState` snapshots. Bounded, lossy.
    pub snapshots: mpsc::Sender<Outbound>,
}

/// Handles to the two periodic tasks. Dropping the scheduler leaves them
/// running; call [`Scheduler::shutdown`] to stop them.
pub struct Scheduler {
    fast: JoinHandle<()>,
    slow: JoinHandle<()>,
}

impl Scheduler {
    pub fn start(
        world: Arc<Mutex<World>>,
        commands: mpsc::Receiver<Command>,
        outlets: Outlets,
        fast_period: Duration,
        slow_period: Duration,
    ) -> Self {
        let fast = tokio::spawn(run_fast_loop(
            Arc::clone(&world),
            commands,
            outlets.clone(),
            fast_period,
        ));
        let slow = tokio::spawn(run_slow_loop(world, outlets, slow_period));

        info!(
            "Scheduler started: simulation every {:?}, broadcast every {:?}",
            fast_period, slow_period
        );
        Self { fast, slow }
    }

    pub fn is_running(&self) -> bool {
        !self.fast.is_finished() && !self.slow.is_finished()
    }

    /// Cancels both tasks. A pass in progress finishes its current await
    /// point and never resumes, so the world lock is released.
    pub async fn shutdown(self) {
        self.fast.abort();
        self.slow.abort();
        let _ = self.fast.await;
        let _ = self.slow.await;
        info!("Scheduler stopped");
    }
}

async fn run_fast_loop(
    world: Arc<Mutex<World>>,
    mut commands: mpsc::Receiver<Command>,
    outlets: Outlets,
    period: Duration,
) {
    let mut timer = interval(period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        timer.tick().await;

        let mut pending = Vec::new();
        while let Ok(command) = commands.try_recv() {
            pending.push(command);
        }

        let mut world = world.lock().await;
        let messages = fast_tick(&mut world, pending);

        if world.tick % STATS_EVERY_TICKS == 0 {
            debug!(
                "Tick {}: {} agents ({} alive), {} resources",
                world.tick,
                world.agent_count(),
                world.alive_count(),
                world.resource_count()
            );
        }

        // Queued under the lock so a join's Init is ahead of its first snapshot.
        dispatch(&outlets, messages);
    }
}

async fn run_slow_loop(world: Arc<Mutex<World>>, outlets: Outlets, period: Duration) {
    let mut timer = interval(period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        timer.tick().await;

        let world = world.lock().await;
        let messages = slow_tick(&world);
        dispatch(&outlets, messages);
    }
}

/// Queues packets without waiting. Returns how many were dropped.
///
/// Only snapshots can be dropped for a full queue; control packets are lost
/// only once the sender side has shut down.
pub fn dispatch(outlets: &Outlets, messages: Vec<Outbound>) -> usize {
    let mut dropped = 0;
    for message in messages {
        if !matches!(message.packet, Packet::GameState { .. }) {
            if let Err(error) = outlets.control.send(message) {
                debug!("Control queue closed, dropping packet for {}", error.0.recipient);
                dropped += 1;
            }
            continue;
        }

        match outlets.snapshots.try_send(message) {
            Ok(()) => {}
            Err(TrySendError::Full(message)) => {
                debug!("Snapshot queue full, dropping packet for {}", message.recipient);
                dropped += 1;
            }
            Err(TrySendError::Closed(message)) => {
                debug!("Snapshot queue closed, dropping packet for {}", message.recipient);
                dropped += 1;
            }
        }
    }
    dropped
}
