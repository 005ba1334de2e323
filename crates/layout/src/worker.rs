//! Dedicated layout worker: a tokio task owning the simulation behind a
//! command channel in and a tick channel out.
//!
//! Ordering contract: ticks are delivered in production order; `Stop`
//! prevents scheduling of the next iteration but never interrupts a tick
//! in progress, so the consumer may observe at most one already-queued
//! tick after stopping. The worker owns its copy of the node/edge data -
//! positions flow back only through [`LayoutEvent::Tick`] messages.

use crate::config::LayoutConfig;
use crate::error::{LayoutError, Result};
use crate::simulation::Simulation;
use atlas_protocol::{LayoutCommand, LayoutEdge, LayoutEvent, LayoutNode};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

/// Tick channel capacity. Small on purpose: backpressure bounds how far
/// the simulation runs ahead of a slow consumer, which is what keeps the
/// at-most-one-stale-tick guarantee after `Stop`.
const EVENT_CHANNEL_CAPACITY: usize = 1;
const COMMAND_CHANNEL_CAPACITY: usize = 16;

/// Handle to a running layout worker.
#[derive(Debug, Clone)]
pub struct LayoutWorker {
    command_tx: mpsc::Sender<LayoutCommand>,
}

impl LayoutWorker {
    /// Spawn the worker task. Returns the command handle and the event
    /// stream; dropping the receiver shuts the worker down.
    pub fn spawn(config: LayoutConfig) -> Result<(Self, mpsc::Receiver<LayoutEvent>)> {
        config.validate().map_err(LayoutError::InvalidConfig)?;

        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        tokio::spawn(run_worker(config, command_rx, event_tx));

        Ok((Self { command_tx }, event_rx))
    }

    /// Begin (or restart) a simulation over the given snapshot.
    pub async fn start(&self, nodes: Vec<LayoutNode>, edges: Vec<LayoutEdge>) -> Result<()> {
        self.command_tx
            .send(LayoutCommand::Start { nodes, edges })
            .await
            .map_err(|_| LayoutError::WorkerClosed)
    }

    /// Request cooperative cancellation of the current run.
    pub async fn stop(&self) -> Result<()> {
        self.command_tx
            .send(LayoutCommand::Stop)
            .await
            .map_err(|_| LayoutError::WorkerClosed)
    }
}

enum Delivery {
    Sent,
    Superseded(Option<Simulation>),
    Closed,
}

async fn run_worker(
    config: LayoutConfig,
    mut command_rx: mpsc::Receiver<LayoutCommand>,
    event_tx: mpsc::Sender<LayoutEvent>,
) {
    let mut sim: Option<Simulation> = None;

    loop {
        // Idle: block until the next command.
        if sim.is_none() {
            match command_rx.recv().await {
                Some(LayoutCommand::Start { nodes, edges }) => {
                    sim = Some(Simulation::new(nodes, edges, config.clone()));
                }
                Some(LayoutCommand::Stop) => {}
                None => return,
            }
            continue;
        }

        // Running: commands win between ticks (cooperative cancellation).
        match command_rx.try_recv() {
            Ok(LayoutCommand::Stop) => {
                log::debug!("layout run stopped by command");
                sim = None;
                continue;
            }
            Ok(LayoutCommand::Start { nodes, edges }) => {
                sim = Some(Simulation::new(nodes, edges, config.clone()));
                continue;
            }
            Err(TryRecvError::Disconnected) => return,
            Err(TryRecvError::Empty) => {}
        }

        let Some(simulation) = sim.as_mut() else {
            continue;
        };

        match simulation.tick() {
            Ok(()) => {
                let iteration = simulation.iteration();
                let converged = simulation.converged();
                let mut outbox: Vec<LayoutEvent> = Vec::with_capacity(2);
                if iteration % config.tick_stride == 0 || converged {
                    outbox.push(LayoutEvent::Tick {
                        positions: simulation.positions(),
                        alpha: simulation.alpha(),
                        iteration,
                    });
                }
                if converged {
                    log::debug!("layout converged after {iteration} iterations");
                    outbox.push(LayoutEvent::Converged { iterations: iteration });
                }

                for event in outbox {
                    match deliver(event, &event_tx, &mut command_rx, &config).await {
                        Delivery::Sent => {}
                        Delivery::Superseded(next) => {
                            sim = next;
                            break;
                        }
                        Delivery::Closed => return,
                    }
                }
                if sim.as_ref().is_some_and(Simulation::converged) {
                    sim = None;
                }
            }
            Err(err) => {
                log::error!("layout simulation halted: {err}");
                let event = LayoutEvent::Diverged {
                    detail: err.to_string(),
                };
                match deliver(event, &event_tx, &mut command_rx, &config).await {
                    Delivery::Sent | Delivery::Superseded(None) => {}
                    Delivery::Superseded(next @ Some(_)) => {
                        sim = next;
                        continue;
                    }
                    Delivery::Closed => return,
                }
                sim = None;
            }
        }

        // Let other tasks run between ticks even when nothing awaited.
        tokio::task::yield_now().await;
    }
}

/// Send one event without losing responsiveness to commands: if a `Stop`
/// or `Start` arrives while the tick channel is full, the pending event
/// is dropped and the command takes effect.
async fn deliver(
    event: LayoutEvent,
    event_tx: &mpsc::Sender<LayoutEvent>,
    command_rx: &mut mpsc::Receiver<LayoutCommand>,
    config: &LayoutConfig,
) -> Delivery {
    tokio::select! {
        permit = event_tx.reserve() => match permit {
            Ok(permit) => {
                permit.send(event);
                Delivery::Sent
            }
            Err(_) => Delivery::Closed,
        },
        command = command_rx.recv() => match command {
            Some(LayoutCommand::Stop) => Delivery::Superseded(None),
            Some(LayoutCommand::Start { nodes, edges }) => Delivery::Superseded(Some(
                Simulation::new(nodes, edges, config.clone()),
            )),
            None => Delivery::Closed,
        },
    }
}
