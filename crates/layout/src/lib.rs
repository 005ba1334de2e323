//! # Atlas Layout
//!
//! Iterative force-directed 3D embedding for the repository graph.
//!
//! The [`Simulation`] is the synchronous core: per tick it applies
//! pairwise charge repulsion, spring attraction along edges, a centering
//! pull toward the origin, then damped velocity/position integration
//! with a geometrically decaying `alpha` temperature. Pinned nodes exert
//! forces but never move.
//!
//! The [`worker`] module wraps the simulation in a dedicated tokio task
//! behind two one-way channels - commands in, tick snapshots out - so
//! the interactive side of a consumer never shares mutable state with
//! the running simulation.

mod config;
mod error;
mod simulation;
pub mod worker;

pub use config::LayoutConfig;
pub use error::{LayoutError, Result};
pub use simulation::Simulation;
pub use worker::LayoutWorker;
