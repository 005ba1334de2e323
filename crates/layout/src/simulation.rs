use crate::config::LayoutConfig;
use crate::error::{LayoutError, Result};
use atlas_protocol::{LayoutEdge, LayoutNode, Vec3};
use std::collections::{BTreeMap, HashMap};

/// Distances below this are treated as coincident and jitter-separated.
const MIN_DISTANCE: f64 = 1e-3;

/// Golden angle, used for deterministic seeding and jitter.
const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

#[derive(Debug, Clone)]
struct SimNode {
    id: String,
    position: Vec3,
    velocity: Vec3,
    fixed: bool,
}

#[derive(Debug, Clone, Copy)]
struct SimEdge {
    source: usize,
    target: usize,
    strength: f64,
}

/// The force simulation over one graph snapshot.
///
/// Owns its copy of the node/edge data; nothing here aliases the graph
/// aggregate. Single-threaded: one `tick` mutates all node state, and
/// the caller decides when ticks happen.
#[derive(Debug, Clone)]
pub struct Simulation {
    config: LayoutConfig,
    nodes: Vec<SimNode>,
    edges: Vec<SimEdge>,
    forces: Vec<Vec3>,
    alpha: f64,
    iteration: u64,
}

impl Simulation {
    /// Build a simulation from worker payloads.
    ///
    /// Unfixed nodes sitting exactly at the origin (the unseeded state of
    /// a fresh graph) get deterministic golden-spiral start positions, so
    /// identical inputs always produce identical layouts. Edges naming
    /// unknown ids are dropped.
    #[must_use]
    pub fn new(nodes: Vec<LayoutNode>, edges: Vec<LayoutEdge>, config: LayoutConfig) -> Self {
        let mut by_id: HashMap<String, usize> = HashMap::with_capacity(nodes.len());
        let sim_nodes: Vec<SimNode> = nodes
            .into_iter()
            .enumerate()
            .map(|(index, node)| {
                by_id.insert(node.id.clone(), index);
                let position = if node.position == Vec3::ZERO && !node.fixed {
                    seed_position(index)
                } else {
                    node.position
                };
                SimNode {
                    id: node.id,
                    position,
                    velocity: Vec3::ZERO,
                    fixed: node.fixed,
                }
            })
            .collect();

        let sim_edges = edges
            .into_iter()
            .filter_map(|edge| {
                let source = by_id.get(&edge.source).copied();
                let target = by_id.get(&edge.target).copied();
                match (source, target) {
                    (Some(source), Some(target)) => Some(SimEdge {
                        source,
                        target,
                        strength: edge.strength,
                    }),
                    _ => {
                        log::debug!(
                            "dropping layout edge {} -> {}: unknown endpoint",
                            edge.source,
                            edge.target
                        );
                        None
                    }
                }
            })
            .collect();

        let forces = vec![Vec3::ZERO; sim_nodes.len()];
        Self {
            alpha: config.alpha_initial,
            config,
            nodes: sim_nodes,
            edges: sim_edges,
            forces,
            iteration: 0,
        }
    }

    #[must_use]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    #[must_use]
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    #[must_use]
    pub fn converged(&self) -> bool {
        self.alpha < self.config.alpha_min || self.iteration >= self.config.max_ticks
    }

    /// Zero velocities and restore the initial alpha, keeping node
    /// identity and positions. A restarted run from here behaves exactly
    /// like a fresh engine handed the current positions.
    pub fn reset(&mut self) {
        for node in &mut self.nodes {
            node.velocity = Vec3::ZERO;
        }
        self.alpha = self.config.alpha_initial;
        self.iteration = 0;
    }

    /// Advance the simulation one step.
    ///
    /// Detects non-finite state immediately after integration and halts
    /// with [`LayoutError::SimulationDiverged`] instead of letting NaNs
    /// propagate into rendered frames.
    pub fn tick(&mut self) -> Result<()> {
        self.accumulate_forces();

        self.iteration += 1;
        for (index, node) in self.nodes.iter_mut().enumerate() {
            if node.fixed {
                node.velocity = Vec3::ZERO;
                continue;
            }
            node.velocity = (node.velocity + self.forces[index] * self.alpha) * self.config.damping;
            node.position += node.velocity;

            if !node.position.is_finite() || !node.velocity.is_finite() {
                return Err(LayoutError::SimulationDiverged {
                    node: node.id.clone(),
                    iteration: self.iteration,
                });
            }
        }

        self.alpha *= 1.0 - self.config.alpha_decay;
        Ok(())
    }

    /// Current position snapshot, id -> `[x, y, z]`.
    #[must_use]
    pub fn positions(&self) -> BTreeMap<String, [f64; 3]> {
        self.nodes
            .iter()
            .map(|node| (node.id.clone(), node.position.to_array()))
            .collect()
    }

    /// Velocity magnitudes, for convergence checks and tests.
    #[must_use]
    pub fn velocity_magnitudes(&self) -> Vec<f64> {
        self.nodes.iter().map(|node| node.velocity.length()).collect()
    }

    fn accumulate_forces(&mut self) {
        for force in &mut self.forces {
            *force = Vec3::ZERO;
        }

        // All-pairs charge repulsion. Quadratic, which is fine at the
        // node counts a repository snapshot produces; spatial partitioning
        // stays an optional optimization.
        for i in 0..self.nodes.len() {
            for j in (i + 1)..self.nodes.len() {
                let mut delta = self.nodes[j].position - self.nodes[i].position;
                if delta.length_squared() < MIN_DISTANCE * MIN_DISTANCE {
                    delta = jitter(i, j);
                }
                let distance = delta.length();
                // Magnitude saturates below unit separation so jittered
                // near-coincident pairs separate without exploding.
                let magnitude =
                    self.config.repulsion_strength / delta.length_squared().max(1.0);
                let push = delta * (magnitude / distance);
                self.forces[i] += push * -1.0;
                self.forces[j] += push;
            }
        }

        // Spring attraction along edges toward the rest distance.
        for edge in &self.edges {
            if edge.source == edge.target {
                continue;
            }
            let mut delta = self.nodes[edge.target].position - self.nodes[edge.source].position;
            if delta.length_squared() < MIN_DISTANCE * MIN_DISTANCE {
                delta = jitter(edge.source, edge.target);
            }
            let distance = delta.length();
            let displacement = distance - self.config.link_distance;
            let magnitude = self.config.spring_strength * edge.strength * displacement;
            let pull = delta * (magnitude / distance);
            self.forces[edge.source] += pull;
            self.forces[edge.target] += pull * -1.0;
        }

        // Centering force, keeps the system from drifting away.
        for (index, node) in self.nodes.iter().enumerate() {
            self.forces[index] += node.position * -self.config.centering_strength;
        }
    }
}

/// Deterministic non-zero offset for coincident node pairs.
fn jitter(i: usize, j: usize) -> Vec3 {
    #[allow(clippy::cast_precision_loss)]
    let seed = (i * 31 + j * 17 + 1) as f64;
    let theta = seed * GOLDEN_ANGLE;
    Vec3::new(
        theta.cos() * MIN_DISTANCE,
        theta.sin() * MIN_DISTANCE,
        (seed * 0.618_033_988_749_895).sin().mul_add(MIN_DISTANCE, MIN_DISTANCE * 0.1),
    )
}

/// Golden-spiral start position for node `index`.
fn seed_position(index: usize) -> Vec3 {
    #[allow(clippy::cast_precision_loss)]
    let i = index as f64;
    let radius = 10.0 * (i + 1.0).sqrt();
    let theta = i * GOLDEN_ANGLE;
    Vec3::new(
        radius * theta.cos(),
        radius * theta.sin(),
        (i * GOLDEN_ANGLE).sin() * 10.0,
    )
}
