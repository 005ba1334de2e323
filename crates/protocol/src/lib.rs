//! Boundary types shared across the repo-atlas pipeline.
//!
//! Everything here is a plain data shape: the records handed in by a
//! repository-access collaborator, the commit aggregates consumed by the
//! heat scorer, and the command/tick messages exchanged with the layout
//! worker. Transport, caching and auth for these shapes live elsewhere.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::{Add, AddAssign, Mul, Sub};

pub const PROTOCOL_SCHEMA_VERSION: u32 = 1;

/// One file of a repository snapshot.
///
/// `path` is repository-relative with `/` separators; it doubles as the
/// node identity in the graph, stable across rebuilds.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FileRecord {
    pub path: String,
    pub content: String,
    pub size: u64,
    /// Unix seconds.
    pub last_modified: i64,
}

/// One commit touching a file, as reported by the history collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CommitRecord {
    pub message: String,
    /// Unix seconds.
    pub timestamp: i64,
    pub author: String,
}

/// Per-file commit-history aggregates, the heat scorer's input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CommitAggregates {
    pub commit_count: u64,
    pub bug_fix_count: u64,
    /// Commits inside the recency window (30 days by default).
    pub recent_commits: u64,
    pub contributor_count: u64,
}

impl CommitAggregates {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commit_count == 0
    }
}

/// 3-component vector used for simulation positions and velocities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[must_use]
    pub fn length_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    #[must_use]
    pub fn length(&self) -> f64 {
        self.length_squared().sqrt()
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    #[must_use]
    pub const fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    #[must_use]
    pub const fn from_array([x, y, z]: [f64; 3]) -> Self {
        Self { x, y, z }
    }
}

impl Add for Vec3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// Node payload handed to the layout worker.
///
/// The worker keeps its own copy of this data for the simulation's
/// duration; authoritative positions flow back only through
/// [`LayoutEvent::Tick`].
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LayoutNode {
    pub id: String,
    pub position: Vec3,
    /// Pinned nodes are excluded from integration but still exert forces.
    #[serde(default)]
    pub fixed: bool,
}

/// Edge payload handed to the layout worker.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LayoutEdge {
    pub source: String,
    pub target: String,
    /// Spring weight in `(0, 1]`.
    pub strength: f64,
}

/// Commands accepted by the layout worker.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LayoutCommand {
    Start {
        nodes: Vec<LayoutNode>,
        edges: Vec<LayoutEdge>,
    },
    Stop,
}

/// Messages emitted by the layout worker.
///
/// Ticks are delivered in production order. After a `Stop` command the
/// consumer may still observe at most one already-queued tick.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LayoutEvent {
    Tick {
        /// Node id -> `[x, y, z]`.
        positions: BTreeMap<String, [f64; 3]>,
        alpha: f64,
        iteration: u64,
    },
    Converged {
        iterations: u64,
    },
    Diverged {
        detail: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn vec3_arithmetic() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(0.5, -1.0, 2.0);
        assert_eq!(a + b, Vec3::new(1.5, 1.0, 5.0));
        assert_eq!(a - b, Vec3::new(0.5, 3.0, 1.0));
        assert_eq!(a * 2.0, Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(Vec3::new(3.0, 4.0, 0.0).length(), 5.0);
    }

    #[test]
    fn vec3_detects_non_finite_components() {
        assert!(Vec3::new(1.0, 2.0, 3.0).is_finite());
        assert!(!Vec3::new(f64::NAN, 0.0, 0.0).is_finite());
        assert!(!Vec3::new(0.0, f64::INFINITY, 0.0).is_finite());
    }

    #[test]
    fn layout_command_wire_format() {
        let cmd = LayoutCommand::Stop;
        let raw = serde_json::to_value(&cmd).unwrap();
        assert_eq!(raw["type"], "STOP");

        let start = LayoutCommand::Start {
            nodes: vec![LayoutNode {
                id: "src/main.ts".to_string(),
                position: Vec3::ZERO,
                fixed: false,
            }],
            edges: vec![],
        };
        let raw = serde_json::to_value(&start).unwrap();
        assert_eq!(raw["type"], "START");
        assert_eq!(raw["nodes"][0]["id"], "src/main.ts");
    }

    #[test]
    fn tick_positions_serialize_as_arrays() {
        let mut positions = BTreeMap::new();
        positions.insert("a.ts".to_string(), [1.0, 2.0, 3.0]);
        let tick = LayoutEvent::Tick {
            positions,
            alpha: 0.7,
            iteration: 3,
        };
        let raw = serde_json::to_value(&tick).unwrap();
        assert_eq!(raw["type"], "TICK");
        assert_eq!(raw["positions"]["a.ts"], serde_json::json!([1.0, 2.0, 3.0]));
    }
}
