use serde::{Deserialize, Serialize};

/// Tuning constants for the force simulation.
///
/// The defaults are the shipping policy values; consumers override
/// individual fields through the usual struct-update syntax or a
/// deserialized config section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Charge strength for the all-pairs repulsion, divided by squared
    /// distance.
    pub repulsion_strength: f64,

    /// Rest length of edge springs.
    pub link_distance: f64,

    /// Spring stiffness multiplier, scaled per edge by its strength.
    pub spring_strength: f64,

    /// Pull toward the origin, preventing unbounded drift.
    pub centering_strength: f64,

    /// Per-tick velocity retention factor in `(0, 1]`.
    pub damping: f64,

    /// Simulation temperature at start (and after `reset`).
    pub alpha_initial: f64,

    /// Convergence threshold: the run is done once alpha falls below.
    pub alpha_min: f64,

    /// Geometric decay rate applied to alpha every tick, in `(0, 1)`.
    pub alpha_decay: f64,

    /// Hard iteration cap for runs that never cool down.
    pub max_ticks: u64,

    /// Emit a position snapshot every Nth tick (1 = every tick).
    pub tick_stride: u64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            repulsion_strength: 30.0,
            link_distance: 30.0,
            spring_strength: 0.1,
            centering_strength: 0.05,
            damping: 0.6,
            alpha_initial: 1.0,
            alpha_min: 0.001,
            alpha_decay: 0.0228,
            max_ticks: 300,
            tick_stride: 1,
        }
    }
}

impl LayoutConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(self.damping > 0.0 && self.damping <= 1.0) {
            return Err(format!("damping ({}) must be in (0, 1]", self.damping));
        }
        if !(self.alpha_decay > 0.0 && self.alpha_decay < 1.0) {
            return Err(format!("alpha_decay ({}) must be in (0, 1)", self.alpha_decay));
        }
        if self.alpha_initial <= self.alpha_min {
            return Err(format!(
                "alpha_initial ({}) must exceed alpha_min ({})",
                self.alpha_initial, self.alpha_min
            ));
        }
        if self.link_distance <= 0.0 {
            return Err(format!("link_distance ({}) must be > 0", self.link_distance));
        }
        if self.max_ticks == 0 {
            return Err("max_ticks must be > 0".to_string());
        }
        if self.tick_stride == 0 {
            return Err("tick_stride must be > 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(LayoutConfig::default().validate().is_ok());
    }

    #[test]
    fn out_of_range_fields_are_rejected() {
        let mut config = LayoutConfig::default();
        config.damping = 0.0;
        assert!(config.validate().is_err());

        let mut config = LayoutConfig::default();
        config.alpha_decay = 1.0;
        assert!(config.validate().is_err());

        let mut config = LayoutConfig::default();
        config.tick_stride = 0;
        assert!(config.validate().is_err());

        let mut config = LayoutConfig::default();
        config.alpha_initial = 0.0005;
        assert!(config.validate().is_err());
    }
}
