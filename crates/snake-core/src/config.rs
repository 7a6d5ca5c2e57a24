//! Simulation-wide tunable constants (spec §6's bootstrap constants table).

/// Game configuration constants. All fields are simulation parameters, not
/// process-level settings (bind address, port, etc. live in the server
/// binary's own config, since they have no bearing on tick determinism).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameConfig {
    pub tick_ms: u64,
    pub default_w: f32,
    /// Mass cost of a split, and the initial mass of the split-off snake.
    pub k_10: f32,
    pub boost_accel: f32,
    pub boost_spend_per_8_ticks: f32,
    pub max_direction_angle: f32,
    pub r_k1: f32,
    pub r_k2: f32,
    pub r_k3: f32,
    pub l_k4: f32,
    pub l_k5: f32,
    pub base_speed: f32,
    pub base_boost_speed: f32,
    pub max_speed_mult: f32,
    pub min_speed_mult: f32,
    /// Standard deviation of the normal distribution food coordinates are
    /// sampled from (centered at the arena origin).
    pub food_coord_stddev: f32,
    pub max_connections_per_player: u32,
    /// Multiplier applied to a viewing snake's radius to get its visibility
    /// radius (spec §4.G).
    pub visibility_radius_mult: f32,
    pub target_food_count: usize,
    /// Size, in bytes, of a [`crate::arena::SnapshotArena`] chunk. Not part
    /// of spec.md's constants table (it is a performance knob of component
    /// A, not a simulation parameter) but lives here for single-source
    /// bootstrap wiring.
    pub arena_chunk_size: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_ms: 75,
            default_w: 20.0,
            k_10: 1000.0,
            boost_accel: 0.1,
            boost_spend_per_8_ticks: 0.01,
            max_direction_angle: std::f32::consts::PI / 8.0,
            r_k1: 1.0 / 20f32.ln(),
            r_k2: 1.0,
            r_k3: 10.0,
            l_k4: 0.5,
            l_k5: 0.0,
            base_speed: 0.6,
            base_boost_speed: 1.3,
            max_speed_mult: 0.3,
            min_speed_mult: 0.2,
            food_coord_stddev: 100.0,
            max_connections_per_player: 5,
            visibility_radius_mult: 100.0,
            target_food_count: 150,
            arena_chunk_size: 64 * 1024,
        }
    }
}

impl GameConfig {
    /// `r = r_k1 * log(r_k2*w + r_k3)` — spec §3.
    pub fn radius_for_mass(&self, w: f32) -> f32 {
        self.r_k1 * (self.r_k2 * w + self.r_k3).ln()
    }

    /// `len = l_k4*w/r^2 + l_k5`, rounded to the nearest whole skeleton
    /// point count (spec §3 and scenario A's `round(0.5*w/r^2)`).
    pub fn skeleton_len_for(&self, w: f32, r: f32) -> usize {
        let len = self.l_k4 * w / (r * r) + self.l_k5;
        len.round().max(2.0) as usize
    }

    pub fn tick_duration(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.tick_ms)
    }

    pub fn tick_seconds(&self) -> f32 {
        self.tick_ms as f32 / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_radius_matches_formula() {
        let cfg = GameConfig::default();
        let r = cfg.radius_for_mass(cfg.default_w);
        let expected = (1.0 / 20f32.ln()) * (20f32 + 10.0).ln();
        assert!((r - expected).abs() < 1e-5);
    }

    #[test]
    fn skeleton_len_never_below_two() {
        let cfg = GameConfig::default();
        assert!(cfg.skeleton_len_for(0.0, 1.0) >= 2);
    }
}
