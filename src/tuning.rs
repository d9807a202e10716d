//! Game balance and layout tuning
//!
//! Every number the director, combat engine and layout use lives here so the
//! policies stay testable. Hosts may load overrides from JSON; missing fields
//! fall back to the defaults below.

use serde::{Deserialize, Serialize};

/// Width/height pair in world units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub w: f32,
    pub h: f32,
}

impl Extent {
    pub const fn new(w: f32, h: f32) -> Self {
        Self { w, h }
    }

    /// Half extents as a vector (what the geometry code works with)
    pub fn half(&self) -> glam::Vec2 {
        glam::Vec2::new(self.w / 2.0, self.h / 2.0)
    }
}

/// Arena and office layout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutTuning {
    /// Starting arena size
    pub width: f32,
    pub height: f32,
    /// Starting desk grid
    pub desk_rows: u32,
    pub desk_cols: u32,
    /// Distance between desk grid cells (also the expansion step)
    pub desk_spacing: f32,
    /// Center of desk cell (0, 0)
    pub grid_origin: (f32, f32),
    /// Cell kept clear for the player's starting area
    pub start_clear_cell: Option<(u32, u32)>,
    /// Border wall thickness
    pub wall_thickness: f32,
    /// Recharge station positions
    pub stations: Vec<(f32, f32)>,
    /// No desk is placed closer than this to a station
    pub station_clearance: f32,
    pub desk_size: Extent,
    pub station_size: Extent,
    pub event_desk_size: Extent,
    /// Arena expansion starts after this wave
    pub expansion_after_wave: u32,
}

impl Default for LayoutTuning {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            desk_rows: 3,
            desk_cols: 4,
            desk_spacing: 200.0,
            grid_origin: (150.0, 120.0),
            start_clear_cell: Some((1, 1)),
            wall_thickness: 20.0,
            stations: vec![(350.0, 300.0), (550.0, 480.0)],
            station_clearance: 100.0,
            desk_size: Extent::new(96.0, 48.0),
            station_size: Extent::new(112.0, 72.0),
            event_desk_size: Extent::new(113.0, 68.0),
            expansion_after_wave: 10,
        }
    }
}

/// Player stats and weapon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub start: (f32, f32),
    pub size: Extent,
    pub max_health: f32,
    pub max_energy: f32,
    pub base_speed: f32,
    /// Energy regained per tick while recharging
    pub recharge_per_tick: f32,
    /// Health restored by a pickup
    pub pickup_heal: f32,
    pub invulnerability_ms: u32,
    /// Knockback velocity decay per tick
    pub knockback_decay: f32,
    pub shot_cost: f32,
    pub shot_cooldown_ms: u32,
    pub shot_speed: f32,
    pub shot_ttl_ms: u32,
    pub shot_size: Extent,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            start: (400.0, 300.0),
            size: Extent::new(62.0, 22.5),
            max_health: 100.0,
            max_energy: 100.0,
            base_speed: 120.0,
            recharge_per_tick: 0.8,
            pickup_heal: 30.0,
            invulnerability_ms: 800,
            knockback_decay: 0.85,
            shot_cost: 10.0,
            shot_cooldown_ms: 150,
            shot_speed: 400.0,
            shot_ttl_ms: 1000,
            shot_size: Extent::new(8.0, 8.0),
        }
    }
}

/// Adversaries and their contact damage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdversaryTuning {
    pub ground_size: Extent,
    pub ground_base_speed: f32,
    pub ground_speed_per_wave: f32,
    pub ground_damage: f32,
    pub ground_knockback: f32,
    pub ground_score: u64,
    /// Pursuers stop when this close to the player
    pub pursuit_stop_distance: f32,
    pub flying_size: Extent,
    pub flying_base_speed: f32,
    pub flying_speed_per_wave: f32,
    /// Lateral velocity is drawn from [-x, x]
    pub flying_lateral_speed: f32,
    pub flying_damage: f32,
    pub flying_knockback: f32,
    pub flying_score: u64,
    /// Distance outside the arena at which flyers enter
    pub flying_entry_offset: f32,
    /// Flyers further than this outside the arena are removed
    pub flying_cull_margin: f32,
    pub pickup_size: Extent,
}

impl Default for AdversaryTuning {
    fn default() -> Self {
        Self {
            ground_size: Extent::new(62.0, 90.0),
            ground_base_speed: 30.0,
            ground_speed_per_wave: 2.0,
            ground_damage: 15.0,
            ground_knockback: 200.0,
            ground_score: 10,
            pursuit_stop_distance: 4.0,
            flying_size: Extent::new(24.0, 24.0),
            flying_base_speed: 500.0,
            flying_speed_per_wave: 5.0,
            flying_lateral_speed: 100.0,
            flying_damage: 25.0,
            flying_knockback: 300.0,
            flying_score: 20,
            flying_entry_offset: 50.0,
            flying_cull_margin: 100.0,
            pickup_size: Extent::new(12.0, 12.0),
        }
    }
}

/// Wave pacing and events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorTuning {
    pub base_per_wave: u32,
    pub spawn_min_distance: f32,
    pub spawn_max_attempts: u32,
    /// Adversaries spawn this far inside the arena edges
    pub spawn_margin: f32,
    /// Pickups spawn this far inside the arena edges
    pub pickup_margin: f32,
    pub next_wave_delay_ms: u32,
    pub settle_delay_ms: u32,
    pub wave_pickup_chance: f64,
    pub special_min_wave: u32,
    pub special_delay_min_ms: u32,
    pub special_delay_max_ms: u32,
    pub special_duration_ms: u32,
    /// Rush every N waves starting at wave N
    pub rush_every: u32,
    pub rush_base_count: i64,
    pub rush_pivot_wave: i64,
    pub rush_count_per_wave: i64,
    pub rush_window_ms: u32,
    pub rush_grace_ms: u32,
    pub rush_pickup_chance: f64,
    pub rush_resume_delay_ms: u32,
}

impl Default for DirectorTuning {
    fn default() -> Self {
        Self {
            base_per_wave: 3,
            spawn_min_distance: 150.0,
            spawn_max_attempts: 10,
            spawn_margin: 100.0,
            pickup_margin: 150.0,
            next_wave_delay_ms: 1500,
            settle_delay_ms: 100,
            wave_pickup_chance: 0.4,
            special_min_wave: 3,
            special_delay_min_ms: 25_000,
            special_delay_max_ms: 35_000,
            special_duration_ms: 30_000,
            rush_every: 5,
            rush_base_count: 20,
            rush_pivot_wave: 10,
            rush_count_per_wave: 2,
            rush_window_ms: 15_000,
            rush_grace_ms: 5_000,
            rush_pickup_chance: 0.6,
            rush_resume_delay_ms: 2_000,
        }
    }
}

/// Complete tuning set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub layout: LayoutTuning,
    pub player: PlayerTuning,
    pub adversaries: AdversaryTuning,
    pub director: DirectorTuning,
}

impl Tuning {
    /// Parse tuning overrides from JSON
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Load tuning from a file, falling back to defaults
    pub fn load(path: &std::path::Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(tuning) => {
                    log::info!("Loaded tuning from {}", path.display());
                    tuning
                }
                Err(e) => {
                    log::warn!("Invalid tuning in {}: {} - using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Cannot read {}: {} - using defaults", path.display(), e);
                Self::default()
            }
        }
    }
}
