//! Pseudo-3D racing engine.
//!
//! Modules:
//! - `track`: seed-driven procedural track generation
//! - `projection`: world → camera → screen perspective math
//! - `render`: headless frame renderer emitting draw commands
//! - `simulation`: fixed-timestep player/bot/lap simulation
//! - `clock`: tick sources and the fixed-timestep accumulator
//! - `sprites`: sprite sheet atlas
//! - `util`: shared math helpers

pub mod clock;
pub mod projection;
pub mod render;
pub mod simulation;
pub mod sprites;
pub mod track;
pub mod util;

pub use clock::{Clock, FixedTimestep, ManualClock, SystemClock};
pub use projection::{project, Projected, WorldPoint};
pub use render::{render_frame, DrawCmd, Frame};
pub use simulation::{Input, RemoteCar, Simulation};
pub use track::{build_track, Palette, Segment, Track, TrackBuilder};

use serde::{Deserialize, Serialize};

/// Tunable engine parameters shared by generation, simulation, and
/// rendering. All clients in a room must agree on these for the shared-seed
/// contract to hold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Simulation steps per second.
    pub fps: u32,
    /// Logical screen width in pixels.
    pub width: f64,
    /// Logical screen height in pixels.
    pub height: f64,
    /// Half road width in world units.
    pub road_width: f64,
    /// Length of one segment in world units.
    pub segment_length: f64,
    /// Segments per alternating color band.
    pub rumble_length: usize,
    /// Lane count for lane-marker rendering.
    pub lanes: u32,
    /// Horizontal field of view in degrees.
    pub field_of_view: f64,
    /// Camera height above the road.
    pub camera_height: f64,
    /// Segments drawn ahead of the camera.
    pub draw_distance: usize,
    /// Exponential fog density.
    pub fog_density: f64,
    /// Laps per race.
    pub max_laps: u32,
    /// Bot cars in single-player simulation.
    pub bot_count: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fps: 60,
            width: 1024.0,
            height: 768.0,
            road_width: 2000.0,
            segment_length: 200.0,
            rumble_length: 3,
            lanes: 3,
            field_of_view: 100.0,
            camera_height: 1000.0,
            draw_distance: 300,
            fog_density: 5.0,
            max_laps: 3,
            bot_count: 3,
        }
    }
}

impl EngineConfig {
    /// Projection plane distance derived from the field of view.
    pub fn camera_depth(&self) -> f64 {
        1.0 / (self.field_of_view / 2.0).to_radians().tan()
    }

    /// Camera-forward offset of the player along the track.
    pub fn player_z(&self) -> f64 {
        self.camera_height * self.camera_depth()
    }

    /// Vertical resolution factor relative to the 480px baseline.
    pub fn resolution(&self) -> f64 {
        self.height / 480.0
    }

    /// Top speed: one segment per simulation step.
    pub fn max_speed(&self) -> f64 {
        self.segment_length * self.fps as f64
    }

    /// Fixed simulation step in seconds.
    pub fn step(&self) -> f64 {
        1.0 / self.fps as f64
    }
}
