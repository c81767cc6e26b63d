//! Fixed-timestep race simulation.
//!
//! Each client runs its own simulation against the shared track; only
//! position snapshots cross the wire. The loop owns player kinematics,
//! off-road collision, lap timing, bot controllers, and the latest-wins
//! remote snapshot table.

use std::collections::HashMap;

use rand::Rng;
use tracing::debug;

use super::sprites::{self, SpriteId};
use super::track::Track;
use super::util;
use super::EngineConfig;

// Rates relative to top speed
const ACCEL_DIVISOR: f64 = 5.0;
const OFF_ROAD_DECEL_DIVISOR: f64 = 2.0;
const OFF_ROAD_SPEED_DIVISOR: f64 = 4.0;
const CENTRIFUGAL: f64 = 0.3;
const PLAYER_X_LIMIT: f64 = 3.0;
const BOT_X_LIMIT: f64 = 2.0;

const SKY_SPEED: f64 = 0.001;
const HILL_SPEED: f64 = 0.002;
const TREE_SPEED: f64 = 0.003;

/// Player input flags for one step.
#[derive(Debug, Clone, Copy, Default)]
pub struct Input {
    pub left: bool,
    pub right: bool,
    pub faster: bool,
    pub slower: bool,
}

/// A bot car advancing at its own fixed speed fraction.
#[derive(Debug, Clone)]
pub struct Bot {
    pub x: f64,
    pub z: f64,
    /// Fraction of top speed this bot holds, in 0.1..1.0.
    pub speed_factor: f64,
    pub sprite: SpriteId,
}

/// Latest known snapshot of a remote player.
#[derive(Debug, Clone)]
pub struct RemoteCar {
    pub x: f64,
    pub z: f64,
    pub speed: f64,
    /// Lap counter inferred from wraparound of received z values.
    pub lap: u32,
    pub sprite: Option<SpriteId>,
}

/// Outbound kinematic snapshot produced each step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionSample {
    pub x: f64,
    pub z: f64,
    pub speed: f64,
    pub lap_time: f64,
    pub rank: u32,
}

/// One client's race state.
#[derive(Debug)]
pub struct Simulation {
    config: EngineConfig,
    track: Track,

    position: f64,
    player_x: f64,
    speed: f64,

    current_lap_time: f64,
    last_lap_time: f64,
    fastest_lap_time: Option<f64>,
    current_lap: u32,
    finished: bool,

    sky_offset: f64,
    hill_offset: f64,
    tree_offset: f64,

    bots: Vec<Bot>,
    remotes: HashMap<String, RemoteCar>,
}

impl Simulation {
    pub fn new(track: Track, config: EngineConfig) -> Self {
        Self {
            config,
            track,
            position: 0.0,
            player_x: 0.0,
            speed: 0.0,
            current_lap_time: 0.0,
            last_lap_time: 0.0,
            fastest_lap_time: None,
            current_lap: 1,
            finished: false,
            sky_offset: 0.0,
            hill_offset: 0.0,
            tree_offset: 0.0,
            bots: Vec::new(),
            remotes: HashMap::new(),
        }
    }

    /// Populate bot cars with randomized lanes, speeds, and sprites.
    pub fn spawn_bots<R: Rng>(&mut self, rng: &mut R) {
        self.bots.clear();
        for _ in 0..self.config.bot_count {
            self.bots.push(Bot {
                x: (rng.gen::<f64>() * 2.0 - 1.0) * 0.5,
                z: 0.0,
                speed_factor: rng.gen::<f64>() * 0.9 + 0.1,
                sprite: sprites::CARS[rng.gen_range(0..sprites::CARS.len())],
            });
        }
    }

    /// Advance the simulation by one fixed step.
    pub fn step(&mut self, dt: f64, input: Input) {
        if self.finished {
            return;
        }

        let max_speed = self.config.max_speed();
        let player_segment = self.track.find_segment(self.position + self.config.player_z());
        let segment_curve = player_segment.curve;
        let segment_start_z = player_segment.p1.z;
        let collidables: Vec<(f64, f64)> = player_segment
            .sprites
            .iter()
            .map(|s| (s.offset, s.sprite.world_width()))
            .collect();

        let player_w = SpriteId::PlayerStraight.world_width();
        let speed_percent = self.speed / max_speed;
        let dx = dt * 2.0 * speed_percent;
        let start_position = self.position;

        self.position = util::increase(self.position, dt * self.speed, self.track.length());

        if input.left {
            self.player_x -= dx;
        } else if input.right {
            self.player_x += dx;
        }

        // Centrifugal pull toward the outside of the curve
        self.player_x -= dx * speed_percent * segment_curve * CENTRIFUGAL;

        let accel = max_speed / ACCEL_DIVISOR;
        let braking = -max_speed;
        let decel = -max_speed / ACCEL_DIVISOR;
        let off_road_decel = -max_speed / OFF_ROAD_DECEL_DIVISOR;
        let off_road_limit = max_speed / OFF_ROAD_SPEED_DIVISOR;

        if input.faster {
            self.speed = util::accelerate(self.speed, accel, dt);
        } else if input.slower {
            self.speed = util::accelerate(self.speed, braking, dt);
        } else {
            self.speed = util::accelerate(self.speed, decel, dt);
        }

        if self.player_x < -1.0 || self.player_x > 1.0 {
            if self.speed > off_road_limit {
                self.speed = util::accelerate(self.speed, off_road_decel, dt);
            }

            for (offset, sprite_w) in collidables {
                let hit_x = offset + (sprite_w / 2.0) * if offset > 0.0 { 1.0 } else { -1.0 };
                if util::overlap(self.player_x, player_w, hit_x, sprite_w, 1.0) {
                    self.speed = 0.0;
                    self.position = util::increase(
                        segment_start_z,
                        -self.config.player_z(),
                        self.track.length(),
                    );
                    break;
                }
            }
        }

        self.player_x = util::limit(self.player_x, -PLAYER_X_LIMIT, PLAYER_X_LIMIT);
        self.speed = util::limit(self.speed, 0.0, max_speed);

        self.update_bots(dt);

        // Background parallax tracks curvature and distance covered
        let travelled = (self.position - start_position) / self.config.segment_length;
        self.sky_offset =
            util::increase(self.sky_offset, SKY_SPEED * segment_curve * travelled, 1.0);
        self.hill_offset =
            util::increase(self.hill_offset, HILL_SPEED * segment_curve * travelled, 1.0);
        self.tree_offset =
            util::increase(self.tree_offset, TREE_SPEED * segment_curve * travelled, 1.0);

        // Lap timing: completing a lap means crossing the camera-forward
        // offset with a running timer
        if self.position > self.config.player_z() {
            if self.current_lap_time > 0.0 && start_position < self.config.player_z() {
                self.last_lap_time = self.current_lap_time;
                self.current_lap_time = 0.0;
                if self.fastest_lap_time.map_or(true, |t| self.last_lap_time < t) {
                    self.fastest_lap_time = Some(self.last_lap_time);
                }
                self.current_lap += 1;
                debug!(lap = self.current_lap, time = self.last_lap_time, "lap completed");

                if self.current_lap > self.config.max_laps {
                    self.finished = true;
                }
            } else {
                self.current_lap_time += dt;
            }
        }
    }

    fn update_bots(&mut self, dt: f64) {
        let max_speed = self.config.max_speed();
        let track_length = self.track.length();
        for bot in &mut self.bots {
            let curve = self.track.find_segment(bot.z).curve;
            let bot_speed = max_speed * bot.speed_factor;
            bot.z = util::increase(bot.z, dt * bot_speed, track_length);
            bot.x = util::limit(
                bot.x - dt * bot_speed * curve * CENTRIFUGAL / max_speed,
                -BOT_X_LIMIT,
                BOT_X_LIMIT,
            );
        }
    }

    /// Record the latest snapshot for a remote player, inferring lap count
    /// from z wraparound.
    pub fn update_remote(&mut self, player_id: &str, x: f64, z: f64, speed: f64) {
        // Start-line sync: a stationary peer near the origin is at the line
        let z = if speed == 0.0 && z.abs() < 0.1 { 0.0 } else { z };
        let half_track = self.track.length() / 2.0;

        match self.remotes.get_mut(player_id) {
            Some(remote) => {
                if z + half_track < remote.z {
                    remote.lap += 1;
                }
                remote.x = x;
                remote.z = z;
                remote.speed = speed;
            }
            None => {
                self.remotes.insert(
                    player_id.to_string(),
                    RemoteCar {
                        x,
                        z,
                        speed,
                        lap: 1,
                        sprite: None,
                    },
                );
            }
        }
    }

    pub fn remove_remote(&mut self, player_id: &str) {
        self.remotes.remove(player_id);
    }

    /// Race rank among the local player and all known remote snapshots:
    /// lap count first, then track-distance within the lap.
    pub fn rank(&self) -> u32 {
        let ahead = self
            .remotes
            .values()
            .filter(|r| {
                r.lap > self.current_lap || (r.lap == self.current_lap && r.z > self.position)
            })
            .count();
        ahead as u32 + 1
    }

    /// Snapshot for the wire, produced once per step.
    pub fn sample(&self) -> PositionSample {
        PositionSample {
            x: self.player_x,
            z: self.position,
            speed: self.speed,
            lap_time: self.current_lap_time,
            rank: self.rank(),
        }
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn player_x(&self) -> f64 {
        self.player_x
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn current_lap(&self) -> u32 {
        self.current_lap
    }

    pub fn current_lap_time(&self) -> f64 {
        self.current_lap_time
    }

    pub fn last_lap_time(&self) -> f64 {
        self.last_lap_time
    }

    pub fn fastest_lap_time(&self) -> Option<f64> {
        self.fastest_lap_time
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn bots(&self) -> &[Bot] {
        &self.bots
    }

    pub fn remotes(&self) -> &HashMap<String, RemoteCar> {
        &self.remotes
    }

    pub fn parallax(&self) -> (f64, f64, f64) {
        (self.sky_offset, self.hill_offset, self.tree_offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::track::build_track;

    fn sim() -> Simulation {
        let config = EngineConfig::default();
        let track = build_track(42, &config);
        Simulation::new(track, config)
    }

    #[test]
    fn coasting_decays_speed_to_zero_never_negative() {
        let mut s = sim();
        s.speed = 6000.0;
        let dt = s.config.step();
        let mut previous = s.speed;
        for _ in 0..600 {
            s.step(dt, Input::default());
            assert!(s.speed() <= previous);
            assert!(s.speed() >= 0.0);
            previous = s.speed();
        }
        assert_eq!(s.speed(), 0.0);
    }

    #[test]
    fn full_throttle_never_exceeds_max_speed() {
        let mut s = sim();
        let dt = s.config.step();
        let input = Input { faster: true, ..Default::default() };
        for _ in 0..1200 {
            s.step(dt, input);
            assert!(s.speed() <= s.config.max_speed());
            // hold the racing line so curves never force the car off road
            s.player_x = 0.0;
        }
        // linear ramp tops out after ~5 seconds
        assert_eq!(s.speed(), s.config.max_speed());
    }

    #[test]
    fn off_road_caps_speed() {
        let mut s = sim();
        s.player_x = 2.5;
        s.speed = s.config.max_speed();
        let dt = s.config.step();
        let input = Input { faster: true, ..Default::default() };
        for _ in 0..600 {
            s.step(dt, input);
            // steer back out to keep the car off road despite centrifugal pull
            s.player_x = 2.5;
        }
        // decays until the off-road cap wins over throttle
        assert!(s.speed() < s.config.max_speed() / 2.0);
    }

    #[test]
    fn lap_counter_increments_on_start_line_crossing() {
        let mut s = sim();
        let dt = s.config.step();
        // accumulate some lap time first
        s.position = s.config.player_z() + 1.0;
        s.current_lap_time = 30.0;
        // place the car just short of the line, one step from crossing
        s.position = s.track.length() - 100.0;
        s.speed = 6000.0;
        // crossing happens when position wraps below player_z then passes it
        while s.position() > s.config.player_z() {
            s.step(dt, Input { faster: true, ..Default::default() });
        }
        while s.position() < s.config.player_z() {
            s.step(dt, Input { faster: true, ..Default::default() });
        }
        assert_eq!(s.current_lap(), 2);
        assert!(s.last_lap_time() > 0.0);
        assert_eq!(s.fastest_lap_time(), Some(s.last_lap_time()));
    }

    #[test]
    fn race_finishes_after_max_laps() {
        let mut s = sim();
        s.current_lap = s.config.max_laps;
        s.current_lap_time = 10.0;
        s.position = s.track.length() - 10.0;
        s.speed = 6000.0;
        let dt = s.config.step();
        for _ in 0..600 {
            s.step(dt, Input { faster: true, ..Default::default() });
            if s.is_finished() {
                break;
            }
        }
        assert!(s.is_finished());
        // finished simulations stop advancing
        let frozen = s.position();
        s.step(dt, Input { faster: true, ..Default::default() });
        assert_eq!(s.position(), frozen);
    }

    #[test]
    fn bots_advance_at_their_speed_fraction() {
        let mut s = sim();
        s.bots.push(Bot {
            x: 0.0,
            z: 0.0,
            speed_factor: 0.5,
            sprite: SpriteId::Car01,
        });
        let dt = s.config.step();
        s.step(dt, Input::default());
        let expected = dt * s.config.max_speed() * 0.5;
        assert!((s.bots()[0].z - expected).abs() < 1e-6);
    }

    #[test]
    fn remote_snapshots_are_latest_wins() {
        let mut s = sim();
        s.update_remote("p1", 0.5, 1000.0, 3000.0);
        s.update_remote("p1", -0.5, 2000.0, 4000.0);
        let remote = &s.remotes()["p1"];
        assert_eq!(remote.x, -0.5);
        assert_eq!(remote.z, 2000.0);
        assert_eq!(s.remotes().len(), 1);
    }

    #[test]
    fn remote_wraparound_bumps_lap() {
        let mut s = sim();
        let near_end = s.track.length() - 500.0;
        s.update_remote("p1", 0.0, near_end, 5000.0);
        s.update_remote("p1", 0.0, 300.0, 5000.0);
        assert_eq!(s.remotes()["p1"].lap, 2);
    }

    #[test]
    fn stationary_remote_near_origin_snaps_to_start_line() {
        let mut s = sim();
        s.update_remote("p1", 0.0, 0.05, 0.0);
        assert_eq!(s.remotes()["p1"].z, 0.0);
    }

    #[test]
    fn rank_orders_by_lap_then_distance() {
        let mut s = sim();
        s.position = 5000.0;
        s.update_remote("behind", 0.0, 1000.0, 100.0);
        s.update_remote("ahead", 0.0, 9000.0, 100.0);
        assert_eq!(s.rank(), 2);

        // a remote one lap up outranks regardless of z
        let near_end = s.track.length() - 100.0;
        s.update_remote("lapper", 0.0, near_end, 100.0);
        s.update_remote("lapper", 0.0, 10.0, 100.0);
        assert_eq!(s.rank(), 3);

        let sample = s.sample();
        assert_eq!(sample.rank, 3);
        assert_eq!(sample.z, 5000.0);
    }
}
