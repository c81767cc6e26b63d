//! Seed-driven procedural track construction.
//!
//! A track is a closed loop of fixed-length segments built by concatenating
//! named road primitives in a curated order, then decorated with roadside
//! sprites. Everything — geometry, palette bands, decoration — is a pure
//! function of the seed and the engine configuration, so two peers holding
//! the same seed race on identical tracks with no geometry on the wire.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::projection::WorldPoint;
use super::sprites::{self, SpriteId};
use super::util;
use super::EngineConfig;

/// Road shape presets, in segment counts / world units.
pub mod road {
    pub const LENGTH_SHORT: usize = 25;
    pub const LENGTH_MEDIUM: usize = 50;
    pub const LENGTH_LONG: usize = 100;

    pub const HILL_NONE: f64 = 0.0;
    pub const HILL_LOW: f64 = 20.0;
    pub const HILL_MEDIUM: f64 = 40.0;
    pub const HILL_HIGH: f64 = 60.0;

    pub const CURVE_EASY: f64 = 2.0;
    pub const CURVE_MEDIUM: f64 = 4.0;
    pub const CURVE_HARD: f64 = 6.0;
}

/// Color band a segment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Palette {
    Light,
    Dark,
    Start,
    Finish,
}

/// A decorative sprite attached to a segment at a lateral offset.
///
/// Offsets are in road-half-widths: |offset| > 1 is off the asphalt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedSprite {
    pub sprite: SpriteId,
    pub offset: f64,
}

/// One fixed-length slice of the track loop.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub index: usize,
    pub p1: WorldPoint,
    pub p2: WorldPoint,
    pub curve: f64,
    pub palette: Palette,
    pub sprites: Vec<PlacedSprite>,
}

/// Immutable generated track.
#[derive(Debug, Clone)]
pub struct Track {
    segments: Vec<Segment>,
    segment_length: f64,
}

impl Track {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Total loop length in world units.
    pub fn length(&self) -> f64 {
        self.segments.len() as f64 * self.segment_length
    }

    /// Segment containing track-distance `z`, modular over the loop.
    pub fn find_segment(&self, z: f64) -> &Segment {
        let index = (z / self.segment_length).floor() as usize % self.segments.len();
        &self.segments[index]
    }
}

/// Builds a [`Track`] from a seed.
pub struct TrackBuilder {
    segments: Vec<Segment>,
    segment_length: f64,
    rumble_length: usize,
    rng: StdRng,
}

impl TrackBuilder {
    pub fn new(seed: u32, segment_length: f64, rumble_length: usize) -> Self {
        Self {
            segments: Vec::new(),
            segment_length,
            rumble_length,
            rng: StdRng::seed_from_u64(seed as u64),
        }
    }

    fn last_y(&self) -> f64 {
        self.segments.last().map_or(0.0, |s| s.p2.y)
    }

    fn add_segment(&mut self, curve: f64, y: f64) {
        let n = self.segments.len();
        let palette = if (n / self.rumble_length) % 2 == 1 {
            Palette::Dark
        } else {
            Palette::Light
        };
        self.segments.push(Segment {
            index: n,
            p1: WorldPoint {
                x: 0.0,
                y: self.last_y(),
                z: n as f64 * self.segment_length,
            },
            p2: WorldPoint {
                x: 0.0,
                y,
                z: (n + 1) as f64 * self.segment_length,
            },
            curve,
            palette,
            sprites: Vec::new(),
        });
    }

    fn add_sprite(&mut self, n: usize, sprite: SpriteId, offset: f64) {
        if let Some(segment) = self.segments.get_mut(n) {
            segment.sprites.push(PlacedSprite { sprite, offset });
        }
    }

    /// Append a road primitive: eased curvature entry, constant hold, eased
    /// exit, with elevation eased across the whole span.
    fn add_road(&mut self, enter: usize, hold: usize, leave: usize, curve: f64, y: f64) {
        let start_y = self.last_y();
        let end_y = start_y + y * self.segment_length;
        let total = (enter + hold + leave) as f64;

        for n in 0..enter {
            self.add_segment(
                util::ease_in(0.0, curve, n as f64 / enter as f64),
                util::ease_in_out(start_y, end_y, n as f64 / total),
            );
        }
        for n in 0..hold {
            self.add_segment(
                curve,
                util::ease_in_out(start_y, end_y, (enter + n) as f64 / total),
            );
        }
        for n in 0..leave {
            self.add_segment(
                util::ease_in_out(curve, 0.0, n as f64 / leave as f64),
                util::ease_in_out(start_y, end_y, (enter + hold + n) as f64 / total),
            );
        }
    }

    fn add_straight(&mut self, num: usize) {
        self.add_road(num, num, num, 0.0, 0.0);
    }

    fn add_hill(&mut self, num: usize, height: f64) {
        self.add_road(num, num, num, 0.0, height);
    }

    fn add_curve(&mut self, num: usize, curve: f64, height: f64) {
        self.add_road(num, num, num, curve, height);
    }

    fn add_low_rolling_hills(&mut self) {
        let num = road::LENGTH_SHORT;
        let height = road::HILL_LOW;
        self.add_road(num, num, num, 0.0, height / 2.0);
        self.add_road(num, num, num, 0.0, -height);
        self.add_road(num, num, num, road::CURVE_EASY, height);
        self.add_road(num, num, num, 0.0, 0.0);
        self.add_road(num, num, num, -road::CURVE_EASY, height / 2.0);
        self.add_road(num, num, num, 0.0, 0.0);
    }

    fn add_s_curves(&mut self) {
        let num = road::LENGTH_MEDIUM;
        self.add_road(num, num, num, -road::CURVE_EASY, road::HILL_NONE);
        self.add_road(num, num, num, road::CURVE_MEDIUM, road::HILL_MEDIUM);
        self.add_road(num, num, num, road::CURVE_EASY, -road::HILL_LOW);
        self.add_road(num, num, num, -road::CURVE_EASY, road::HILL_MEDIUM);
        self.add_road(num, num, num, -road::CURVE_MEDIUM, -road::HILL_MEDIUM);
    }

    fn add_bumps(&mut self) {
        for y in [5.0, -2.0, -5.0, 8.0, 5.0, -7.0, 5.0, -2.0] {
            self.add_road(10, 10, 10, 0.0, y);
        }
    }

    /// Eases elevation back to the baseline so the loop closes seamlessly.
    fn add_downhill_to_end(&mut self, num: usize) {
        let drop = -self.last_y() / self.segment_length;
        self.add_road(num, num, num, -road::CURVE_EASY, drop);
    }

    fn random_offset(&mut self, base: f64, spread: f64) -> f64 {
        base + self.rng.gen::<f64>() * spread
    }

    fn random_index(&mut self, min: usize, max: usize) -> usize {
        self.rng.gen_range(min..=max)
    }

    fn random_choice(&mut self, options: &[SpriteId]) -> SpriteId {
        options[self.rng.gen_range(0..options.len())]
    }

    fn random_side(&mut self) -> f64 {
        if self.rng.gen::<bool>() {
            1.0
        } else {
            -1.0
        }
    }

    /// Seeded decoration pass.
    fn add_sprites(&mut self) {
        // Fixed billboards along the opening stretch
        self.add_sprite(20, SpriteId::Billboard07, -1.0);
        self.add_sprite(40, SpriteId::Billboard06, -1.0);
        self.add_sprite(60, SpriteId::Billboard08, -1.0);
        self.add_sprite(80, SpriteId::Billboard09, -1.0);
        self.add_sprite(100, SpriteId::Billboard01, -1.0);
        self.add_sprite(120, SpriteId::Billboard02, -1.0);
        self.add_sprite(140, SpriteId::Billboard03, -1.0);
        self.add_sprite(160, SpriteId::Billboard04, -1.0);
        self.add_sprite(180, SpriteId::Billboard05, -1.0);

        self.add_sprite(240, SpriteId::Billboard07, -1.2);
        self.add_sprite(240, SpriteId::Billboard06, 1.2);
        let near_end = self.segments.len() - 25;
        self.add_sprite(near_end, SpriteId::Billboard07, -1.2);
        self.add_sprite(near_end, SpriteId::Billboard06, 1.2);

        // Palm rows
        let mut n = 10;
        while n < 200 {
            let inner = self.random_offset(0.5, 0.5);
            let outer = self.random_offset(1.0, 2.0);
            self.add_sprite(n, SpriteId::PalmTree, inner);
            self.add_sprite(n, SpriteId::PalmTree, outer);
            n += 4 + n / 100;
        }

        // Columns with facing trees
        let mut n = 250;
        while n < 1000 {
            self.add_sprite(n, SpriteId::Column, 1.1);
            let tree1_at = n + self.random_index(0, 5);
            let tree1_offset = -self.random_offset(1.0, 2.0);
            self.add_sprite(tree1_at, SpriteId::Tree1, tree1_offset);
            let tree2_at = n + self.random_index(0, 5);
            let tree2_offset = -self.random_offset(1.0, 2.0);
            self.add_sprite(tree2_at, SpriteId::Tree2, tree2_offset);
            n += 5;
        }

        // Scattered plants
        let mut n = 200;
        while n < self.segments.len() {
            let sprite = self.random_choice(sprites::PLANTS);
            let offset = self.random_side() * self.random_offset(2.0, 5.0);
            self.add_sprite(n, sprite, offset);
            n += 3;
        }

        // Billboard clusters with surrounding plants
        let mut n = 1000;
        while n + 50 < self.segments.len() {
            let side = self.random_side();
            let billboard = self.random_choice(sprites::BILLBOARDS);
            let at = n + self.random_index(0, 50);
            self.add_sprite(at, billboard, -side);
            for _ in 0..20 {
                let sprite = self.random_choice(sprites::PLANTS);
                let offset = side * self.random_offset(1.5, 1.0);
                let at = n + self.random_index(0, 50);
                self.add_sprite(at, sprite, offset);
            }
            n += 100;
        }
    }

    fn paint_start_finish(&mut self, player_z: f64) {
        let start = (player_z / self.segment_length).floor() as usize + 2;
        for index in [start, start + 1] {
            if let Some(segment) = self.segments.get_mut(index) {
                segment.palette = Palette::Start;
            }
        }
        for n in 0..self.rumble_length {
            let index = self.segments.len() - 1 - n;
            if let Some(segment) = self.segments.get_mut(index) {
                segment.palette = Palette::Finish;
            }
        }
    }

    /// Build the full curated course and decorate it.
    pub fn build(mut self, player_z: f64) -> Track {
        self.add_straight(road::LENGTH_SHORT);
        self.add_low_rolling_hills();
        self.add_s_curves();
        self.add_curve(road::LENGTH_MEDIUM, road::CURVE_MEDIUM, road::HILL_LOW);
        self.add_bumps();
        self.add_low_rolling_hills();
        self.add_curve(road::LENGTH_LONG * 2, road::CURVE_MEDIUM, road::HILL_MEDIUM);
        self.add_straight(road::LENGTH_MEDIUM);
        self.add_hill(road::LENGTH_MEDIUM, road::HILL_HIGH);
        self.add_s_curves();
        self.add_curve(road::LENGTH_LONG, -road::CURVE_MEDIUM, road::HILL_NONE);
        self.add_hill(road::LENGTH_LONG, road::HILL_HIGH);
        self.add_curve(road::LENGTH_LONG, road::CURVE_MEDIUM, -road::HILL_LOW);
        self.add_bumps();
        self.add_hill(road::LENGTH_LONG, -road::HILL_MEDIUM);
        self.add_straight(road::LENGTH_MEDIUM);
        self.add_s_curves();
        self.add_downhill_to_end(200);

        self.add_sprites();
        self.paint_start_finish(player_z);

        Track {
            segments: self.segments,
            segment_length: self.segment_length,
        }
    }
}

/// Build the track for a seed under the given engine configuration.
pub fn build_track(seed: u32, config: &EngineConfig) -> Track {
    TrackBuilder::new(seed, config.segment_length, config.rumble_length).build(config.player_z())
}
