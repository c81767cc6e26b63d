//! Headless frame renderer.
//!
//! Walks the track from the camera's base segment outward, projecting each
//! segment into screen space and emitting an ordered list of draw commands:
//! parallax background layers, road polygons front-to-back with a rising
//! clip line, then sprites and cars back-to-front. A presentation layer
//! (canvas, GPU, test harness) consumes the commands; the renderer itself
//! is a pure function of simulation state.

use super::projection::{project, Projected};
use super::simulation::{Input, Simulation};
use super::sprites::{self, SpriteId};
use super::track::Palette;
use super::util;

/// Color palette for one road band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoadColors {
    pub road: &'static str,
    pub grass: &'static str,
    pub rumble: &'static str,
    pub lane: Option<&'static str>,
}

pub const SKY_COLOR: &str = "#72D7EE";
pub const FOG_COLOR: &str = "#334444";

const LIGHT: RoadColors = RoadColors {
    road: "#6B6B6B",
    grass: "#cdac02",
    rumble: "#555555",
    lane: Some("#CCCCCC"),
};
const DARK: RoadColors = RoadColors {
    road: "#696969",
    grass: "#c4a504",
    rumble: "#BBBBBB",
    lane: None,
};
const START: RoadColors = RoadColors {
    road: "white",
    grass: "white",
    rumble: "white",
    lane: None,
};
const FINISH: RoadColors = RoadColors {
    road: "black",
    grass: "black",
    rumble: "black",
    lane: None,
};

impl Palette {
    pub fn colors(self) -> RoadColors {
        match self {
            Palette::Light => LIGHT,
            Palette::Dark => DARK,
            Palette::Start => START,
            Palette::Finish => FINISH,
        }
    }
}

/// Scrolling background layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundLayer {
    Sky,
    Hills,
    Trees,
}

/// One drawing instruction, in paint order.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    /// Horizontally scrolled background strip.
    Background {
        layer: BackgroundLayer,
        rotation: f64,
        offset: f64,
    },
    /// Axis-aligned filled rectangle (grass bands).
    Rect {
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        color: &'static str,
    },
    /// Filled quad (road, rumble strips, lane markers).
    Polygon {
        points: [(f64, f64); 4],
        color: &'static str,
    },
    /// Fog overlay over a horizontal band; `intensity` 0 = opaque fog.
    Fog {
        y: f64,
        h: f64,
        intensity: f64,
    },
    /// Roadside sprite anchored at a projected point.
    Sprite {
        sprite: SpriteId,
        scale: f64,
        x: f64,
        y: f64,
        offset_x: f64,
        offset_y: f64,
        clip_y: f64,
    },
    /// Bot or remote car.
    Car {
        sprite: SpriteId,
        scale: f64,
        x: f64,
        y: f64,
    },
    /// The local player's car.
    Player {
        sprite: SpriteId,
        scale: f64,
        x: f64,
        y: f64,
    },
}

/// One rendered frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    pub commands: Vec<DrawCmd>,
}

fn rumble_width(projected_road_width: f64, lanes: u32) -> f64 {
    projected_road_width / 6.0f64.max(2.0 * lanes as f64)
}

fn lane_marker_width(projected_road_width: f64, lanes: u32) -> f64 {
    projected_road_width / 32.0f64.max(8.0 * lanes as f64)
}

struct ProjectedSegment {
    p1: Projected,
    p2: Projected,
    clip: f64,
}

/// Render one frame of the given simulation.
pub fn render_frame(sim: &Simulation, input: Input) -> Frame {
    let config = sim.config();
    let track = sim.track();
    let segments = track.segments();
    let count = segments.len();

    let position = sim.position();
    let player_x = sim.player_x();
    let player_z = config.player_z();
    let camera_depth = config.camera_depth();

    let base_segment = track.find_segment(position);
    let base_percent = util::percent_remaining(position, config.segment_length);
    let player_segment = track.find_segment(position + player_z);
    let player_percent = util::percent_remaining(position + player_z, config.segment_length);
    let player_y = util::interpolate(
        player_segment.p1.y,
        player_segment.p2.y,
        player_percent,
    );

    let mut commands = Vec::new();
    let (sky_offset, hill_offset, tree_offset) = sim.parallax();
    let resolution = config.resolution();
    commands.push(DrawCmd::Background {
        layer: BackgroundLayer::Sky,
        rotation: sky_offset,
        offset: resolution * 0.001 * player_y,
    });
    commands.push(DrawCmd::Background {
        layer: BackgroundLayer::Hills,
        rotation: hill_offset,
        offset: resolution * 0.002 * player_y,
    });
    commands.push(DrawCmd::Background {
        layer: BackgroundLayer::Trees,
        rotation: tree_offset,
        offset: resolution * 0.003 * player_y,
    });

    // Front-to-back road pass with a rising clip line
    let mut maxy = config.height;
    let mut x = 0.0;
    let mut dx = -(base_segment.curve * base_percent);
    let mut projected: Vec<ProjectedSegment> = Vec::with_capacity(config.draw_distance);

    for n in 0..config.draw_distance {
        let segment = &segments[(base_segment.index + n) % count];
        let looped = segment.index < base_segment.index;
        let fog = util::exponential_fog(n as f64 / config.draw_distance as f64, config.fog_density);
        let camera_z = position - if looped { track.length() } else { 0.0 };

        let p1 = project(
            segment.p1,
            player_x * config.road_width - x,
            player_y + config.camera_height,
            camera_z,
            camera_depth,
            config.width,
            config.height,
            config.road_width,
        );
        let p2 = project(
            segment.p2,
            player_x * config.road_width - x - dx,
            player_y + config.camera_height,
            camera_z,
            camera_depth,
            config.width,
            config.height,
            config.road_width,
        );
        projected.push(ProjectedSegment { p1, p2, clip: maxy });

        x += dx;
        dx += segment.curve;

        // behind the camera, flat to the horizon, or fully occluded
        if p1.camera.z <= camera_depth || p2.screen.y >= p1.screen.y || p2.screen.y >= maxy {
            continue;
        }

        let colors = segment.palette.colors();
        let (x1, y1, w1) = (p1.screen.x, p1.screen.y, p1.screen.w);
        let (x2, y2, w2) = (p2.screen.x, p2.screen.y, p2.screen.w);
        let r1 = rumble_width(w1, config.lanes);
        let r2 = rumble_width(w2, config.lanes);

        commands.push(DrawCmd::Rect {
            x: 0.0,
            y: y2,
            w: config.width,
            h: y1 - y2,
            color: colors.grass,
        });
        commands.push(DrawCmd::Polygon {
            points: [(x1 - w1 - r1, y1), (x1 - w1, y1), (x2 - w2, y2), (x2 - w2 - r2, y2)],
            color: colors.rumble,
        });
        commands.push(DrawCmd::Polygon {
            points: [(x1 + w1 + r1, y1), (x1 + w1, y1), (x2 + w2, y2), (x2 + w2 + r2, y2)],
            color: colors.rumble,
        });
        commands.push(DrawCmd::Polygon {
            points: [(x1 - w1, y1), (x1 + w1, y1), (x2 + w2, y2), (x2 - w2, y2)],
            color: colors.road,
        });

        if let Some(lane) = colors.lane {
            let l1 = lane_marker_width(w1, config.lanes);
            let l2 = lane_marker_width(w2, config.lanes);
            let lanew1 = w1 * 2.0 / config.lanes as f64;
            let lanew2 = w2 * 2.0 / config.lanes as f64;
            let mut lanex1 = x1 - w1 + lanew1;
            let mut lanex2 = x2 - w2 + lanew2;
            for _ in 1..config.lanes {
                commands.push(DrawCmd::Polygon {
                    points: [
                        (lanex1 - l1 / 2.0, y1),
                        (lanex1 + l1 / 2.0, y1),
                        (lanex2 + l2 / 2.0, y2),
                        (lanex2 - l2 / 2.0, y2),
                    ],
                    color: lane,
                });
                lanex1 += lanew1;
                lanex2 += lanew2;
            }
        }

        if fog < 1.0 {
            commands.push(DrawCmd::Fog {
                y: y1,
                h: y2 - y1,
                intensity: fog,
            });
        }

        maxy = y1;
    }

    // Back-to-front sprite/car pass
    for n in (1..config.draw_distance).rev() {
        let segment = &segments[(base_segment.index + n) % count];
        let proj = &projected[n];
        let scale = proj.p1.screen.scale;
        let screen_x = proj.p1.screen.x;
        let screen_y = proj.p1.screen.y;

        for placed in &segment.sprites {
            commands.push(DrawCmd::Sprite {
                sprite: placed.sprite,
                scale,
                x: screen_x + scale * placed.offset * config.road_width * config.width / 2.0,
                y: screen_y,
                offset_x: if placed.offset < 0.0 { -1.0 } else { 0.0 },
                offset_y: -1.0,
                clip_y: proj.clip,
            });
        }

        for bot in sim.bots() {
            let bot_index =
                (bot.z / config.segment_length).floor() as usize % count;
            if bot_index == segment.index {
                commands.push(DrawCmd::Car {
                    sprite: bot.sprite,
                    scale,
                    x: screen_x + scale * bot.x * config.road_width * config.width / 2.0,
                    y: screen_y,
                });
            }
        }

        for remote in sim.remotes().values() {
            let relative_z = remote.z - position;
            if relative_z.abs() >= config.draw_distance as f64 * config.segment_length {
                continue;
            }
            let remote_segment = track.find_segment(remote.z + player_z);
            if remote_segment.index == segment.index {
                commands.push(DrawCmd::Car {
                    sprite: remote.sprite.unwrap_or(sprites::CARS[0]),
                    scale,
                    x: screen_x + scale * remote.x * config.road_width * config.width / 2.0,
                    y: screen_y,
                });
            }
        }

        if segment.index == player_segment.index {
            let steer = if input.left {
                -1.0
            } else if input.right {
                1.0
            } else {
                0.0
            };
            let updown = player_segment.p2.y - player_segment.p1.y;
            let sprite = player_sprite(steer, updown);
            let player_scale = camera_depth / player_z;
            let camera_y = util::interpolate(
                proj.p1.camera.y,
                proj.p2.camera.y,
                player_percent,
            );
            commands.push(DrawCmd::Player {
                sprite,
                scale: player_scale,
                x: config.width / 2.0,
                y: config.height / 2.0 - player_scale * camera_y * config.height / 2.0,
            });
        }
    }

    Frame { commands }
}

fn player_sprite(steer: f64, updown: f64) -> SpriteId {
    if steer < 0.0 {
        if updown > 0.0 {
            SpriteId::PlayerUphillLeft
        } else {
            SpriteId::PlayerLeft
        }
    } else if steer > 0.0 {
        if updown > 0.0 {
            SpriteId::PlayerUphillRight
        } else {
            SpriteId::PlayerRight
        }
    } else if updown > 0.0 {
        SpriteId::PlayerUphillStraight
    } else {
        SpriteId::PlayerStraight
    }
}
