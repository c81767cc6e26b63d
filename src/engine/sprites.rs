//! Sprite sheet atlas used by track decoration, collision, and rendering.
//!
//! Rectangles are source coordinates into the shared sprite sheet the
//! browser client draws from. The engine only needs their widths (collision
//! footprints) and identities (deterministic decoration), so the atlas is
//! plain data.

use serde::{Deserialize, Serialize};

/// Source rectangle on the sprite sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// Every drawable sprite on the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpriteId {
    PalmTree,
    Billboard01,
    Billboard02,
    Billboard03,
    Billboard04,
    Billboard05,
    Billboard06,
    Billboard07,
    Billboard08,
    Billboard09,
    BillboardLightCar1,
    BillboardLightCar2,
    Tree1,
    Tree2,
    Tree3dNew,
    Tree3dPink,
    DeadTree1,
    DeadTree2,
    Column,
    Bush1,
    Bush2,
    Cactus,
    Stump,
    Semi,
    Truck,
    Car01,
    Car02,
    Car03,
    Car04,
    Car3dFront,
    Car3dBack,
    PlayerUphillLeft,
    PlayerUphillStraight,
    PlayerUphillRight,
    PlayerLeft,
    PlayerStraight,
    PlayerRight,
}

impl SpriteId {
    /// Source rectangle on the sheet.
    pub fn rect(self) -> SpriteRect {
        use SpriteId::*;
        let (x, y, w, h) = match self {
            PalmTree => (5, 5, 215, 540),
            Billboard08 => (230, 5, 385, 265),
            Tree1 => (625, 5, 360, 360),
            DeadTree1 => (5, 555, 135, 332),
            Billboard09 => (150, 555, 328, 282),
            Column => (995, 5, 200, 315),
            Billboard01 => (625, 375, 300, 170),
            Billboard06 => (488, 555, 298, 190),
            Billboard05 => (5, 897, 298, 190),
            Billboard07 => (313, 897, 298, 190),
            Tree2 => (1205, 5, 282, 295),
            Billboard04 => (1205, 310, 268, 170),
            DeadTree2 => (1205, 490, 150, 260),
            Bush1 => (5, 1097, 240, 155),
            Cactus => (929, 897, 235, 118),
            Bush2 => (255, 1097, 232, 152),
            Billboard03 => (5, 1262, 230, 220),
            Billboard02 => (245, 1262, 215, 220),
            Stump => (995, 330, 195, 140),
            Semi => (1365, 490, 122, 144),
            Truck => (1365, 644, 100, 78),
            Car03 => (1383, 760, 88, 55),
            Car02 => (1383, 825, 80, 59),
            Car04 => (1383, 894, 80, 57),
            Car01 => (1205, 1018, 80, 56),
            PlayerUphillLeft => (1383, 961, 80, 45),
            PlayerUphillStraight => (1295, 1018, 80, 45),
            PlayerUphillRight => (1385, 1018, 80, 45),
            PlayerLeft => (995, 480, 80, 41),
            PlayerStraight => (1085, 480, 80, 41),
            PlayerRight => (995, 531, 80, 41),
            BillboardLightCar1 => (773, 1246, 303, 192),
            BillboardLightCar2 => (1127, 1255, 330, 195),
            Tree3dNew => (486, 1225, 250, 224),
            Tree3dPink => (967, 627, 218, 231),
            Car3dFront => (906, 1019, 139, 85),
            Car3dBack => (1056, 1020, 122, 91),
        };
        SpriteRect { x, y, w, h }
    }

    /// World-space width, in the same units as lateral road offsets.
    pub fn world_width(self) -> f64 {
        self.rect().w as f64 * SCALE
    }
}

/// World scale of one sheet pixel, normalized so the straight player car is
/// 0.3 road-half-widths wide.
pub const SCALE: f64 = 0.3 * (1.0 / 80.0);

/// Roadside billboards.
pub const BILLBOARDS: &[SpriteId] = &[
    SpriteId::Billboard01,
    SpriteId::Billboard02,
    SpriteId::Billboard03,
    SpriteId::Billboard04,
    SpriteId::Billboard05,
    SpriteId::Billboard06,
    SpriteId::Billboard07,
    SpriteId::Billboard08,
    SpriteId::Billboard09,
    SpriteId::BillboardLightCar1,
    SpriteId::BillboardLightCar2,
];

/// Trackside vegetation and debris.
pub const PLANTS: &[SpriteId] = &[
    SpriteId::Tree1,
    SpriteId::Tree2,
    SpriteId::DeadTree1,
    SpriteId::DeadTree2,
    SpriteId::PalmTree,
    SpriteId::Bush2,
    SpriteId::Cactus,
    SpriteId::Stump,
    SpriteId::Tree3dNew,
    SpriteId::Tree3dPink,
];

/// Car sprites usable by bots and remote players.
pub const CARS: &[SpriteId] = &[
    SpriteId::Car01,
    SpriteId::Car02,
    SpriteId::Car03,
    SpriteId::Car04,
    SpriteId::Semi,
    SpriteId::Truck,
    SpriteId::Car3dFront,
    SpriteId::Car3dBack,
];
