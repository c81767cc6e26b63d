//! Perspective projection from world space to screen space.
//!
//! The camera looks down the +z axis; depth scaling collapses each world
//! point onto the screen plane at `camera_depth`, which is derived from the
//! field of view.

/// A point in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WorldPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// A world point translated into camera-relative space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CameraPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Screen-space projection of a world point.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
    /// Projected half road width at this depth.
    pub w: f64,
    pub scale: f64,
}

/// A fully projected point carrying all three spaces.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Projected {
    pub camera: CameraPoint,
    pub screen: ScreenPoint,
}

/// Project `world` through a camera at `(camera_x, camera_y, camera_z)`.
#[allow(clippy::too_many_arguments)]
pub fn project(
    world: WorldPoint,
    camera_x: f64,
    camera_y: f64,
    camera_z: f64,
    camera_depth: f64,
    width: f64,
    height: f64,
    road_width: f64,
) -> Projected {
    let camera = CameraPoint {
        x: world.x - camera_x,
        y: world.y - camera_y,
        z: world.z - camera_z,
    };
    let scale = camera_depth / camera.z;
    let screen = ScreenPoint {
        x: (width / 2.0 + scale * camera.x * width / 2.0).round(),
        y: (height / 2.0 - scale * camera.y * height / 2.0).round(),
        w: (scale * road_width * width / 2.0).round(),
        scale,
    };
    Projected { camera, screen }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_on_camera_axis_projects_to_screen_center() {
        let p = project(
            WorldPoint { x: 0.0, y: 0.0, z: 1000.0 },
            0.0,
            0.0,
            0.0,
            1.0,
            1024.0,
            768.0,
            2000.0,
        );
        assert_eq!(p.screen.x, 512.0);
        assert_eq!(p.screen.y, 384.0);
    }

    #[test]
    fn scale_shrinks_with_depth() {
        let near = project(
            WorldPoint { x: 0.0, y: 0.0, z: 500.0 },
            0.0,
            0.0,
            0.0,
            1.0,
            1024.0,
            768.0,
            2000.0,
        );
        let far = project(
            WorldPoint { x: 0.0, y: 0.0, z: 5000.0 },
            0.0,
            0.0,
            0.0,
            1.0,
            1024.0,
            768.0,
            2000.0,
        );
        assert!(near.screen.scale > far.screen.scale);
        assert!(near.screen.w > far.screen.w);
    }

    #[test]
    fn lateral_offset_shifts_screen_x() {
        let p = project(
            WorldPoint { x: 1000.0, y: 0.0, z: 1000.0 },
            0.0,
            0.0,
            0.0,
            1.0,
            1024.0,
            768.0,
            2000.0,
        );
        // scale = 1/1000, x = 512 + 0.001 * 1000 * 512 = 1024
        assert_eq!(p.screen.x, 1024.0);
    }

    #[test]
    fn elevation_raises_screen_y() {
        let p = project(
            WorldPoint { x: 0.0, y: 500.0, z: 1000.0 },
            0.0,
            0.0,
            0.0,
            1.0,
            1024.0,
            768.0,
            2000.0,
        );
        assert!(p.screen.y < 384.0);
    }
}
