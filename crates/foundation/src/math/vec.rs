use serde::{Deserialize, Serialize};

/// Screen-space position, in backing-store pixels or clip units.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Point in grid space.
///
/// Grid space is the lattice the backdrop is built in: X to the right,
/// Y up (the camera scrolls along it) and Z into the screen.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Narrow to the `f32` layout vertex buffers expect.
    pub fn to_f32(self) -> [f32; 3] {
        [self.x as f32, self.y as f32, self.z as f32]
    }
}

#[cfg(test)]
mod tests {
    use super::Vec3;

    #[test]
    fn narrowing_keeps_grid_coordinates() {
        assert_eq!(Vec3::new(120.0, 0.0, 180.0).to_f32(), [120.0, 0.0, 180.0]);
        assert_eq!(Vec3::new(-0.5, 2.25, 1e3).to_f32(), [-0.5, 2.25, 1000.0]);
    }
}
