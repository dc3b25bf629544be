//! CPU-side mirrors of the WGSL uniform blocks and vertex layouts.
//!
//! Field order and padding follow WGSL uniform layout rules; the size
//! asserts in the tests catch drift between these structs and the shaders.

use foundation::color::Rgb;
use foundation::viewport::BackingStore;
use scene::{Backdrop, GridPoint};

/// Cloud pass block. `color` is a vec3, so it starts at offset 16.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BackgroundUniforms {
    pub resolution: [f32; 2],
    pub time: f32,
    pub _pad0: f32,
    pub color: [f32; 3],
    pub _pad1: f32,
}

impl BackgroundUniforms {
    pub fn new(offscreen: BackingStore, time_seconds: f64, tint: Rgb) -> Self {
        Self {
            resolution: [offscreen.width as f32, offscreen.height as f32],
            time: time_seconds as f32,
            _pad0: 0.0,
            color: tint.to_unit(),
            _pad1: 0.0,
        }
    }
}

/// Shared by the line and node passes. The colors are vec4s, so the block
/// pads after `pixel_scale` to put `line_color` at offset 48.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ProjectionUniforms {
    pub resolution: [f32; 2],
    pub camera_y: f32,
    pub fov: f32,
    pub rotation_x: f32,
    pub near_cutoff: f32,
    /// Node size in backing-store pixels at `scale >= 1`.
    pub point_size: f32,
    /// Depth at which nodes have faded out completely.
    pub depth_fade: f32,
    /// Backing-store pixels per CSS pixel.
    pub pixel_scale: f32,
    pub _pad0: [f32; 3],
    pub line_color: [f32; 4],
    pub node_color: [f32; 4],
}

/// Node size in CSS pixels.
pub const NODE_POINT_SIZE: f32 = 3.5;
pub const NODE_DEPTH_FADE: f32 = 8000.0;

impl ProjectionUniforms {
    pub fn from_backdrop(backdrop: &Backdrop) -> Self {
        let store = backdrop.store();
        let camera = backdrop.camera();
        let color = backdrop.color();
        let settings = backdrop.settings();
        let [lr, lg, lb] = color.current.to_unit();
        let [nr, ng, nb] = color.node_tint(&settings.color).to_unit();
        Self {
            resolution: [store.width as f32, store.height as f32],
            camera_y: camera.y.current as f32,
            fov: camera.focal_px() as f32,
            rotation_x: camera.rotation_x.current as f32,
            near_cutoff: camera.near_cutoff as f32,
            point_size: NODE_POINT_SIZE * camera.pixel_scale as f32,
            depth_fade: NODE_DEPTH_FADE,
            pixel_scale: camera.pixel_scale as f32,
            _pad0: [0.0; 3],
            line_color: [lr, lg, lb, settings.color.line_alpha as f32],
            node_color: [nr, ng, nb, 1.0],
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 2],
}

/// Two triangles covering clip space.
pub const FULLSCREEN_QUAD: [QuadVertex; 6] = [
    QuadVertex { position: [-1.0, -1.0] },
    QuadVertex { position: [1.0, -1.0] },
    QuadVertex { position: [-1.0, 1.0] },
    QuadVertex { position: [-1.0, 1.0] },
    QuadVertex { position: [1.0, -1.0] },
    QuadVertex { position: [1.0, 1.0] },
];

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
}

/// One grid node; expanded to a quad in the vertex shader.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct NodeInstance {
    pub center: [f32; 3],
}

/// Vertices emitted per node instance.
pub const NODE_QUAD_VERTICES: u32 = 6;

pub fn line_vertices(lines: &[GridPoint]) -> Vec<LineVertex> {
    lines
        .iter()
        .map(|p| LineVertex {
            position: p.to_f32(),
        })
        .collect()
}

pub fn node_instances(nodes: &[GridPoint]) -> Vec<NodeInstance> {
    nodes
        .iter()
        .map(|p| NodeInstance { center: p.to_f32() })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use foundation::viewport::BackingStore;
    use pretty_assertions::assert_eq;
    use scene::{BackdropSettings, GridGeometry, GridSpec};

    #[test]
    fn block_sizes_match_wgsl_layout() {
        assert_eq!(std::mem::size_of::<BackgroundUniforms>(), 32);
        assert_eq!(std::mem::size_of::<ProjectionUniforms>(), 80);
        assert_eq!(std::mem::offset_of!(ProjectionUniforms, line_color), 48);
        assert_eq!(std::mem::size_of::<LineVertex>(), 12);
        assert_eq!(std::mem::size_of::<NodeInstance>(), 12);
        assert_eq!(std::mem::size_of::<QuadVertex>(), 8);
    }

    #[test]
    fn background_uniforms_carry_unit_tint() {
        let u = BackgroundUniforms::new(
            BackingStore::new(1024, 576),
            2.5,
            Rgb::new(255.0, 0.0, 51.0),
        );
        assert_eq!(u.resolution, [1024.0, 576.0]);
        assert_eq!(u.time, 2.5);
        assert_eq!(u.color, [1.0, 0.0, 0.2]);
    }

    #[test]
    fn projection_uniforms_follow_backdrop_state() {
        let mut rng = fastrand::Rng::with_seed(1);
        let b = scene::Backdrop::new(
            BackdropSettings::default(),
            BackingStore::new(1920, 1080),
            &mut rng,
        )
        .unwrap();
        let u = ProjectionUniforms::from_backdrop(&b);
        assert_eq!(u.resolution, [1920.0, 1080.0]);
        assert_eq!(u.fov, 355.0);
        assert_eq!(u.near_cutoff, 20.0);
        assert_eq!(u.line_color[3], 0.16);
        assert!((u.node_color[2] - ((220.0 * 0.35 + 255.0 * 0.65) / 255.0) as f32).abs() < 1e-6);
    }

    #[test]
    fn dense_stores_scale_focal_length_and_node_size() {
        let mut rng = fastrand::Rng::with_seed(1);
        let mut b = scene::Backdrop::new(
            BackdropSettings::default(),
            BackingStore::new(2560, 1440),
            &mut rng,
        )
        .unwrap();
        b.set_pixel_scale(2.0);
        let u = ProjectionUniforms::from_backdrop(&b);
        assert_eq!(u.fov, 710.0);
        assert_eq!(u.point_size, 7.0);
        assert_eq!(u.pixel_scale, 2.0);
    }

    #[test]
    fn buffers_match_geometry_counts() {
        let g = GridGeometry::build(&GridSpec::default());
        assert_eq!(line_vertices(&g.lines).len(), 1890);
        assert_eq!(node_instances(&g.nodes).len(), 496);
        assert_eq!(
            bytemuck::cast_slice::<LineVertex, u8>(&line_vertices(&g.lines)).len(),
            1890 * 12
        );
    }
}
