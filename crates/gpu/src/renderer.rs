use crate::passes::{Availability, FramePlan, PIPELINE, Resource};
use crate::targets::TargetSizes;
use crate::uniforms::{BackgroundUniforms, NODE_QUAD_VERTICES, ProjectionUniforms};
use foundation::color::Rgb;
use runtime::Frame;
use scene::Backdrop;

/// Clear color used when the sky cannot be drawn: the cloud shader's
/// output for an empty mask, `tint * 0.25² * 0.5`.
pub fn fallback_color(tint: Rgb) -> [f64; 4] {
    let k = 0.25 * 0.25 * 0.5;
    [
        tint.r / 255.0 * k,
        tint.g / 255.0 * k,
        tint.b / 255.0 * k,
        1.0,
    ]
}

/// Everything the GPU backend needs to encode one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedFrame {
    pub plan: FramePlan,
    pub sizes: TargetSizes,
    pub background: BackgroundUniforms,
    pub projection: ProjectionUniforms,
    pub clear_color: [f64; 4],
    pub line_vertex_count: u32,
    pub node_instance_count: u32,
    pub node_vertex_count: u32,
    pub generation: u64,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct ResourceState {
    pub blue_noise_ready: bool,
    pub cloud_ready: bool,
}

pub struct Renderer;

impl Renderer {
    pub fn availability(backdrop: &Backdrop, resources: ResourceState) -> Availability {
        let mut a = Availability::default();
        a.ready.insert(Resource::StarField);
        if resources.cloud_ready {
            a.ready.insert(Resource::CloudTexture);
        }
        if resources.blue_noise_ready {
            a.ready.insert(Resource::BlueNoise);
        }
        let geometry = backdrop.geometry();
        if !geometry.lines.is_empty() {
            a.ready.insert(Resource::LineBuffer);
        }
        if !geometry.nodes.is_empty() {
            a.ready.insert(Resource::NodeBuffer);
        }
        a
    }

    pub fn prepare(backdrop: &Backdrop, frame: &Frame, availability: Availability) -> PreparedFrame {
        let sizes = TargetSizes::for_store(backdrop.store());
        let tint = backdrop.color().current;
        let geometry = backdrop.geometry();
        PreparedFrame {
            plan: FramePlan::build(&PIPELINE, availability),
            sizes,
            background: BackgroundUniforms::new(sizes.offscreen, frame.time.seconds(), tint),
            projection: ProjectionUniforms::from_backdrop(backdrop),
            clear_color: fallback_color(tint),
            line_vertex_count: geometry.lines.len() as u32,
            node_instance_count: geometry.nodes.len() as u32,
            node_vertex_count: NODE_QUAD_VERTICES,
            generation: backdrop.generation(),
        }
    }
}
