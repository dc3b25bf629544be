//! WGSL sources for the four GPU passes.
//!
//! The grid and node shaders share a projection prelude generated from the
//! camera constants in `scene::camera`, so the CPU and GPU projections
//! cannot drift apart. Every source is parsed and validated with naga
//! before a pipeline is built from it.

use crate::passes::PassKind;
use scene::camera::{DEPTH_SHEAR, TILT_GAIN};

pub const BACKGROUND_SHADER: &str = r#"
struct Background {
    resolution: vec2<f32>,
    time: f32,
    _pad0: f32,
    color: vec3<f32>,
    _pad1: f32,
};

@group(0) @binding(0) var<uniform> bg: Background;
@group(0) @binding(1) var cloud_tex: texture_2d<f32>;
@group(0) @binding(2) var cloud_sampler: sampler;
@group(0) @binding(3) var noise_tex: texture_2d<f32>;
@group(0) @binding(4) var noise_sampler: sampler;

const WARP_STRENGTH: f32 = 0.05;
const CLOUD_SCALE: f32 = 0.35;
const BRIGHTNESS: f32 = 0.5;

@vertex
fn vs_main(@location(0) position: vec2<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(position, 0.0, 1.0);
}

@fragment
fn fs_main(@builtin(position) frag: vec4<f32>) -> @location(0) vec4<f32> {
    var st = frag.xy / bg.resolution;
    st.x = st.x * (bg.resolution.x / bg.resolution.y);

    // Layer 1 drifts slowly and warps layer 2.
    let p1 = st * CLOUD_SCALE + vec2<f32>(bg.time * 0.01, bg.time * 0.02);
    let val1 = textureSample(cloud_tex, cloud_sampler, p1).r;

    var p2 = st * (CLOUD_SCALE * 0.8) + vec2<f32>(bg.time * 0.02, bg.time * -0.035);
    p2 = p2 + vec2<f32>((val1 - 0.5) * WARP_STRENGTH);
    let val2 = textureSample(cloud_tex, cloud_sampler, p2).r;

    let mask = val1 * val2;
    let color = bg.color * (mask + 0.25) * (mask + 0.25) * BRIGHTNESS;

    let dither = (textureSample(noise_tex, noise_sampler, frag.xy / 128.0).r - 0.5) / 255.0;
    return vec4<f32>(color + vec3<f32>(dither), 1.0);
}
"#;

pub const COMPOSITE_SHADER: &str = r#"
@group(0) @binding(0) var background_tex: texture_2d<f32>;
@group(0) @binding(1) var background_sampler: sampler;
@group(0) @binding(2) var noise_tex: texture_2d<f32>;
@group(0) @binding(3) var noise_sampler: sampler;

struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@location(0) position: vec2<f32>) -> VsOut {
    let uv = vec2<f32>(position.x * 0.5 + 0.5, 0.5 - position.y * 0.5);
    return VsOut(vec4<f32>(position, 0.0, 1.0), uv);
}

@fragment
fn fs_main(v: VsOut) -> @location(0) vec4<f32> {
    let bg = textureSample(background_tex, background_sampler, v.uv).rgb;
    let noise = textureSample(noise_tex, noise_sampler, (v.pos.xy + vec2<f32>(0.5)) / 256.0).rgb;
    return vec4<f32>(bg + (noise - vec3<f32>(0.5)) * 0.001, 1.0);
}
"#;

const GRID_BODY: &str = r#"
struct LineOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) depth: f32,
};

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> LineOut {
    let t = tilt(position);
    // The divisor is clamped so segments crossing the cutoff stay finite;
    // the fragment stage trims them.
    let scale = proj.fov / max(t.y, 1.0);
    return LineOut(to_clip(position.x, t.x, scale), t.y);
}

@fragment
fn fs_main(v: LineOut) -> @location(0) vec4<f32> {
    if (v.depth <= proj.near_cutoff) {
        discard;
    }
    return proj.line_color;
}
"#;

const NODES_BODY: &str = r#"
struct NodeOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) corner: vec2<f32>,
    @location(1) alpha: f32,
};

@vertex
fn vs_main(@builtin(vertex_index) vid: u32, @location(0) center: vec3<f32>) -> NodeOut {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(0.0, 0.0),
        vec2<f32>(1.0, 0.0),
        vec2<f32>(0.0, 1.0),
        vec2<f32>(0.0, 1.0),
        vec2<f32>(1.0, 0.0),
        vec2<f32>(1.0, 1.0),
    );
    let corner = corners[vid % 6u];
    let t = tilt(center);

    var node: NodeOut;
    node.corner = corner;
    if (t.y <= proj.near_cutoff) {
        node.pos = vec4<f32>(-2.0, -2.0, 0.0, 1.0);
        node.alpha = 0.0;
        return node;
    }

    let scale = proj.fov / t.y;
    // Attenuate as if at one pixel per CSS pixel.
    let size_px = proj.point_size * min(scale / proj.pixel_scale, 1.0);
    let base = to_clip(center.x, t.x, scale);
    let offset = (corner - vec2<f32>(0.5)) * size_px * 2.0 / proj.resolution;
    node.pos = vec4<f32>(base.xy + offset, 0.0, 1.0);
    node.alpha = 1.0 - min(t.y / proj.depth_fade, 1.0);
    return node;
}

@fragment
fn fs_main(v: NodeOut) -> @location(0) vec4<f32> {
    let dist = max(abs(v.corner.x - 0.5), abs(v.corner.y - 0.5));
    if (dist > 0.5) {
        discard;
    }
    let glow = 1.0 - dist;
    return vec4<f32>(proj.node_color.rgb, v.alpha * glow);
}
"#;

/// Uniform block, tilt and clip mapping shared by the grid passes.
pub fn projection_prelude() -> String {
    format!(
        r#"
struct Projection {{
    resolution: vec2<f32>,
    camera_y: f32,
    fov: f32,
    rotation_x: f32,
    near_cutoff: f32,
    point_size: f32,
    depth_fade: f32,
    pixel_scale: f32,
    line_color: vec4<f32>,
    node_color: vec4<f32>,
}};

@group(0) @binding(0) var<uniform> proj: Projection;

const TILT_GAIN: f32 = {TILT_GAIN:?};
const DEPTH_SHEAR: f32 = {DEPTH_SHEAR:?};

// (rotated y, rotated depth)
fn tilt(p: vec3<f32>) -> vec2<f32> {{
    let c = cos(proj.rotation_x);
    let s = sin(proj.rotation_x);
    let translated_y = p.y - proj.camera_y;
    return vec2<f32>(TILT_GAIN * translated_y * c - DEPTH_SHEAR * p.z * s, p.z * c);
}}

fn to_clip(x: f32, rotated_y: f32, scale: f32) -> vec4<f32> {{
    let half = proj.resolution * 0.5;
    return vec4<f32>(x * scale / half.x, rotated_y * scale / half.y, 0.0, 1.0);
}}
"#
    )
}

pub fn grid_shader() -> String {
    projection_prelude() + GRID_BODY
}

pub fn nodes_shader() -> String {
    projection_prelude() + NODES_BODY
}

/// Full WGSL source for a GPU pass; `None` for the 2D canvas overlay.
pub fn source_for(kind: PassKind) -> Option<String> {
    match kind {
        PassKind::Background => Some(BACKGROUND_SHADER.to_string()),
        PassKind::Composite => Some(COMPOSITE_SHADER.to_string()),
        PassKind::GridLines => Some(grid_shader()),
        PassKind::Nodes => Some(nodes_shader()),
        PassKind::Stars => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderError {
    Parse { label: String, message: String },
    Validation { label: String, message: String },
    /// The device rejected a pipeline built from a shader that validated.
    Pipeline { label: String, message: String },
}

impl std::fmt::Display for ShaderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShaderError::Parse { label, message } => {
                write!(f, "shader {label} failed to parse: {message}")
            }
            ShaderError::Validation { label, message } => {
                write!(f, "shader {label} failed validation: {message}")
            }
            ShaderError::Pipeline { label, message } => {
                write!(f, "pipeline {label} was rejected by the device: {message}")
            }
        }
    }
}

impl std::error::Error for ShaderError {}

impl ShaderError {
    pub fn label(&self) -> &str {
        match self {
            ShaderError::Parse { label, .. }
            | ShaderError::Validation { label, .. }
            | ShaderError::Pipeline { label, .. } => label,
        }
    }
}

pub fn validate(label: &str, source: &str) -> Result<(), ShaderError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| ShaderError::Parse {
        label: label.to_string(),
        message: e.emit_to_string(source),
    })?;
    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::empty(),
    )
    .validate(&module)
    .map_err(|e| ShaderError::Validation {
        label: label.to_string(),
        message: e.emit_to_string(source),
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{grid_shader, nodes_shader, source_for, validate, ShaderError};
    use crate::passes::{PassKind, PIPELINE};
    use naga::{
        BinaryOperator, Block, Expression, Function, Handle, Literal, Module, ShaderStage,
        Statement, TypeInner, UnaryOperator,
    };

    fn parse(source: &str) -> Module {
        naga::front::wgsl::parse_str(source).unwrap()
    }

    fn entry(module: &Module, stage: ShaderStage) -> &Function {
        &module
            .entry_points
            .iter()
            .find(|ep| ep.stage == stage)
            .unwrap()
            .function
    }

    /// Struct member an access chain ends at, looking through loads.
    fn member<'a>(module: &'a Module, func: &Function, expr: Handle<Expression>) -> Option<&'a str> {
        match func.expressions[expr] {
            Expression::Load { pointer } => member(module, func, pointer),
            Expression::AccessIndex { base, index } => {
                let ty = match func.expressions[base] {
                    Expression::GlobalVariable(h) => module.global_variables[h].ty,
                    Expression::FunctionArgument(i) => func.arguments[i as usize].ty,
                    Expression::LocalVariable(h) => func.local_variables[h].ty,
                    _ => return None,
                };
                match &module.types[ty].inner {
                    TypeInner::Struct { members, .. } => members.get(index as usize)?.name.as_deref(),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    fn float(func: &Function, expr: Handle<Expression>) -> Option<f64> {
        match func.expressions[expr] {
            Expression::Literal(Literal::F32(v)) => Some(v as f64),
            Expression::Literal(Literal::AbstractFloat(v)) => Some(v),
            Expression::Unary { op: UnaryOperator::Negate, expr } => float(func, expr).map(|v| -v),
            _ => None,
        }
    }

    /// The `if (lhs <= proj.near_cutoff)` branch: its left operand and body.
    fn near_cutoff_branch<'f>(
        module: &Module,
        func: &'f Function,
    ) -> Option<(Handle<Expression>, &'f Block)> {
        func.body.iter().find_map(|stmt| {
            let Statement::If { condition, accept, .. } = stmt else {
                return None;
            };
            match func.expressions[*condition] {
                Expression::Binary { op: BinaryOperator::LessEqual, left, right }
                    if member(module, func, right) == Some("near_cutoff") =>
                {
                    Some((left, accept))
                }
                _ => None,
            }
        })
    }

    #[test]
    fn every_gpu_pass_validates() {
        for pass in PIPELINE.iter() {
            if let Some(source) = source_for(pass.kind) {
                if let Err(e) = validate(pass.label, &source) {
                    panic!("{e}");
                }
            }
        }
    }

    #[test]
    fn grid_fragments_at_or_before_near_cutoff_are_discarded() {
        let module = parse(&grid_shader());
        let func = entry(&module, ShaderStage::Fragment);
        let (depth, accept) = near_cutoff_branch(&module, func).expect("near cutoff test");
        assert_eq!(member(&module, func, depth), Some("depth"));
        assert!(accept.iter().any(|s| matches!(s, Statement::Kill)));
    }

    #[test]
    fn nodes_at_or_before_near_cutoff_are_parked_off_screen() {
        let module = parse(&nodes_shader());
        let func = entry(&module, ShaderStage::Vertex);
        let (depth, accept) = near_cutoff_branch(&module, func).expect("near cutoff test");
        // Component 1 of `tilt()` is the rotated depth.
        assert!(matches!(
            func.expressions[depth],
            Expression::AccessIndex { index: 1, .. }
        ));
        assert!(accept.iter().any(|s| matches!(s, Statement::Return { .. })));

        let stores: Vec<_> = accept
            .iter()
            .filter_map(|s| match *s {
                Statement::Store { pointer, value } => Some((member(&module, func, pointer), value)),
                _ => None,
            })
            .collect();

        let alpha = stores.iter().find(|(m, _)| *m == Some("alpha")).unwrap().1;
        assert_eq!(float(func, alpha), Some(0.0));

        let pos = stores.iter().find(|(m, _)| *m == Some("pos")).unwrap().1;
        let Expression::Compose { ref components, .. } = func.expressions[pos] else {
            panic!("position is not a vector constructor");
        };
        let xy: Vec<_> = components[..2].iter().map(|&c| float(func, c)).collect();
        assert_eq!(xy, vec![Some(-2.0), Some(-2.0)]);
    }

    #[test]
    fn prelude_embeds_camera_constants() {
        let src = source_for(PassKind::GridLines).unwrap();
        assert!(src.contains("const TILT_GAIN: f32 = 41.0;"));
        assert!(src.contains("const DEPTH_SHEAR: f32 = 0.1;"));
        assert!(source_for(PassKind::Stars).is_none());
    }

    #[test]
    fn syntax_errors_are_reported_as_parse_errors() {
        let err = validate("broken", "fn main( {").unwrap_err();
        assert!(matches!(err, ShaderError::Parse { .. }));
        assert_eq!(err.label(), "broken");
    }

    #[test]
    fn pipeline_rejections_name_their_pass() {
        let err = ShaderError::Pipeline {
            label: "grid-lines".to_string(),
            message: "blend state unsupported".to_string(),
        };
        assert_eq!(err.label(), "grid-lines");
        assert_eq!(
            err.to_string(),
            "pipeline grid-lines was rejected by the device: blend state unsupported"
        );
    }

    #[test]
    fn type_errors_are_rejected() {
        // Parses, but returns a float from a function declared to return a vector.
        let src = "fn f() -> vec2<f32> { return 1.0; }";
        let err = validate("mistyped", src).unwrap_err();
        assert!(matches!(
            err,
            ShaderError::Parse { .. } | ShaderError::Validation { .. }
        ));
        assert!(err.to_string().contains("mistyped"));
    }
}
