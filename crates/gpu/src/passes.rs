//! Ordered pass descriptors and the per-frame plan built from them.
//!
//! Pass order is load-bearing: the composite reads the offscreen target
//! the background pass wrote, and the additive grid passes must land on
//! top of the composited sky. The order lives in one static list,
//! [`PIPELINE`], checked by [`validate_order`]; each frame the list is
//! turned into a [`FramePlan`] that says which passes run, which fall
//! back to a flat clear, and which are skipped and why.

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PassKind {
    Background,
    Composite,
    GridLines,
    Nodes,
    Stars,
}

impl PassKind {
    pub const ALL: [PassKind; 5] = [
        PassKind::Background,
        PassKind::Composite,
        PassKind::GridLines,
        PassKind::Nodes,
        PassKind::Stars,
    ];

    fn bit(self) -> u8 {
        1 << (self as u8)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PassKind::Background => "background",
            PassKind::Composite => "composite",
            PassKind::GridLines => "grid-lines",
            PassKind::Nodes => "nodes",
            PassKind::Stars => "stars",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Resource {
    /// Procedural cloud texture, created with the context.
    CloudTexture,
    /// Blue-noise PNG; arrives asynchronously.
    BlueNoise,
    /// Reduced-resolution color target, written every frame.
    Offscreen,
    LineBuffer,
    NodeBuffer,
    StarField,
}

impl Resource {
    fn bit(self) -> u8 {
        1 << (self as u8)
    }

    /// Produced by a pass within the frame rather than supplied from outside.
    pub fn is_transient(self) -> bool {
        matches!(self, Resource::Offscreen)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Resource::CloudTexture => "cloud-texture",
            Resource::BlueNoise => "blue-noise",
            Resource::Offscreen => "offscreen",
            Resource::LineBuffer => "line-buffer",
            Resource::NodeBuffer => "node-buffer",
            Resource::StarField => "star-field",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Target {
    Offscreen,
    Surface,
    /// The 2D overlay canvas; drawn by the browser layer, not the GPU.
    Canvas2d,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Blend {
    Replace,
    /// `src * src_alpha + dst`.
    Additive,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PassDescriptor {
    pub kind: PassKind,
    pub label: &'static str,
    pub reads: &'static [Resource],
    pub writes: Option<Resource>,
    pub target: Target,
    pub blend: Blend,
}

impl PassDescriptor {
    pub fn is_gpu(&self) -> bool {
        self.target != Target::Canvas2d
    }
}

pub static PIPELINE: [PassDescriptor; 5] = [
    PassDescriptor {
        kind: PassKind::Background,
        label: "backdrop-background",
        reads: &[Resource::CloudTexture, Resource::BlueNoise],
        writes: Some(Resource::Offscreen),
        target: Target::Offscreen,
        blend: Blend::Replace,
    },
    PassDescriptor {
        kind: PassKind::Composite,
        label: "backdrop-composite",
        reads: &[Resource::Offscreen, Resource::BlueNoise],
        writes: None,
        target: Target::Surface,
        blend: Blend::Replace,
    },
    PassDescriptor {
        kind: PassKind::GridLines,
        label: "backdrop-grid-lines",
        reads: &[Resource::LineBuffer],
        writes: None,
        target: Target::Surface,
        blend: Blend::Additive,
    },
    PassDescriptor {
        kind: PassKind::Nodes,
        label: "backdrop-nodes",
        reads: &[Resource::NodeBuffer],
        writes: None,
        target: Target::Surface,
        blend: Blend::Additive,
    },
    PassDescriptor {
        kind: PassKind::Stars,
        label: "backdrop-stars",
        reads: &[Resource::StarField],
        writes: None,
        target: Target::Canvas2d,
        blend: Blend::Replace,
    },
];

pub fn descriptor(kind: PassKind) -> &'static PassDescriptor {
    match kind {
        PassKind::Background => &PIPELINE[0],
        PassKind::Composite => &PIPELINE[1],
        PassKind::GridLines => &PIPELINE[2],
        PassKind::Nodes => &PIPELINE[3],
        PassKind::Stars => &PIPELINE[4],
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOrderError {
    ReadBeforeWrite { pass: PassKind, resource: Resource },
    DuplicatePass(PassKind),
    DuplicateWriter(Resource),
}

impl std::fmt::Display for PassOrderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PassOrderError::ReadBeforeWrite { pass, resource } => write!(
                f,
                "pass {} reads {} before any pass writes it",
                pass.as_str(),
                resource.as_str()
            ),
            PassOrderError::DuplicatePass(kind) => {
                write!(f, "pass {} appears twice", kind.as_str())
            }
            PassOrderError::DuplicateWriter(resource) => {
                write!(f, "{} has more than one writer", resource.as_str())
            }
        }
    }
}

impl std::error::Error for PassOrderError {}

/// Rejects lists where a pass reads a transient resource before its writer.
pub fn validate_order(passes: &[PassDescriptor]) -> Result<(), PassOrderError> {
    let mut seen = PassSet::default();
    let mut written = ResourceSet::default();
    for pass in passes {
        if seen.contains(pass.kind) {
            return Err(PassOrderError::DuplicatePass(pass.kind));
        }
        seen.insert(pass.kind);
        for &resource in pass.reads {
            if resource.is_transient() && !written.contains(resource) {
                return Err(PassOrderError::ReadBeforeWrite {
                    pass: pass.kind,
                    resource,
                });
            }
        }
        if let Some(resource) = pass.writes {
            if written.contains(resource) {
                return Err(PassOrderError::DuplicateWriter(resource));
            }
            written.insert(resource);
        }
    }
    Ok(())
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct PassSet(u8);

impl PassSet {
    pub fn insert(&mut self, kind: PassKind) {
        self.0 |= kind.bit();
    }

    pub fn remove(&mut self, kind: PassKind) {
        self.0 &= !kind.bit();
    }

    pub fn contains(&self, kind: PassKind) -> bool {
        self.0 & kind.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct ResourceSet(u8);

impl ResourceSet {
    pub fn insert(&mut self, resource: Resource) {
        self.0 |= resource.bit();
    }

    pub fn remove(&mut self, resource: Resource) {
        self.0 &= !resource.bit();
    }

    pub fn contains(&self, resource: Resource) -> bool {
        self.0 & resource.bit() != 0
    }
}

/// What exists this frame: ready external resources and disabled passes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Availability {
    pub ready: ResourceSet,
    pub disabled: PassSet,
}

impl Availability {
    pub fn with_ready(resources: &[Resource]) -> Self {
        let mut a = Self::default();
        for &r in resources {
            a.ready.insert(r);
        }
        a
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Disabled,
    Missing(Resource),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PassAction {
    Run,
    /// Clear the target to the flat fallback color without drawing.
    ClearFallback,
    Skip(SkipReason),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LoadAction {
    Clear,
    Load,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PlannedPass {
    pub descriptor: &'static PassDescriptor,
    pub action: PassAction,
    pub load: LoadAction,
}

impl PlannedPass {
    pub fn kind(&self) -> PassKind {
        self.descriptor.kind
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePlan {
    pub passes: Vec<PlannedPass>,
    /// No GPU pass touches the surface; it still needs a fallback clear.
    pub bare_clear: bool,
}

impl FramePlan {
    /// Decides every pass for one frame.
    ///
    /// A pass runs when it is enabled and everything it reads is present.
    /// The composite falls back to a flat clear when its input is missing,
    /// and the first pass to touch the surface clears it.
    pub fn build(passes: &'static [PassDescriptor], availability: Availability) -> Self {
        let mut present = availability.ready;
        let mut surface_cleared = false;
        let mut planned = Vec::with_capacity(passes.len());

        for descriptor in passes {
            let action = if availability.disabled.contains(descriptor.kind) {
                PassAction::Skip(SkipReason::Disabled)
            } else {
                match descriptor.reads.iter().find(|r| !present.contains(**r)) {
                    None => PassAction::Run,
                    Some(_) if descriptor.kind == PassKind::Composite => {
                        PassAction::ClearFallback
                    }
                    Some(&missing) => PassAction::Skip(SkipReason::Missing(missing)),
                }
            };

            if action == PassAction::Run {
                if let Some(resource) = descriptor.writes {
                    present.insert(resource);
                }
            }

            let touches = !matches!(action, PassAction::Skip(_));
            let load = match descriptor.target {
                Target::Surface if touches && !surface_cleared => {
                    surface_cleared = true;
                    LoadAction::Clear
                }
                Target::Surface => LoadAction::Load,
                Target::Offscreen | Target::Canvas2d => LoadAction::Clear,
            };

            planned.push(PlannedPass {
                descriptor,
                action,
                load,
            });
        }

        Self {
            passes: planned,
            bare_clear: !surface_cleared,
        }
    }

    pub fn get(&self, kind: PassKind) -> Option<&PlannedPass> {
        self.passes.iter().find(|p| p.kind() == kind)
    }

    pub fn runs(&self, kind: PassKind) -> bool {
        self.get(kind).is_some_and(|p| p.action == PassAction::Run)
    }

    pub fn gpu_passes(&self) -> impl Iterator<Item = &PlannedPass> {
        self.passes.iter().filter(|p| p.descriptor.is_gpu())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn all_ready() -> Availability {
        Availability::with_ready(&[
            Resource::CloudTexture,
            Resource::BlueNoise,
            Resource::LineBuffer,
            Resource::NodeBuffer,
            Resource::StarField,
        ])
    }

    #[test]
    fn pipeline_order_is_valid() {
        assert_eq!(validate_order(&PIPELINE), Ok(()));
        for kind in PassKind::ALL {
            assert_eq!(descriptor(kind).kind, kind);
        }
    }

    #[test]
    fn composite_before_background_is_rejected() {
        let swapped = [PIPELINE[1], PIPELINE[0]];
        assert_eq!(
            validate_order(&swapped),
            Err(PassOrderError::ReadBeforeWrite {
                pass: PassKind::Composite,
                resource: Resource::Offscreen,
            })
        );
        assert_eq!(
            validate_order(&[PIPELINE[2], PIPELINE[2]]),
            Err(PassOrderError::DuplicatePass(PassKind::GridLines))
        );
    }

    #[test]
    fn everything_runs_when_ready() {
        let plan = FramePlan::build(&PIPELINE, all_ready());
        for kind in PassKind::ALL {
            assert!(plan.runs(kind), "{}", kind.as_str());
        }
        assert_eq!(plan.get(PassKind::Composite).unwrap().load, LoadAction::Clear);
        assert_eq!(plan.get(PassKind::GridLines).unwrap().load, LoadAction::Load);
        assert_eq!(plan.get(PassKind::Nodes).unwrap().load, LoadAction::Load);
        assert!(!plan.bare_clear);
    }

    #[test]
    fn missing_blue_noise_skips_background_and_falls_back() {
        let mut a = all_ready();
        a.ready.remove(Resource::BlueNoise);
        let plan = FramePlan::build(&PIPELINE, a);
        assert_eq!(
            plan.get(PassKind::Background).unwrap().action,
            PassAction::Skip(SkipReason::Missing(Resource::BlueNoise))
        );
        let composite = plan.get(PassKind::Composite).unwrap();
        assert_eq!(composite.action, PassAction::ClearFallback);
        assert_eq!(composite.load, LoadAction::Clear);
        assert!(plan.runs(PassKind::GridLines));
        assert!(plan.runs(PassKind::Stars));
    }

    #[test]
    fn disabled_composite_hands_the_clear_to_the_grid() {
        let mut a = all_ready();
        a.disabled.insert(PassKind::Composite);
        let plan = FramePlan::build(&PIPELINE, a);
        assert_eq!(
            plan.get(PassKind::Composite).unwrap().action,
            PassAction::Skip(SkipReason::Disabled)
        );
        assert_eq!(plan.get(PassKind::GridLines).unwrap().load, LoadAction::Clear);
    }

    #[test]
    fn disabled_background_starves_composite() {
        let mut a = all_ready();
        a.disabled.insert(PassKind::Background);
        let plan = FramePlan::build(&PIPELINE, a);
        assert_eq!(
            plan.get(PassKind::Composite).unwrap().action,
            PassAction::ClearFallback
        );
    }

    #[test]
    fn all_surface_passes_disabled_requests_bare_clear() {
        let mut a = all_ready();
        for kind in [PassKind::Composite, PassKind::GridLines, PassKind::Nodes] {
            a.disabled.insert(kind);
        }
        let plan = FramePlan::build(&PIPELINE, a);
        assert!(plan.bare_clear);
        assert!(plan.runs(PassKind::Stars));
        assert_eq!(plan.gpu_passes().count(), 4);
    }
}
