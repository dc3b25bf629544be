//! Render target sizes and sampler roles.

use foundation::viewport::BackingStore;

/// The cloud pass renders at this fraction of the surface size.
pub const OFFSCREEN_SCALE: f64 = 0.4;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TargetSizes {
    pub surface: BackingStore,
    pub offscreen: BackingStore,
}

impl TargetSizes {
    pub fn for_store(surface: BackingStore) -> Self {
        Self {
            surface,
            offscreen: surface.scaled(OFFSCREEN_SCALE),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Filter {
    Linear,
    Nearest,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Wrap {
    Repeat,
    ClampToEdge,
}

/// Which sampler each texture is read through.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SamplerRole {
    /// Cloud texture: smooth and tiled.
    Cloud,
    /// Blue noise: exact texels, tiled across the screen.
    BlueNoise,
    /// Offscreen sky: bilinear upscale, no wrap at the edges.
    Upscale,
}

impl SamplerRole {
    pub const ALL: [SamplerRole; 3] = [SamplerRole::Cloud, SamplerRole::BlueNoise, SamplerRole::Upscale];

    pub fn filter(self) -> Filter {
        match self {
            SamplerRole::Cloud | SamplerRole::Upscale => Filter::Linear,
            SamplerRole::BlueNoise => Filter::Nearest,
        }
    }

    pub fn wrap(self) -> Wrap {
        match self {
            SamplerRole::Cloud | SamplerRole::BlueNoise => Wrap::Repeat,
            SamplerRole::Upscale => Wrap::ClampToEdge,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SamplerRole::Cloud => "backdrop-cloud-sampler",
            SamplerRole::BlueNoise => "backdrop-blue-noise-sampler",
            SamplerRole::Upscale => "backdrop-upscale-sampler",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn offscreen_is_four_tenths_truncated() {
        let sizes = TargetSizes::for_store(BackingStore::new(2560, 1440));
        assert_eq!(sizes.offscreen, BackingStore::new(1024, 576));

        let odd = TargetSizes::for_store(BackingStore::new(1001, 3));
        assert_eq!(odd.offscreen, BackingStore::new(400, 1));
    }

    #[test]
    fn tiny_surfaces_keep_a_one_pixel_target() {
        let sizes = TargetSizes::for_store(BackingStore::new(1, 1));
        assert_eq!(sizes.offscreen, BackingStore::new(1, 1));
    }

    #[test]
    fn sampler_roles_match_texture_usage() {
        assert_eq!(SamplerRole::Cloud.filter(), Filter::Linear);
        assert_eq!(SamplerRole::Cloud.wrap(), Wrap::Repeat);
        assert_eq!(SamplerRole::BlueNoise.filter(), Filter::Nearest);
        assert_eq!(SamplerRole::Upscale.wrap(), Wrap::ClampToEdge);
    }
}
