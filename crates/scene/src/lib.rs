//! Scene state for the backdrop: camera, tint, grid lattice, starfield and
//! the cloud texture. Pure data and math; no browser or GPU types.

pub mod backdrop;
pub mod camera;
pub mod color;
pub mod grid;
pub mod noise;
pub mod scroll;
pub mod stars;

pub use backdrop::*;
pub use camera::*;
pub use color::*;
pub use grid::*;
pub use noise::*;
pub use scroll::*;
pub use stars::*;
