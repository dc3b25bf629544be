pub mod smoothing;
pub mod vec;

pub use smoothing::*;
pub use vec::*;
