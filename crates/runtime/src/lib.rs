pub mod debounce;
pub mod event_bus;
pub mod frame;
pub mod render_loop;
pub mod stats;

pub use debounce::*;
pub use event_bus::*;
pub use frame::*;
pub use render_loop::*;
pub use stats::*;
