pub mod playback_history;

pub mod registry;
pub use registry::register_handlers;
