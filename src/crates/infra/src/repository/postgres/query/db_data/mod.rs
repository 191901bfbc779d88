pub mod playback_history;
pub mod song;
