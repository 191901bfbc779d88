pub mod playback_history;
