pub mod event;
pub mod playback_session;
pub mod song;
pub mod value;
