pub mod playback_session;

pub use playback_session::SledPlaybackSessionRepository;
