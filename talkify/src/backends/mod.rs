// Local speech and audio playback backends

pub mod player;
pub mod say;

pub use player::CommandSink;
pub use say::SayPlatform;
