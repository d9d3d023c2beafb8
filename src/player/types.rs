use serde::{Deserialize, Serialize};

/// Playback events forwarded from the media element, in dispatch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerEvent {
    Play,
    Pause,
    /// Seek started; the play-head jump is not watch time
    Seeking,
    /// Seek finished at the element's new position
    Seeked,
    Ended,
}

impl PlayerEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerEvent::Play => "play",
            PlayerEvent::Pause => "pause",
            PlayerEvent::Seeking => "seeking",
            PlayerEvent::Seeked => "seeked",
            PlayerEvent::Ended => "ended",
        }
    }
}
