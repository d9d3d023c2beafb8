use std::sync::Arc;

/// The slice of a media element the analytics core reads and commands.
///
/// Implementations wrap whatever actually plays the video. The core never
/// owns the element: it reads the clock and may ask it to pause.
pub trait MediaElement: Send + Sync {
    /// Current play-head position in seconds
    fn current_time(&self) -> f64;
    /// Duration in seconds, `NaN` until metadata is loaded
    fn duration(&self) -> f64;
    fn playback_rate(&self) -> f64 {
        1.0
    }
    fn pause(&self);
}

/// Zero-argument accessor for the media element, `None` before it mounts.
pub type MediaAccessor = Arc<dyn Fn() -> Option<Arc<dyn MediaElement>> + Send + Sync>;

/// Accessor for a fixed element
pub fn media_accessor(element: Arc<dyn MediaElement>) -> MediaAccessor {
    Arc::new(move || Some(element.clone()))
}

/// Accessor for a player that never mounted
pub fn detached_accessor() -> MediaAccessor {
    Arc::new(|| None)
}
