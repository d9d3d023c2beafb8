pub mod traits;
pub mod types;

pub use traits::{MediaAccessor, MediaElement, detached_accessor, media_accessor};
pub use types::PlayerEvent;
