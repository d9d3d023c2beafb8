//! End-to-end flows through the public API.
//!
//! Session lifecycle tests run on a paused tokio clock. Delivery tests talk
//! to a mockito server standing in for the analytics backend, so they use
//! real time.

mod delivery_flow;
mod heatmap_flow;
mod session_flow;
