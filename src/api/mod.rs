mod client;
mod errors;

pub use client::AnalyticsApi;
pub use errors::ApiError;
