//! HTTP API handlers for panchang-sync

pub mod almanac;
pub mod cache;
pub mod health;
pub mod settings;
pub mod sse;

pub use almanac::almanac_routes;
pub use cache::cache_routes;
pub use health::health_routes;
pub use settings::settings_routes;
pub use sse::event_stream;
