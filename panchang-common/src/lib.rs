//! # Panchang Common Library
//!
//! Shared code for the panchang services including:
//! - The astronomical computation engine (lunar day, lunar mansion, sunrise/sunset)
//! - Regional name tables
//! - Almanac data model (skeleton days, enriched days, months)
//! - Event types and EventBus
//! - Configuration loading

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod model;
pub mod names;
pub mod region;

pub use error::{Error, Result};
pub use model::{AlmanacDay, AlmanacMonth, EnrichedDay, GeoCoordinate, MonthRequest, Phase};
pub use region::Region;
