//! Real-estate listing management: properties, offers, and their sale lifecycle.

pub mod config;
pub mod error;
pub mod listings;
pub mod telemetry;
