//! edtrack library entry points.
//!
//! This crate tracks chat-identity to commander bindings and named points of
//! interest, talks to the EDSM API for positions, system data and flight
//! logs, and derives travel analytics (jump rate, average jump distance,
//! travel estimates) on top. Higher-level consumers (the CLI, chat bots)
//! should only depend on the functions exported here instead of
//! reimplementing behavior.
//!

#![deny(warnings)]

pub mod analytics;
pub mod edsm;
pub mod error;
pub mod geometry;
pub mod registry;
pub mod resolver;

pub use analytics::{
    extract_system_sequence, FlightAnalytics, TravelEstimate, DEFAULT_IDLE_THRESHOLD_SECS,
};
pub use edsm::{ApiCategory, EdsmClient, BATCH_COORDINATE_LIMIT};
pub use error::{Error, Result};
pub use geometry::{Coordinate, ORIGIN};
pub use registry::{default_data_dir, CommanderBinding, PointOfInterest, RegistryStore};
pub use resolver::{distance_between, locate, resolve_coordinates, round2, system_summary};
