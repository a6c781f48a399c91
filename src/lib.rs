//! # Bunk Booking Service
//!
//! Slot reservation engine for EV charging stations ("bunks"). Drivers list
//! the free fixed-length slots of a station for a day, book one, cancel it or
//! move it to another slot. At most one active booking exists per station and
//! slot start, even under concurrent requests.
//!
//! ## Architecture
//!
//! - **domain**: stations, slots, bookings and the repository traits
//! - **application**: booking lifecycle, availability and the completion sweep
//! - **infrastructure**: SeaORM persistence and in-memory storage
//! - **interfaces**: REST API with Swagger documentation
//! - **shared**: errors and graceful shutdown

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig};

// Re-export database types for easy access
pub use infrastructure::{init_database, DatabaseConfig, SeaOrmRepositoryProvider};

// Re-export API router
pub use interfaces::http::{create_api_router, ApiState};
