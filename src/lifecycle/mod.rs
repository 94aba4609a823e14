//! Runtime orchestration and lifecycle management.
//!
//! # Main Components
//!
//! - [`AppSystem`] - Spawns the store actor and wires the sample controllers to it
//! - [`setup_tracing`] - Initializes the tracing/logging infrastructure

pub mod app_system;
pub mod tracing;

pub use self::app_system::*;
pub use self::tracing::setup_tracing;
