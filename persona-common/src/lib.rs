//! # Persona Common Library
//!
//! Shared code for the persona discovery services including:
//! - Error types
//! - Analytics event types (DiscoveryEvent enum) and the EventBus
//! - Configuration file resolution and TOML loading
//! - Tracing subscriber initialisation

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
pub use events::{DiscoveryEvent, EventBus};
