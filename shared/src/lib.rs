//! Shared library for the PrizePilot dashboard
//!
//! This library contains the pieces the web service and its tests share:
//! - Account models and the external game API wire types
//! - Configuration loading
//! - The application error type
//! - Lenient JSON helpers for the game server's payloads

pub mod config;
pub mod error;
pub mod models;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
pub use models::*;
pub use types::*;
