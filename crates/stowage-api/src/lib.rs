//! Stowage API Library
//!
//! HTTP surface for the upload lifecycle: upload authorization, claims,
//! private file delivery, and the wiring that starts the background sweeps.

pub mod error;
pub mod handlers;
pub mod setup;
pub mod state;
pub mod telemetry;
pub mod usage;

// Re-exports
pub use error::{ApiError, ErrorResponse};
pub use state::AppState;
pub use usage::StoredImage;
