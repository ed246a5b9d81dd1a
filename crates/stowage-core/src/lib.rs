//! Stowage Core Library
//!
//! This crate provides the domain models, container configuration, usage
//! contracts, and shared error types used by every other stowage component.

pub mod config;
pub mod error;
pub mod file_types;
pub mod models;
pub mod naming;
pub mod usage;

// Re-export commonly used types
pub use config::{global_container, install_global_containers, Config, ContainerConfig};
pub use error::ConfigError;
pub use file_types::{media_type_for_file_name, suffix_for_media_type, FileTypeError};
pub use models::{ClaimedFile, NewClaimedFile, PendingUpload};
pub use usage::{FileUsage, ImageUsage, UsageRegistry};
