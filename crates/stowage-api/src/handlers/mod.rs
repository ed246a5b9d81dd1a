//! HTTP handlers.

pub mod claim;
pub mod fetch_file;
pub mod health;
pub mod sign_upload;
