//! Stowage Storage Library
//!
//! Object-store clients and the per-container `Bucket` wrapper. Each client
//! is configured for exactly one container with its own credentials; there
//! is no ambient credential lookup.
//!
//! # Key format
//!
//! Objects are stored under bare file names assigned by the server
//! (`{7 random chars}.{suffix}`). Keys must not contain path separators or
//! `..`; validation is centralized in the `keys` module so every backend
//! and the `Bucket` wrapper agree.

pub mod bucket;
pub mod factory;
pub(crate) mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use bucket::{Bucket, BucketSet};
pub use factory::build_bucket_set;
#[cfg(feature = "storage-local")]
pub use local::LocalStoreClient;
#[cfg(feature = "storage-s3")]
pub use s3::S3StoreClient;
pub use traits::{ObjectEntry, StoreClient, StoreError, StoreResult};
