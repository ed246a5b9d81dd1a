//! Pure image normalization for the resize pipeline.
//!
//! No IO happens here; callers hand in encoded bytes and get normalized
//! JPEG bytes back. Download, scratch management and ledger updates live
//! in the service layer.

pub mod normalize;

pub use normalize::{ImageNormalizer, NormalizedImage, ProcessingError, MAX_DIMENSION};
