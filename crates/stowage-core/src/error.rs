//! Shared error types
//!
//! Configuration problems are deployment defects: they are surfaced
//! immediately and never retried. Each crate layers its own error enum on
//! top of these (store, ledger, processing, service errors).

/// Errors raised while resolving or validating container configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no container named '{0}' is configured")]
    UnknownContainer(String),

    #[error("container '{name}' is misconfigured: {reason}")]
    InvalidContainer { name: String, reason: String },

    #[error(
        "the global container registry is unavailable in test builds; \
         pass a ContainerConfig to the constructor instead"
    )]
    TestContext,

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
