use thiserror::Error;

pub type Result<T> = std::result::Result<T, NeedsError>;

/// Failure taxonomy for the needs engine.
///
/// Configuration problems never surface through this type at load time; the
/// loader degrades to built-in defaults and logs instead. The variant exists
/// for collaborators that want to report a broken config snapshot explicitly.
#[derive(Debug, Error)]
pub enum NeedsError {
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Bad call input (unknown tracker, non-finite value, missing character).
    /// The operation aborts before any write.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A store write or read failed. Batch operations catch this per
    /// character and keep going.
    #[error("persistence failure: {0}")]
    Persistence(String),

    /// The effect collaborator rejected a create/delete batch.
    #[error("effect resolution failure: {0}")]
    EffectResolution(String),
}
