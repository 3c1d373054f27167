//! Error types for the pipeline runtime core.
//!
//! Each layer gets its own enum so callers can match on exactly the failures
//! that layer can produce; the `#[from]` chains let `?` carry a lower-layer
//! error up through `StageError` into `PipelineError` without a manual map.

use thiserror::Error;

/// Errors from the manual-reset [`crate::sync::Event`] primitive.
///
/// `Event::new` cannot fail in safe Rust (`Mutex`/`Condvar` construction is
/// infallible), so the only member is the one real failure mode of
/// `std::sync::Mutex`: a waiter panicking while holding the lock.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("event mutex poisoned by a panicking waiter")]
    Poisoned,
}

/// Errors from [`crate::sync::HandoffBuffer`].
#[derive(Debug, Error)]
pub enum BufferError {
    #[error("capacity must be positive, got {0}")]
    InvalidCapacity(usize),
    #[error("buffer is shutting down")]
    ShuttingDown,
    #[error(transparent)]
    Event(#[from] EventError),
}

/// Errors from [`crate::stage::StageWorker`].
#[derive(Debug, Error)]
pub enum StageError {
    #[error("stage not initialized")]
    NotInitialized,
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("failed to spawn worker thread: {0}")]
    Spawn(String),
    #[error(transparent)]
    Buffer(#[from] BufferError),
    #[error("downstream submit failed: {0}")]
    DownstreamSubmit(String),
}

/// Errors from [`crate::pipeline::Pipeline`] construction and execution.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid capacity {0}: must be in 1..=1_000_000")]
    InvalidCapacity(usize),
    #[error("unknown stage '{0}'")]
    UnknownStage(String),
    #[error("at least one stage is required")]
    EmptyPipeline,
    #[error("stage '{name}' failed to initialize: {source}")]
    StageInit {
        name: String,
        #[source]
        source: StageError,
    },
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Stage(#[from] StageError),
}

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
