//! Error types for activity-engine operations.

use thiserror::Error;

/// Illegal call order on an iterator or calculator.
///
/// The legal sequence is `add_span* -> finalize -> process* -> release`, with
/// registration only before the first `advance`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Misuse {
    #[error("cannot add spans after finalize")]
    SpanAfterFinalize,

    #[error("finalize was never called")]
    NotFinalized,

    #[error("cannot release a calculator before finalize")]
    ReleaseBeforeFinalize,

    #[error("calculator was already released")]
    Released,

    #[error("cannot register sub-iterators after the walk has started")]
    RegisterAfterStart,
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Misuse: {0}")]
    Misuse(#[from] Misuse),

    #[error("Invalid step: {0} seconds (must be at least 1)")]
    InvalidStep(i64),

    #[error("Invalid range: end {end} is before start {start}")]
    InvalidRange { start: i64, end: i64 },

    #[error("Handle does not belong to this iterator")]
    ForeignHandle,

    #[error("Timestamp out of range: {0}")]
    TimestampOutOfRange(i64),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
