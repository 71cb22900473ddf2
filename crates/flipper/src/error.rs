//! Error kinds raised by the engine.
//!
//! - `Assumption`: a mathematical precondition was false (not a curve, not
//!   filling, periodic where a pseudo-Anosov was required, ...). Never retried.
//! - `Computation`: a bounded search ran out of budget. Evidence, not proof;
//!   callers may retry with a larger budget.
//! - `Approximation`: a finite-precision comparison could not be decided.
//! - `Aborted`: the caller's cancellation check fired.
//!
//! Callers cannot tell "reducible" from "needs more iterations" from a
//! `Computation` error raised by the invariant lamination search alone.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlipperError {
    #[error("assumption failed: {0}")]
    Assumption(String),
    #[error("computation did not terminate: {0}")]
    Computation(String),
    #[error("insufficient precision: {0}")]
    Approximation(String),
    #[error("search aborted")]
    Aborted,
}

pub type Result<T> = std::result::Result<T, FlipperError>;

impl FlipperError {
    pub fn assumption(msg: impl Into<String>) -> Self {
        Self::Assumption(msg.into())
    }
    pub fn computation(msg: impl Into<String>) -> Self {
        Self::Computation(msg.into())
    }
    pub fn approximation(msg: impl Into<String>) -> Self {
        Self::Approximation(msg.into())
    }
}
