//! Mapping classes of punctured surfaces through ideal triangulations.
//!
//! Layers, leaves first: `matrix` → `triangulation` → `number` →
//! `lamination` → `encoding` → `invariant` → `reducibility` → `splitting`,
//! with `classify` on top and `surfaces` as a small library of examples.
//!
//! API Policy
//! - There is no stable public API; `api` is the curated surface for the CLI,
//!   benches and demos. Breaking changes are fine when they improve the design.

pub mod api;
pub mod cfg;
pub mod classify;
pub mod encoding;
pub mod error;
pub mod invariant;
pub mod lamination;
pub mod matrix;
pub mod number;
pub mod progress;
pub mod reducibility;
pub mod splitting;
pub mod surfaces;
pub mod triangulation;
mod util;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use error::{FlipperError, Result};

/// Common exports for quick imports in callers.
pub mod prelude {
    pub use crate::cfg::{ClassifyCfg, InvariantCfg, PolytopeCfg, SplittingCfg};
    pub use crate::classify::NielsenThurston;
    pub use crate::encoding::Encoding;
    pub use crate::error::{FlipperError, Result};
    pub use crate::lamination::Lamination;
    pub use crate::number::{AlgebraicCapability, Number, NumberCapability};
    pub use crate::progress::{NoProgress, Progress};
    pub use crate::surfaces::Surface;
    pub use crate::triangulation::Triangulation;
}
