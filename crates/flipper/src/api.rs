//! Curated API for the CLI, benches and demos (UNSTABLE).
//!
//! Prefer these re-exports over reaching into module paths; they move when the
//! modules do.

// Combinatorics
pub use crate::triangulation::{Corner, Edge, Isometry, Triangle, Triangulation};
// Weights and numbers
pub use crate::lamination::Lamination;
pub use crate::number::{AlgebraicCapability, FieldElement, Number, NumberCapability, NumberField};
// Maps
pub use crate::encoding::{encode_flip, encode_flips, encode_isometry, Encoding, PartialFunction};
// Searches
pub use crate::classify::NielsenThurston;
pub use crate::invariant::InvariantLamination;
pub use crate::reducibility::Reducibility;
pub use crate::splitting::{replay, SplittingSequence, Step};
// Knobs
pub use crate::cfg::{ClassifyCfg, InvariantCfg, PolytopeCfg, SplittingCfg};
pub use crate::progress::{FnProgress, NoProgress, Progress, SubRange};
// Example surfaces
pub use crate::surfaces::{by_name as surface_by_name, doubled_polygon, s_0_3, s_1_1, s_1_2, Surface, Twist};
