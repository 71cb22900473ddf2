//! Search budgets and tolerances.
//!
//! Policy
//! - Defaults are fixed constants chosen for the surfaces in `surfaces`; the
//!   structs exist so experiments can raise budgets without touching call sites.

/// Exact polytope feasibility.
#[derive(Clone, Copy, Debug)]
pub struct PolytopeCfg {
    /// Largest number of `(w-1)`-row subsets enumerated by the cofactor method
    /// before switching to the exact simplex.
    pub enumeration_limit: u64,
}

impl Default for PolytopeCfg {
    fn default() -> Self {
        Self {
            enumeration_limit: 4096,
        }
    }
}

/// Perron–Frobenius iteration for invariant laminations.
#[derive(Clone, Copy, Debug)]
pub struct InvariantCfg {
    pub min_iterations: usize,
    pub max_iterations: usize,
    /// `R` in the projective closeness test `|p·ΣB − q·ΣA|·R < ΣA·ΣB`.
    pub closeness: i64,
}

impl Default for InvariantCfg {
    fn default() -> Self {
        Self {
            min_iterations: 4,
            max_iterations: 100,
            closeness: 10_000,
        }
    }
}

/// Splitting sequence search.
#[derive(Clone, Copy, Debug)]
pub struct SplittingCfg {
    pub max_flips: usize,
    /// Projective weights are floored to multiples of `1 / key_resolution`
    /// before hashing.
    pub key_resolution: i64,
}

impl Default for SplittingCfg {
    fn default() -> Self {
        Self {
            max_flips: 5000,
            key_resolution: 100_000_000,
        }
    }
}

/// All budgets used by the Nielsen–Thurston classification.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClassifyCfg {
    pub polytope: PolytopeCfg,
    pub invariant: InvariantCfg,
    pub splitting: SplittingCfg,
}
