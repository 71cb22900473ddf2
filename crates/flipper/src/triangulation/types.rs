//! Index types shared by the triangulation modules.

/// Edge label `0..ζ`.
pub type Edge = usize;

/// Three edge labels read anticlockwise.
pub type Triangle = [Edge; 3];

/// Side `side` of triangle `triangle`: one of the two places an edge is glued.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot {
    pub triangle: usize,
    pub side: usize,
}

/// The vertex of `triangle` opposite `side`.
///
/// Corner `i` sits between side `i + 1` (arriving) and side `i + 2`
/// (leaving, anticlockwise), indices mod 3.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Corner {
    pub triangle: usize,
    pub side: usize,
}

impl Corner {
    #[inline]
    pub fn new(triangle: usize, side: usize) -> Self {
        Self { triangle, side }
    }
    /// The side leaving this corner anticlockwise.
    #[inline]
    pub fn leaving(self) -> Slot {
        Slot {
            triangle: self.triangle,
            side: (self.side + 2) % 3,
        }
    }
}

impl Slot {
    #[inline]
    pub fn new(triangle: usize, side: usize) -> Self {
        Self { triangle, side }
    }
}
