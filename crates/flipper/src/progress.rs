//! Progress reporting and cooperative cancellation for long searches.
//!
//! The reducibility and splitting searches call `report` and `should_abort`
//! once per node / per step. Returning `true` from `should_abort` makes the
//! search return `FlipperError::Aborted`.

use crate::error::{FlipperError, Result};

pub trait Progress {
    /// Fraction of the search space covered so far, in `[0, 1]`, non-decreasing.
    fn report(&mut self, _fraction: f64) {}
    fn should_abort(&mut self) -> bool {
        false
    }
}

/// Silent, never aborts.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl Progress for NoProgress {}

/// Adapter over a pair of closures.
pub struct FnProgress<R, A> {
    pub report: R,
    pub abort: A,
}

impl<R: FnMut(f64), A: FnMut() -> bool> Progress for FnProgress<R, A> {
    fn report(&mut self, fraction: f64) {
        (self.report)(fraction)
    }
    fn should_abort(&mut self) -> bool {
        (self.abort)()
    }
}

/// Report and poll in one call; used at every safe point.
pub(crate) fn checkpoint(progress: &mut dyn Progress, fraction: f64) -> Result<()> {
    progress.report(fraction.clamp(0.0, 1.0));
    if progress.should_abort() {
        return Err(FlipperError::Aborted);
    }
    Ok(())
}

/// Maps a child search's `[0, 1]` onto `[start, end]` of its parent, so
/// searches run back to back still report a non-decreasing fraction.
pub struct SubRange<'a> {
    inner: &'a mut dyn Progress,
    start: f64,
    end: f64,
}

impl<'a> SubRange<'a> {
    pub fn new(inner: &'a mut dyn Progress, start: f64, end: f64) -> Self {
        Self { inner, start, end }
    }
}

impl Progress for SubRange<'_> {
    fn report(&mut self, fraction: f64) {
        self.inner
            .report(self.start + (self.end - self.start) * fraction.clamp(0.0, 1.0))
    }
    fn should_abort(&mut self) -> bool {
        self.inner.should_abort()
    }
}
