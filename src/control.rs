//! Cooperative cancellation and progress reporting.
//!
//! Both are plain traits with blanket implementations for closures, so a
//! caller can pass `&|fraction| ...` or `&|| flag.get()` directly. The
//! pipeline only ever calls them; any state they keep belongs to the caller.

/// Receives progress notifications as a fraction in `[0, 1]`.
pub trait Progress {
    fn notify(&self, fraction: f32);
}

impl<F> Progress for F
where
    F: Fn(f32),
{
    fn notify(&self, fraction: f32) {
        self(fraction)
    }
}

/// Progress sink that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn notify(&self, _fraction: f32) {}
}

/// Polled by the pipeline; returning `true` requests a cooperative stop.
pub trait Cancellation {
    fn is_cancelled(&self) -> bool;
}

impl<F> Cancellation for F
where
    F: Fn() -> bool,
{
    fn is_cancelled(&self) -> bool {
        self()
    }
}

/// Cancellation predicate that never fires.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancel;

impl Cancellation for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Result of a stage that can be cancelled midway.
///
/// A cancelled stage still hands back what it completed so the caller can
/// release it deterministically.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow<T> {
    Finished(T),
    Cancelled(T),
}

impl<T> Flow<T> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Flow::Cancelled(_))
    }

    /// The value regardless of how the stage ended.
    pub fn into_inner(self) -> T {
        match self {
            Flow::Finished(value) | Flow::Cancelled(value) => value,
        }
    }

    /// The value only if the stage ran to completion.
    pub fn finished(self) -> Option<T> {
        match self {
            Flow::Finished(value) => Some(value),
            Flow::Cancelled(_) => None,
        }
    }
}

/// Maps a stage's own `[0, 1]` progress into a slice of the overall range.
pub(crate) struct StageProgress<'a> {
    inner: &'a dyn Progress,
    start: f32,
    span: f32,
}

impl<'a> StageProgress<'a> {
    pub(crate) fn new(inner: &'a dyn Progress, start: f32, end: f32) -> Self {
        Self {
            inner,
            start,
            span: end - start,
        }
    }
}

impl Progress for StageProgress<'_> {
    fn notify(&self, fraction: f32) {
        self.inner
            .notify(self.start + self.span * fraction.clamp(0.0, 1.0));
    }
}
