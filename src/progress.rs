//! Progress reporting for organize and undo passes.

/// Receives `(current, total)` updates while a pass runs.
///
/// `current` counts processed items starting at 1; `total` stays fixed for the
/// whole pass. Any `FnMut(usize, usize)` closure is a sink, so callers that do
/// not care can pass `&mut |_, _| {}`.
pub trait ProgressSink {
    fn update(&mut self, current: usize, total: usize);
}

impl<F> ProgressSink for F
where
    F: FnMut(usize, usize),
{
    fn update(&mut self, current: usize, total: usize) {
        self(current, total)
    }
}
