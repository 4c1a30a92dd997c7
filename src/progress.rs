/// Receives `(done, total)` snapshots from long-running operations.
/// `total` is 0 when the service did not declare it.
pub trait Progress {
    fn report(&mut self, done: usize, total: usize);
}

impl<F: FnMut(usize, usize)> Progress for F {
    fn report(&mut self, done: usize, total: usize) {
        self(done, total)
    }
}

/// Sink for callers that don't track progress.
pub struct NoProgress;

impl Progress for NoProgress {
    fn report(&mut self, _done: usize, _total: usize) {}
}
