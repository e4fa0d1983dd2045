use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// A progress report of the harness.
///
/// Reports are guaranteed to only increase. After 40 of 100 blocks have been
/// reported, the next report may say 41 or 50, but never 39. When an
/// operation succeeds, its last report always has
/// `current_block == total_blocks`.
///
/// ## See also
///
/// - [`OperationContext::with_progress`](crate::OperationContext::with_progress)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgressElement {
    /// The number of blocks completed so far.
    pub current_block: usize,
    /// The number of blocks of the whole operation.
    pub total_blocks: usize,
}
impl ProgressElement {
    /// The completed fraction in percent, `0.0..=100.0`.
    ///
    /// An operation without blocks is always complete.
    pub fn percentage(&self) -> f32 {
        if self.total_blocks == 0 {
            return 100.0;
        }
        self.current_block as f32 * 100.0 / self.total_blocks as f32
    }
}

/// A function that handles progress reports. It may be called from multiple
/// threads, but never from two at the same time.
pub(crate) type ProgressSink<'a> = &'a mut (dyn FnMut(ProgressElement) + Send);

/// Counts completed blocks and forwards the count to an optional sink.
///
/// Shared by all workers of an operation.
pub(crate) struct BlockProgress<'s, 'a> {
    sink: Option<&'s Mutex<ProgressSink<'a>>>,
    completed: AtomicUsize,
    total: usize,
}
impl<'s, 'a> BlockProgress<'s, 'a> {
    pub fn new(sink: Option<&'s Mutex<ProgressSink<'a>>>, total: usize) -> Self {
        Self {
            sink,
            completed: AtomicUsize::new(0),
            total,
        }
    }

    /// Adds `blocks` completed blocks and reports the new total.
    pub fn submit(&self, blocks: usize) {
        match self.sink {
            Some(mutex) => {
                // counting under the lock keeps reports in order
                let mut sink = mutex.lock().unwrap_or_else(PoisonError::into_inner);
                let current = self.completed.fetch_add(blocks, Ordering::Relaxed) + blocks;
                sink(ProgressElement {
                    current_block: current,
                    total_blocks: self.total,
                });
            }
            None => {
                self.completed.fetch_add(blocks, Ordering::Relaxed);
            }
        }
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage() {
        let element = ProgressElement {
            current_block: 1,
            total_blocks: 4,
        };
        assert_eq!(element.percentage(), 25.0);

        let empty = ProgressElement {
            current_block: 0,
            total_blocks: 0,
        };
        assert_eq!(empty.percentage(), 100.0);
    }

    #[test]
    fn submit_accumulates() {
        let mut reports = Vec::new();
        {
            let mut record = |element: ProgressElement| reports.push(element.current_block);
            let sink = Mutex::new(&mut record as ProgressSink);
            let progress = BlockProgress::new(Some(&sink), 10);
            progress.submit(3);
            progress.submit(1);
            progress.submit(6);
            assert_eq!(progress.completed(), 10);
        }
        assert_eq!(reports, [3, 4, 10]);
    }

    #[test]
    fn counts_without_sink() {
        let progress = BlockProgress::new(None, 5);
        progress.submit(2);
        progress.submit(2);
        assert_eq!(progress.completed(), 4);
    }
}
