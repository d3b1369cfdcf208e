//! Cross-thread upload submission
//!
//! Resource construction data may be prepared off-thread (image decode,
//! staging population); the bytes are handed over through this queue and
//! applied by the render thread at the drain point in `begin_frame`.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use super::handle::Handle;

/// Bytes staged by a worker thread for a table-owned resource
#[derive(Debug)]
pub struct PendingUpload {
    /// Target resource
    pub handle: Handle,
    /// Byte offset within the target
    pub offset: usize,
    /// Prepared payload
    pub bytes: Vec<u8>,
}

/// Thread-safe handle to the table's upload queue
///
/// Clone freely and move clones to worker threads. Submissions are not
/// validated here; bounds are checked when the render thread applies
/// them, and uploads whose target handle has been released by then are
/// cancelled.
#[derive(Clone, Default)]
pub struct UploadQueue {
    inner: Arc<Mutex<VecDeque<PendingUpload>>>,
}

impl UploadQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Stage `bytes` for upload into `handle` at `offset`
    pub fn submit(&self, handle: Handle, bytes: Vec<u8>, offset: usize) {
        let mut queue = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        queue.push_back(PendingUpload { handle, offset, bytes });
    }

    /// Number of uploads waiting for the next drain
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn take_all(&self) -> Vec<PendingUpload> {
        let mut queue = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        queue.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submissions_drain_in_fifo_order() {
        let queue = UploadQueue::new();
        queue.submit(Handle::new(0, 0), vec![1], 0);
        queue.submit(Handle::new(1, 0), vec![2], 4);

        let drained = queue.take_all();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].handle, Handle::new(0, 0));
        assert_eq!(drained[1].offset, 4);
        assert!(queue.is_empty());
    }

    #[test]
    fn clones_share_the_same_queue() {
        let queue = UploadQueue::new();
        let clone = queue.clone();

        let worker = std::thread::spawn(move || {
            clone.submit(Handle::new(5, 1), vec![0; 16], 0);
        });
        worker.join().expect("worker thread panicked");

        assert_eq!(queue.len(), 1);
    }
}
