//! Running closures on the thread that owns the GPU context.
//!
//! All GPU work happens on one rendering thread. Other threads (UI, loaders)
//! post closures through a [`ContextTaskPoster`]; the rendering thread calls
//! [`ContextTaskQueue::drain`] once per frame and runs them in FIFO order.
//!
//! ```
//! use ragl_graphics::backend::DummyContext;
//! use ragl_graphics::context_thread::ContextTaskQueue;
//!
//! let context = DummyContext::new();
//! let queue = ContextTaskQueue::new();
//! let poster = queue.poster();
//!
//! let worker = std::thread::spawn(move || {
//!     poster.post_and_wait(|context| context.name().to_string()).unwrap()
//! });
//! while !worker.is_finished() {
//!     queue.drain(&context);
//! }
//! assert_eq!(worker.join().unwrap(), "Dummy Context");
//! ```

use std::cell::Cell;
use std::sync::mpsc;

use parking_lot::Mutex;

use crate::backend::GpuContext;
use crate::error::GraphicsError;

/// Type-erased closure run on the rendering thread.
pub type ContextWork = Box<dyn FnOnce(&dyn GpuContext) + Send>;

/// Completion handle of a posted closure.
#[derive(Debug)]
pub struct TaskTicket {
    done: mpsc::Receiver<()>,
    completed: Cell<bool>,
}

impl TaskTicket {
    /// Block until the closure ran.
    ///
    /// Fails if the queue was dropped before running it.
    pub fn wait(self) -> Result<(), GraphicsError> {
        if self.completed.get() {
            return Ok(());
        }
        self.done
            .recv()
            .map_err(|_| GraphicsError::Internal("context task dropped before it ran".into()))
    }

    /// Whether the closure already ran.
    pub fn is_done(&self) -> bool {
        if !self.completed.get() && self.done.try_recv().is_ok() {
            self.completed.set(true);
        }
        self.completed.get()
    }
}

/// Sending side of a [`ContextTaskQueue`]. Cheap to clone and `Send`.
#[derive(Debug, Clone)]
pub struct ContextTaskPoster {
    sender: mpsc::Sender<ContextWork>,
}

impl ContextTaskPoster {
    /// Queue a closure for the rendering thread.
    pub fn post(&self, work: impl FnOnce(&dyn GpuContext) + Send + 'static) -> TaskTicket {
        let (done_tx, done) = mpsc::sync_channel(1);
        let work: ContextWork = Box::new(move |context| {
            work(context);
            let _ = done_tx.send(());
        });
        // A closed queue drops the closure, and with it `done_tx`, which
        // makes the ticket fail.
        let _ = self.sender.send(work);
        TaskTicket {
            done,
            completed: Cell::new(false),
        }
    }

    /// Queue a closure and block until the rendering thread returned its
    /// result.
    ///
    /// Calling this on the rendering thread deadlocks.
    pub fn post_and_wait<R: Send + 'static>(
        &self,
        work: impl FnOnce(&dyn GpuContext) -> R + Send + 'static,
    ) -> Result<R, GraphicsError> {
        let (result_tx, result_rx) = mpsc::sync_channel(1);
        self.post(move |context| {
            let _ = result_tx.send(work(context));
        });
        result_rx
            .recv()
            .map_err(|_| GraphicsError::Internal("context task dropped before it ran".into()))
    }
}

/// FIFO queue of closures for the rendering thread.
pub struct ContextTaskQueue {
    poster: ContextTaskPoster,
    receiver: Mutex<mpsc::Receiver<ContextWork>>,
}

impl Default for ContextTaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextTaskQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            poster: ContextTaskPoster { sender },
            receiver: Mutex::new(receiver),
        }
    }

    /// Get a handle other threads can post with.
    pub fn poster(&self) -> ContextTaskPoster {
        self.poster.clone()
    }

    /// Queue a closure. See [`ContextTaskPoster::post`].
    pub fn post(&self, work: impl FnOnce(&dyn GpuContext) + Send + 'static) -> TaskTicket {
        self.poster.post(work)
    }

    /// Run every queued closure in posting order. Returns how many ran.
    ///
    /// Closures posted while draining run in the same call.
    pub fn drain(&self, context: &dyn GpuContext) -> usize {
        let receiver = self.receiver.lock();
        let mut count = 0;
        while let Ok(work) = receiver.try_recv() {
            work(context);
            count += 1;
        }
        if count > 0 {
            log::trace!("Ran {} context tasks", count);
        }
        count
    }
}

impl std::fmt::Debug for ContextTaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextTaskQueue").finish_non_exhaustive()
    }
}

// Ensure the queue can be shared with worker threads
static_assertions::assert_impl_all!(ContextTaskQueue: Send, Sync);
static_assertions::assert_impl_all!(ContextTaskPoster: Send);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DummyContext;
    use std::sync::Arc;

    #[test]
    fn test_drain_runs_in_order() {
        let context = DummyContext::new();
        let queue = ContextTaskQueue::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        for index in 0..3 {
            let log = log.clone();
            queue.post(move |_| log.lock().push(index));
        }
        assert_eq!(queue.drain(&context), 3);
        assert_eq!(*log.lock(), vec![0, 1, 2]);
        assert_eq!(queue.drain(&context), 0);
    }

    #[test]
    fn test_ticket_completes_after_drain() {
        let context = DummyContext::new();
        let queue = ContextTaskQueue::new();
        let ticket = queue.post(|_| {});
        assert!(!ticket.is_done());
        queue.drain(&context);
        assert!(ticket.is_done());
        assert!(ticket.wait().is_ok());
    }

    #[test]
    fn test_dropped_queue_fails_ticket() {
        let queue = ContextTaskQueue::new();
        let ticket = queue.post(|_| {});
        drop(queue);
        assert!(ticket.wait().is_err());
    }

    #[test]
    fn test_post_and_wait_from_worker() {
        let context = DummyContext::new();
        let queue = ContextTaskQueue::new();
        let poster = queue.poster();
        let worker = std::thread::spawn(move || poster.post_and_wait(|context| context.name().len()));
        while !worker.is_finished() {
            queue.drain(&context);
            std::thread::yield_now();
        }
        assert_eq!(worker.join().unwrap().unwrap(), "Dummy Context".len());
    }
}
