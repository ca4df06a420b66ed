//! Background worker shared by every writer
//!
//! A worker is one bounded multi-producer queue drained by exactly one named
//! thread. Producers never block: a full queue drops the item. Closing drops
//! the sending side so the thread drains what is already queued and exits;
//! the caller waits for that on a completion channel owned by this worker
//! instance, up to a bounded timeout.

use super::error::{LoggerError, Result};
use super::metrics::WriterMetrics;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError, TrySendError};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Default number of records a writer buffers before dropping.
pub const DEFAULT_QUEUE_CAPACITY: usize = 32;

/// Default upper bound on how long `close` waits for a worker.
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

pub(crate) struct Worker<T> {
    name: String,
    sender: RwLock<Option<Sender<T>>>,
    /// Never carries a value; disconnects when the thread exits.
    done: Receiver<()>,
    handle: Mutex<Option<JoinHandle<()>>>,
    metrics: Arc<WriterMetrics>,
    close_timeout: Duration,
}

impl<T: Send + 'static> Worker<T> {
    pub(crate) fn spawn<F>(
        name: &str,
        capacity: usize,
        close_timeout: Duration,
        metrics: Arc<WriterMetrics>,
        body: F,
    ) -> Result<Self>
    where
        F: FnOnce(Receiver<T>) + Send + 'static,
    {
        let (sender, receiver) = bounded(capacity);
        let (done_tx, done) = bounded::<()>(0);

        let handle = thread::Builder::new()
            .name(format!("fanlog-{}", name))
            .spawn(move || {
                // Dropped however `body` returns, unwinding included.
                let _done = done_tx;
                body(receiver);
            })
            .map_err(|e| {
                LoggerError::io_operation(
                    "spawning writer thread",
                    format!("cannot start the {} worker", name),
                    e,
                )
            })?;

        Ok(Self {
            name: name.to_string(),
            sender: RwLock::new(Some(sender)),
            done,
            handle: Mutex::new(Some(handle)),
            metrics,
            close_timeout,
        })
    }

    /// Enqueue without blocking. Returns `false` when the item was dropped.
    pub(crate) fn try_send(&self, item: T) -> bool {
        let guard = self.sender.read();
        let accepted = match guard.as_ref() {
            Some(sender) => match sender.try_send(item) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => false,
            },
            None => false,
        };

        if accepted {
            self.metrics.record_enqueued();
        } else {
            self.metrics.record_dropped();
        }
        accepted
    }

    pub(crate) fn is_running(&self) -> bool {
        !matches!(self.done.try_recv(), Err(TryRecvError::Disconnected))
    }

    pub(crate) fn metrics(&self) -> &WriterMetrics {
        &self.metrics
    }

    /// Stop accepting records and wait for the thread to drain and exit.
    ///
    /// Returns `true` when the thread finished within the close timeout.
    /// Later calls do not wait again.
    pub(crate) fn close(&self) -> bool {
        let Some(sender) = self.sender.write().take() else {
            return !self.is_running();
        };
        drop(sender);

        match self.done.recv_timeout(self.close_timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if let Some(handle) = self.handle.lock().take() {
                    if handle.join().is_err() {
                        eprintln!("[LOGGER ERROR] {} writer thread panicked", self.name);
                    }
                }
                true
            }
            Err(RecvTimeoutError::Timeout) => {
                eprintln!(
                    "[LOGGER WARNING] {} writer did not finish within {:?}. \
                     Some logs may be lost.",
                    self.name, self.close_timeout
                );
                false
            }
        }
    }
}

impl<T> Drop for Worker<T> {
    fn drop(&mut self) {
        // Closing the channel lets the thread exit on its own; a stuck thread is
        // detached rather than waited on a second time.
        if let Some(sender) = self.sender.get_mut().take() {
            drop(sender);
            let _ = self.done.recv_timeout(self.close_timeout);
        }
    }
}
