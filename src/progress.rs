//! Batch progress reporting.
//!
//! A batch run reports progress through a [`ProgressSink`]; the caller
//! consumes it through the paired [`ProgressSubscription`], a finite
//! iterator that ends when the run finishes and every sink is dropped.
//!
//! Unsubscribing ([`ProgressSubscription::cancel`] or dropping the
//! subscription) only stops delivery. Work already dispatched keeps running
//! and the batch result is unaffected.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender, channel as std_channel};

/// One progress record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub processed: usize,
    pub total: usize,
    /// `processed / total * 100`, 100 for an empty batch.
    pub percentage: f64,
}

impl Progress {
    pub fn new(processed: usize, total: usize) -> Self {
        let percentage = if total == 0 {
            100.0
        } else {
            processed as f64 / total as f64 * 100.0
        };
        Self {
            processed,
            total,
            percentage,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.processed >= self.total
    }
}

/// Sending half, handed to the batch coordinator.
#[derive(Debug, Clone)]
pub struct ProgressSink {
    tx: Option<Sender<Progress>>,
    cancelled: Arc<AtomicBool>,
}

impl ProgressSink {
    /// A sink that discards every record.
    pub fn disabled() -> Self {
        Self {
            tx: None,
            cancelled: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn send(&self, progress: Progress) {
        if self.cancelled.load(Ordering::Relaxed) {
            return;
        }
        if let Some(tx) = &self.tx {
            // Receiver gone means nobody is listening any more.
            let _ = tx.send(progress);
        }
    }
}

/// Receiving half: yields progress records until the run completes.
#[derive(Debug)]
pub struct ProgressSubscription {
    rx: Receiver<Progress>,
    cancelled: Arc<AtomicBool>,
}

impl ProgressSubscription {
    /// Stop receiving. Pending records are discarded.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

impl Iterator for ProgressSubscription {
    type Item = Progress;

    fn next(&mut self) -> Option<Progress> {
        if self.is_cancelled() {
            return None;
        }
        self.rx.recv().ok()
    }
}

impl Drop for ProgressSubscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Create a connected sink/subscription pair.
pub fn channel() -> (ProgressSink, ProgressSubscription) {
    let (tx, rx) = std_channel();
    let cancelled = Arc::new(AtomicBool::new(false));
    (
        ProgressSink {
            tx: Some(tx),
            cancelled: Arc::clone(&cancelled),
        },
        ProgressSubscription { rx, cancelled },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_from_counts() {
        assert_eq!(Progress::new(1, 4).percentage, 25.0);
        assert_eq!(Progress::new(0, 0).percentage, 100.0);
        assert!(Progress::new(3, 3).is_complete());
        assert!(!Progress::new(2, 3).is_complete());
    }

    #[test]
    fn subscription_ends_when_sinks_drop() {
        let (sink, sub) = channel();
        let worker = std::thread::spawn(move || {
            sink.send(Progress::new(1, 2));
            sink.send(Progress::new(2, 2));
        });
        let received: Vec<_> = sub.collect();
        worker.join().unwrap();
        assert_eq!(received.len(), 2);
        assert!(received[1].is_complete());
    }

    #[test]
    fn cancelled_subscription_yields_nothing() {
        let (sink, mut sub) = channel();
        sink.send(Progress::new(1, 2));
        sub.cancel();
        sink.send(Progress::new(2, 2));
        assert_eq!(sub.next(), None);
    }

    #[test]
    fn sending_after_unsubscribe_is_harmless() {
        let (sink, sub) = channel();
        drop(sub);
        sink.send(Progress::new(1, 1));
        ProgressSink::disabled().send(Progress::new(1, 1));
    }
}
