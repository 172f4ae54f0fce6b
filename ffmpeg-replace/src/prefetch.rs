//! Bounded producer/consumer queue in front of a lazy sequence.
//!
//! A named worker thread pulls from the wrapped iterator and blocks once
//! `capacity` items are queued; the consumer blocks while the queue is
//! empty. Items arrive in production order. When the wrapped iterator ends
//! the worker exits, the queue drains, and the consumer sees `None`.

use std::{
    sync::mpsc::{Receiver, sync_channel},
    thread::JoinHandle,
};

pub const DEFAULT_CAPACITY: usize = 8;

pub struct Prefetch<T> {
    rx: Option<Receiver<T>>,
    worker: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> Prefetch<T> {
    pub fn spawn<I>(source: I, capacity: usize) -> anyhow::Result<Self>
    where
        I: Iterator<Item = T> + Send + 'static,
    {
        let (tx, rx) = sync_channel::<T>(capacity);
        let worker = std::thread::Builder::new()
            .name("prefetch".to_string())
            .spawn(move || {
                let mut produced: u64 = 0;
                for item in source {
                    if tx.send(item).is_err() {
                        log::debug!("prefetch consumer gone after {} items", produced);
                        return;
                    }
                    produced += 1;
                }
                log::debug!("prefetch source exhausted after {} items", produced);
            })?;
        Ok(Self {
            rx: Some(rx),
            worker: Some(worker),
        })
    }
}

impl<T> Iterator for Prefetch<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let item = self.rx.as_ref()?.recv().ok();
        if item.is_none() {
            // Worker is gone: join it so a panic in the source surfaces here
            // instead of reading as a clean end of sequence.
            self.rx = None;
            if let Some(worker) = self.worker.take() {
                if let Err(panic) = worker.join() {
                    std::panic::resume_unwind(panic);
                }
            }
        }
        item
    }
}

impl<T> Drop for Prefetch<T> {
    fn drop(&mut self) {
        // Closing the queue unblocks a worker waiting on a full queue.
        self.rx = None;
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("prefetch worker panicked");
            }
        }
    }
}
