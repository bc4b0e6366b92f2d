//! Request Log Record + Async Dispatch (§4.6). Grounded on the teacher's
//! single-worker append-channel pattern in `serve/src/run/stream.rs`
//! (`append_tx`/`append_rx` draining loop), generalized here to one
//! process-wide worker spawned at startup rather than one per connection.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;
use tracing::warn;

use crate::record::ChatRecord;

/// Pluggable destination for serialized `ChatRecord`s. A concrete HTTP
/// shipper is out of scope (§1); `StdoutLogSink` and `NullLogSink` cover
/// tests and no-sink deployments.
#[async_trait]
pub trait LogSink: Send + Sync {
    async fn write(&self, record: &ChatRecord);
}

pub struct StdoutLogSink;

#[async_trait]
impl LogSink for StdoutLogSink {
    async fn write(&self, record: &ChatRecord) {
        match serde_json::to_string(record) {
            Ok(line) => println!("{line}"),
            Err(err) => warn!(error = %err, "failed to serialize chat record"),
        }
    }
}

pub struct NullLogSink;

#[async_trait]
impl LogSink for NullLogSink {
    async fn write(&self, _record: &ChatRecord) {}
}

/// A bounded ring buffer the dispatcher pushes onto and the worker drains.
/// A plain `mpsc` channel only offers drop-newest (the incoming `try_send`
/// fails when full); this buffer is evicted from the front instead, so
/// back-pressure drops the oldest queued record and keeps the most recent one.
struct Queue {
    buf: Mutex<VecDeque<ChatRecord>>,
    notify: Notify,
    capacity: usize,
}

/// Handle held by request workers: pushes a record onto the bounded ring
/// buffer, never blocking the client-response path (§4.6 back-pressure policy).
#[derive(Clone)]
pub struct LogDispatcher {
    queue: Arc<Queue>,
    dropped: Arc<AtomicU64>,
}

impl LogDispatcher {
    /// Spawns the single background worker draining the queue into `sink`,
    /// returning a cloneable dispatcher handle. `capacity` bounds the queue;
    /// on overflow the oldest queued record is evicted to make room for the
    /// new one (drop-oldest, §4.6/§5).
    pub fn spawn(sink: Arc<dyn LogSink>, capacity: usize, cancel: tokio_util::sync::CancellationToken) -> Self {
        let queue = Arc::new(Queue {
            buf: Mutex::new(VecDeque::with_capacity(capacity)),
            notify: Notify::new(),
            capacity,
        });
        let dropped = Arc::new(AtomicU64::new(0));

        let worker_queue = queue.clone();
        tokio::spawn(async move {
            loop {
                let next = worker_queue.buf.lock().unwrap().pop_front();
                match next {
                    Some(record) => sink.write(&record).await,
                    None => {
                        tokio::select! {
                            _ = cancel.cancelled() => break,
                            _ = worker_queue.notify.notified() => {}
                        }
                    }
                }
            }
        });

        Self { queue, dropped }
    }

    pub fn dispatch(&self, record: ChatRecord) {
        let mut buf = self.queue.buf.lock().unwrap();
        if buf.len() >= self.queue.capacity {
            buf.pop_front();
            self.dropped.fetch_add(1, Ordering::Relaxed);
            warn!("log queue full, dropping oldest chat record");
        }
        buf.push_back(record);
        drop(buf);
        self.queue.notify.notify_one();
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
