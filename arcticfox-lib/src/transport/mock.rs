//! Scripted in-memory transport for tests and offline use.

use super::{Transport, TransportError, TransportHandle};
use crate::command::{CommandFrame, Opcode};
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, watch};
use tracing::debug;

type Inbound = mpsc::UnboundedSender<Result<Bytes, TransportError>>;

#[derive(Default)]
struct MockInner {
    failing_opens: usize,
    write_error: Option<TransportError>,
    replies: HashMap<Opcode, Vec<Bytes>>,
    writes: Vec<Bytes>,
    open_count: usize,
    /// Sender feeding the most recently opened handle, tagged with its id
    inbound: Option<(usize, Inbound)>,
}

struct MockState {
    inner: Mutex<MockInner>,
    write_count: watch::Sender<usize>,
}

/// A fake device. Clones share the same state, so a test keeps one clone to
/// script the device while the driver owns another.
#[derive(Clone)]
pub struct MockTransport {
    state: Arc<MockState>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            state: Arc::new(MockState {
                inner: Mutex::new(MockInner::default()),
                write_count: watch::channel(0).0,
            }),
        }
    }

    fn inner(&self) -> MutexGuard<'_, MockInner> {
        self.state.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make the next `count` opens fail.
    pub fn fail_next_opens(&self, count: usize) {
        self.inner().failing_opens = count;
    }

    /// Make every write fail with `error` until reset with `None`.
    pub fn fail_writes_with(&self, error: Option<TransportError>) {
        self.inner().write_error = error;
    }

    /// Answer every command with `opcode` by emitting `chunks` in order.
    pub fn reply_to(&self, opcode: Opcode, chunks: Vec<Bytes>) {
        self.inner().replies.insert(opcode, chunks);
    }

    /// Deliver a chunk to the open handle. Returns false when nothing is open.
    pub fn push_chunk(&self, chunk: impl Into<Bytes>) -> bool {
        self.push(Ok(chunk.into()))
    }

    /// Deliver a read error to the open handle.
    pub fn push_error(&self, error: TransportError) -> bool {
        self.push(Err(error))
    }

    fn push(&self, item: Result<Bytes, TransportError>) -> bool {
        match &self.inner().inbound {
            Some((_, tx)) => tx.send(item).is_ok(),
            None => false,
        }
    }

    /// Everything written so far, one entry per `write` call.
    pub fn writes(&self) -> Vec<Bytes> {
        self.inner().writes.clone()
    }

    pub fn open_count(&self) -> usize {
        self.inner().open_count
    }

    pub fn is_open(&self) -> bool {
        self.inner().inbound.is_some()
    }

    /// Wait until at least `count` writes have been recorded.
    pub async fn wait_for_writes(&self, count: usize) {
        let mut rx = self.state.write_count.subscribe();
        // the sender lives in `self`, so the channel cannot close here
        let _ = rx.wait_for(|&written| written >= count).await;
    }
}

impl Transport for MockTransport {
    type Handle = MockHandle;

    async fn open(&self, _vendor_id: u16, _product_id: u16) -> Result<MockHandle, TransportError> {
        let mut inner = self.inner();
        inner.open_count += 1;
        if inner.failing_opens > 0 {
            inner.failing_opens -= 1;
            return Err(TransportError::Open("scripted open failure".to_string()));
        }
        let id = inner.open_count;
        let (tx, rx) = mpsc::unbounded_channel();
        inner.inbound = Some((id, tx));
        debug!(id, "mock handle opened");
        Ok(MockHandle {
            id,
            state: Arc::clone(&self.state),
            inbound: tokio::sync::Mutex::new(rx),
        })
    }
}

pub struct MockHandle {
    id: usize,
    state: Arc<MockState>,
    inbound: tokio::sync::Mutex<mpsc::UnboundedReceiver<Result<Bytes, TransportError>>>,
}

impl MockHandle {
    fn inner(&self) -> MutexGuard<'_, MockInner> {
        self.state.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TransportHandle for MockHandle {
    async fn write(&self, data: &[u8]) -> Result<(), TransportError> {
        let written = {
            let mut inner = self.inner();
            if let Some(error) = inner.write_error.clone() {
                return Err(error);
            }
            inner.writes.push(Bytes::copy_from_slice(data));

            let replies = CommandFrame::try_from(data)
                .ok()
                .and_then(|frame| inner.replies.get(&frame.opcode).cloned());
            if let (Some(chunks), Some((_, tx))) = (replies, &inner.inbound) {
                for chunk in chunks {
                    let _ = tx.send(Ok(chunk));
                }
            }
            inner.writes.len()
        };
        self.state.write_count.send_replace(written);
        Ok(())
    }

    async fn read(&self) -> Result<Bytes, TransportError> {
        match self.inbound.lock().await.recv().await {
            Some(item) => item,
            None => Err(TransportError::Closed),
        }
    }

    async fn close(&self) {
        let mut inner = self.inner();
        if inner.inbound.as_ref().is_some_and(|(id, _)| *id == self.id) {
            inner.inbound = None;
        }
    }
}
