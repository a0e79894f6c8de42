//! Correlates inbound chunks with the single outstanding request.
//!
//! The device protocol carries no request identifiers, so at most one request
//! may be in flight. The demultiplexer is a plain state machine: callers feed
//! it chunks and clock readings, and it completes the request's oneshot
//! channel exactly once.

use crate::configuration::Configuration;
use crate::error::FoxError;
use crate::monitoring::MonitoringData;
use crate::response::{ExpectedKind, Response};
use crate::version::VersionGate;
use bytes::BytesMut;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Identifies one issued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTicket(u64);

pub type ResponseReceiver = oneshot::Receiver<Result<Response, FoxError>>;

#[derive(Debug)]
struct PendingRequest {
    ticket: RequestTicket,
    kind: ExpectedKind,
    deadline: Instant,
    buffer: BytesMut,
    reply: oneshot::Sender<Result<Response, FoxError>>,
}

impl PendingRequest {
    fn complete(self, result: Result<Response, FoxError>) {
        if self.reply.send(result).is_err() {
            debug!(kind = %self.kind, "requester went away before completion");
        }
    }
}

#[derive(Debug)]
pub struct Demultiplexer {
    gate: VersionGate,
    timeout: Duration,
    pending: Option<PendingRequest>,
    next_ticket: u64,
}

impl Demultiplexer {
    pub fn new(gate: VersionGate, timeout: Duration) -> Self {
        Self {
            gate,
            timeout,
            pending: None,
            next_ticket: 0,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_none()
    }

    /// Register a new request. Each request starts with an empty reassembly
    /// buffer.
    ///
    /// A pending request whose requester is gone or whose deadline has passed
    /// is evicted first; only a live one makes this return `Busy`.
    pub fn issue(
        &mut self,
        kind: ExpectedKind,
        now: Instant,
    ) -> Result<(RequestTicket, ResponseReceiver), FoxError> {
        self.evict_stale(now);
        if self.pending.is_some() {
            return Err(FoxError::Busy);
        }
        self.next_ticket += 1;
        let ticket = RequestTicket(self.next_ticket);
        let (reply, receiver) = oneshot::channel();
        self.pending = Some(PendingRequest {
            ticket,
            kind,
            deadline: now + self.timeout,
            buffer: BytesMut::with_capacity(kind.expected_len()),
            reply,
        });
        debug!(?ticket, %kind, "request issued");
        Ok((ticket, receiver))
    }

    /// Drop the request without completing it, e.g. when its command could
    /// not be written. Returns whether it was still pending.
    pub fn cancel(&mut self, ticket: RequestTicket) -> bool {
        self.take_if(ticket).is_some()
    }

    pub fn deadline(&self, ticket: RequestTicket) -> Option<Instant> {
        self.pending
            .as_ref()
            .filter(|pending| pending.ticket == ticket)
            .map(|pending| pending.deadline)
    }

    /// Time the request out if its deadline has passed.
    pub fn expire(&mut self, ticket: RequestTicket, now: Instant) -> bool {
        match self.deadline(ticket) {
            Some(deadline) if now >= deadline => {
                if let Some(pending) = self.pending.take() {
                    warn!(
                        kind = %pending.kind,
                        received = pending.buffer.len(),
                        expected = pending.kind.expected_len(),
                        "request timed out"
                    );
                    pending.complete(Err(FoxError::RequestTimeout));
                }
                true
            }
            _ => false,
        }
    }

    fn evict_stale(&mut self, now: Instant) {
        let Some(pending) = self.pending.as_ref() else {
            return;
        };
        if pending.reply.is_closed() {
            debug!(ticket = ?pending.ticket, kind = %pending.kind, "evicting abandoned request");
            self.pending = None;
        } else if now >= pending.deadline {
            let ticket = pending.ticket;
            self.expire(ticket, now);
        }
    }

    /// Fail whatever is outstanding with `error`.
    pub fn abandon(&mut self, error: FoxError) {
        if let Some(pending) = self.pending.take() {
            debug!(kind = %pending.kind, %error, "failing pending request");
            pending.complete(Err(error));
        }
    }

    /// Feed one inbound chunk, in arrival order.
    pub fn on_chunk(&mut self, chunk: &[u8], now: Instant) {
        let timeout = self.timeout;
        let Some(pending) = self.pending.as_mut() else {
            warn!(len = chunk.len(), "dropping unsolicited chunk");
            return;
        };
        pending.deadline = now + timeout;

        if pending.kind == ExpectedKind::Monitoring {
            let result = MonitoringData::from_bytes(chunk).map(Response::Monitoring);
            if let Some(pending) = self.pending.take() {
                pending.complete(result);
            }
            return;
        }

        let expected = pending.kind.expected_len();
        let room = expected - pending.buffer.len();
        if chunk.len() > room {
            warn!(
                kind = %pending.kind,
                extra = chunk.len() - room,
                "response longer than expected, ignoring the excess"
            );
        }
        pending.buffer.extend_from_slice(&chunk[..chunk.len().min(room)]);
        if pending.buffer.len() < expected {
            return;
        }

        if let Some(mut pending) = self.pending.take() {
            let buffer = std::mem::take(&mut pending.buffer);
            let result = self.finish(pending.kind, buffer);
            pending.complete(result);
        }
    }

    fn finish(&self, kind: ExpectedKind, buffer: BytesMut) -> Result<Response, FoxError> {
        match kind {
            ExpectedKind::Configuration => Configuration::decode(&buffer, &self.gate)
                .map(|config| Response::Configuration(Box::new(config))),
            ExpectedKind::ScreenCapture => Ok(Response::ScreenCapture(buffer.freeze())),
            ExpectedKind::Dataflash => Ok(Response::Dataflash(buffer.freeze())),
            ExpectedKind::Monitoring => MonitoringData::from_bytes(&buffer).map(Response::Monitoring),
        }
    }

    fn take_if(&mut self, ticket: RequestTicket) -> Option<PendingRequest> {
        if self.pending.as_ref().is_some_and(|pending| pending.ticket == ticket) {
            self.pending.take()
        } else {
            None
        }
    }
}
