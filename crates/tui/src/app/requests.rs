//! Requests that run while the event loop keeps drawing and reading keys.
//!
//! Each request runs as a tokio task and reports back over a channel. Only
//! the latest request of the current view is applied; results that finish
//! after the view was left or the request was superseded are dropped. The
//! task itself is never aborted.

use std::future::Future;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Fetches data; a newer load replaces it.
    Load,
    /// Changes server data; nothing else starts until it is back.
    Write,
}

struct Completion<T> {
    ticket: u64,
    update: T,
}

pub struct Requests<T> {
    tx: UnboundedSender<Completion<T>>,
    rx: UnboundedReceiver<Completion<T>>,
    next_ticket: u64,
    current: Option<(u64, RequestKind)>,
}

impl<T: Send + 'static> Default for Requests<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> Requests<T> {
    pub fn new() -> Self {
        let (tx, rx) = unbounded_channel();
        Self {
            tx,
            rx,
            next_ticket: 0,
            current: None,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.current.is_some()
    }

    pub fn is_writing(&self) -> bool {
        matches!(self.current, Some((_, RequestKind::Write)))
    }

    /// Loads may replace a load in flight; writes need an idle view.
    pub fn can_start(&self, kind: RequestKind) -> bool {
        match self.current {
            None => true,
            Some((_, current)) => kind == RequestKind::Load && current == RequestKind::Load,
        }
    }

    fn begin(&mut self, kind: RequestKind) -> Option<u64> {
        if !self.can_start(kind) {
            return None;
        }
        self.next_ticket += 1;
        self.current = Some((self.next_ticket, kind));
        Some(self.next_ticket)
    }

    /// Runs `job` in the background; returns `false` when it was refused.
    pub fn spawn<F>(&mut self, kind: RequestKind, job: F) -> bool
    where
        F: Future<Output = T> + Send + 'static,
    {
        let Some(ticket) = self.begin(kind) else {
            tracing::debug!(?kind, "request refused, another one is in flight");
            return false;
        };
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let update = job.await;
            if tx.send(Completion { ticket, update }).is_err() {
                tracing::debug!(ticket, "event loop gone, dropping result");
            }
        });
        true
    }

    /// Forgets the request in flight, e.g. when its view goes away.
    pub fn unmount(&mut self) {
        self.current = None;
    }

    /// The next finished request that still belongs to the current view.
    pub fn poll(&mut self) -> Option<T> {
        while let Ok(done) = self.rx.try_recv() {
            if self.finish(done.ticket) {
                return Some(done.update);
            }
            tracing::debug!(ticket = done.ticket, "dropping stale result");
        }
        None
    }

    fn finish(&mut self, ticket: u64) -> bool {
        if self.current.is_some_and(|(current, _)| current == ticket) {
            self.current = None;
            return true;
        }
        false
    }
}
