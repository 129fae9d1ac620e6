use serde::{Deserialize, Serialize};

/// Identifies one requested animation frame. Only the most recent ticket
/// handed out by a [`FrameCoalescer`] is honored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameTicket(pub u64);

/// Keeps at most one pending update per animation frame.
///
/// Pushing a new update drops the pending one and issues a fresh ticket; the
/// host cancels its previous frame request and schedules the new ticket.
#[derive(Debug)]
pub struct FrameCoalescer<T> {
    pending: Option<T>,
    scheduled: Option<FrameTicket>,
    next: u64,
    dropped: u64,
}

impl<T> Default for FrameCoalescer<T> {
    fn default() -> Self {
        Self {
            pending: None,
            scheduled: None,
            next: 0,
            dropped: 0,
        }
    }
}

impl<T> FrameCoalescer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, update: T) -> FrameTicket {
        if self.pending.replace(update).is_some() {
            self.dropped += 1;
        }
        self.next += 1;
        let ticket = FrameTicket(self.next);
        self.scheduled = Some(ticket);
        ticket
    }

    /// Takes the pending update if `ticket` is still the scheduled one.
    pub fn fire(&mut self, ticket: FrameTicket) -> Option<T> {
        if self.scheduled != Some(ticket) {
            return None;
        }
        self.scheduled = None;
        self.pending.take()
    }

    pub fn cancel(&mut self) {
        if self.pending.take().is_some() {
            self.dropped += 1;
        }
        self.scheduled = None;
    }

    pub fn scheduled(&self) -> Option<FrameTicket> {
        self.scheduled
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Updates discarded before their frame came.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}
