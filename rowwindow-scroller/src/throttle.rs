use crate::scheduler::{CancelToken, Scheduler};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Pending {
    token: CancelToken,
    due_ms: u64,
}

/// Keeps at most one recomputation in flight.
///
/// Events that arrive while a flush is pending do not schedule another one; the flush reads the
/// latest state when it runs. An event whose interval would end before the pending deadline
/// moves the flush to that earlier deadline. A pending deadline is never pushed back.
#[derive(Debug, Default)]
pub(crate) struct Throttle {
    pending: Option<Pending>,
}

impl Throttle {
    pub(crate) fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Returns the deadline to schedule a new flush at, or `None` when the pending flush already
    /// runs no later than `now + interval_ms`. A later pending flush is cancelled.
    pub(crate) fn needs_schedule(
        &mut self,
        scheduler: &dyn Scheduler,
        interval_ms: u64,
    ) -> Option<u64> {
        let due_ms = scheduler.now_ms().saturating_add(interval_ms);
        match self.pending {
            Some(p) if p.due_ms <= due_ms => None,
            Some(p) => {
                scheduler.cancel(p.token);
                self.pending = None;
                Some(due_ms)
            }
            None => Some(due_ms),
        }
    }

    pub(crate) fn armed(&mut self, token: CancelToken, due_ms: u64) {
        self.pending = Some(Pending { token, due_ms });
    }

    /// Called when the flush runs, scheduled or forced.
    pub(crate) fn clear(&mut self) {
        self.pending = None;
    }

    pub(crate) fn cancel(&mut self, scheduler: &dyn Scheduler) {
        if let Some(p) = self.pending.take() {
            scheduler.cancel(p.token);
        }
    }
}
