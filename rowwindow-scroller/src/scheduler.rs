use std::cell::RefCell;
use std::fmt;

/// A deferred unit of work handed to a [`Scheduler`].
pub type Task = Box<dyn FnOnce()>;

/// Handle to a scheduled task, used to cancel it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CancelToken(u64);

impl CancelToken {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(self) -> u64 {
        self.0
    }
}

/// Timer capability injected into the scroller.
///
/// Hosts back it with their event loop (`setTimeout`, `requestAnimationFrame`, a frame clock);
/// tests use [`ManualScheduler`].
///
/// Contract: a task must run on a later turn of the host loop, never from inside
/// `schedule_after`. Cancelling a token whose task already ran is a no-op. `now_ms` is the
/// clock `delay_ms` is measured against; it must not go backwards.
pub trait Scheduler {
    fn now_ms(&self) -> u64;
    fn schedule_after(&self, delay_ms: u64, task: Task) -> CancelToken;
    fn cancel(&self, token: CancelToken);
}

struct Entry {
    due_ms: u64,
    token: CancelToken,
    task: Task,
}

#[derive(Default)]
struct ManualState {
    now_ms: u64,
    next_id: u64,
    queue: Vec<Entry>,
}

/// A deterministic scheduler driven by explicit time steps.
///
/// Useful for tests and for frame-driven hosts that prefer to pump timers themselves.
#[derive(Default)]
pub struct ManualScheduler {
    state: RefCell<ManualState>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks waiting to run.
    pub fn pending(&self) -> usize {
        self.state.borrow().queue.len()
    }

    /// Moves the clock forward by `ms`, running every task that becomes due, in due order.
    ///
    /// Tasks scheduled by running tasks are honored if they fall inside the step. Returns the
    /// number of tasks run.
    pub fn advance(&self, ms: u64) -> usize {
        let target = self.now_ms().saturating_add(ms);
        let mut ran = 0usize;
        while let Some(task) = self.pop_due(target) {
            task();
            ran += 1;
        }
        self.state.borrow_mut().now_ms = target;
        ran
    }

    /// Runs every pending task regardless of its due time.
    pub fn run_all(&self) -> usize {
        let mut ran = 0usize;
        while let Some(task) = self.pop_due(u64::MAX) {
            task();
            ran += 1;
        }
        ran
    }

    fn pop_due(&self, target: u64) -> Option<Task> {
        let mut state = self.state.borrow_mut();
        let pos = state
            .queue
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due_ms <= target)
            .min_by_key(|(_, e)| (e.due_ms, e.token))
            .map(|(i, _)| i)?;
        let entry = state.queue.remove(pos);
        state.now_ms = state.now_ms.max(entry.due_ms);
        Some(entry.task)
    }
}

impl Scheduler for ManualScheduler {
    fn now_ms(&self) -> u64 {
        self.state.borrow().now_ms
    }

    fn schedule_after(&self, delay_ms: u64, task: Task) -> CancelToken {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        let token = CancelToken(state.next_id);
        let due_ms = state.now_ms.saturating_add(delay_ms);
        state.queue.push(Entry {
            due_ms,
            token,
            task,
        });
        token
    }

    fn cancel(&self, token: CancelToken) {
        self.state.borrow_mut().queue.retain(|e| e.token != token);
    }
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ManualScheduler")
            .field("now_ms", &state.now_ms)
            .field("pending", &state.queue.len())
            .finish()
    }
}
