//! Deferred, cancellable operations.
//!
//! An owner (a [`crate::Cipher`]) keeps an [`OperationQueue`]. Scheduling an
//! operation pushes it onto the queue and asks a [`Scheduler`] to run one
//! deferred task later. Each task pops the *front* of its owner's queue, so
//! operations on one owner always run in the order they were scheduled.
//!
//! Tasks only hold a weak reference to the queue. Cancelling removes the
//! operation from the queue, so its callback can no longer run, and
//! dropping the owner drops the queue together with everything in it.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::Write;
use std::num::NonZeroU64;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::digest::Digest;

/// Output block shared with a deferred step or finish.
pub type SharedBlock = Rc<RefCell<Vec<u8>>>;

/// Byte sink shared with a deferred bulk write.
pub type SharedOutput = Rc<RefCell<dyn Write>>;

/// Digest shared with a deferred bulk write.
pub type SharedDigest = Rc<RefCell<Digest>>;

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Single-threaded event loop that runs deferred tasks.
///
/// `defer` must not run the task before returning.
pub trait Scheduler {
    fn defer(&self, task: Box<dyn FnOnce()>);
}

impl Scheduler for tokio::task::LocalSet {
    fn defer(&self, task: Box<dyn FnOnce()>) {
        self.spawn_local(async move { task() });
    }
}

impl<S: Scheduler + ?Sized> Scheduler for Rc<S> {
    fn defer(&self, task: Box<dyn FnOnce()>) {
        (**self).defer(task)
    }
}

/// A scheduler that holds tasks until told to run them.
///
/// Handy for driving operations step by step, for example from a host loop
/// that is not tokio.
#[derive(Default)]
pub struct ManualScheduler {
    tasks: RefCell<VecDeque<Box<dyn FnOnce()>>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of deferred tasks waiting to run.
    pub fn pending(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Run the oldest waiting task. Returns false if there was none.
    pub fn run_one(&self) -> bool {
        let task = self.tasks.borrow_mut().pop_front();
        match task {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Run tasks until none are left, including ones deferred while running.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while self.run_one() {
            ran += 1;
        }
        ran
    }

    /// Run the waiting tasks newest first. Operations still complete in
    /// per-owner order because each task pops its owner's queue front.
    pub fn run_reversed(&self) -> usize {
        let tasks: Vec<_> = self.tasks.borrow_mut().drain(..).collect();
        let ran = tasks.len();
        for task in tasks.into_iter().rev() {
            task();
        }
        ran
    }
}

impl Scheduler for ManualScheduler {
    fn defer(&self, task: Box<dyn FnOnce()>) {
        self.tasks.borrow_mut().push_back(task);
    }
}

// ---------------------------------------------------------------------------
// Operation identity
// ---------------------------------------------------------------------------

static NEXT_OPERATION_ID: AtomicU64 = AtomicU64::new(1);

/// Identifier of a scheduled operation. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationId(NonZeroU64);

impl OperationId {
    fn next() -> Self {
        loop {
            let raw = NEXT_OPERATION_ID.fetch_add(1, Ordering::Relaxed);
            if let Some(id) = NonZeroU64::new(raw) {
                return Self(id);
            }
        }
    }

    pub fn get(&self) -> u64 {
        self.0.get()
    }
}

impl std::fmt::Display for OperationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "op#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Queue
// ---------------------------------------------------------------------------

struct PendingOperation {
    id: OperationId,
    run: Box<dyn FnOnce()>,
}

type Pending = RefCell<VecDeque<PendingOperation>>;

/// FIFO of operations scheduled on one owner.
#[derive(Default)]
pub struct OperationQueue {
    inner: Rc<Pending>,
}

impl OperationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue `run` and defer one task that will pop and run the queue front.
    pub fn schedule(&self, scheduler: &dyn Scheduler, run: Box<dyn FnOnce()>) -> OperationHandle {
        let id = OperationId::next();
        self.inner.borrow_mut().push_back(PendingOperation { id, run });

        let queue = Rc::downgrade(&self.inner);
        scheduler.defer(Box::new(move || {
            let Some(queue) = queue.upgrade() else {
                return;
            };
            let next = queue.borrow_mut().pop_front();
            drop(queue);
            if let Some(op) = next {
                log::trace!("running {}", op.id);
                (op.run)();
            }
        }));

        OperationHandle {
            id,
            queue: Rc::downgrade(&self.inner),
        }
    }

    /// Remove a scheduled operation. False if it already ran or was cancelled.
    pub fn cancel(&self, id: OperationId) -> bool {
        remove(&self.inner, id)
    }

    /// Remove every scheduled operation and return how many there were.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<PendingOperation> = self.inner.borrow_mut().drain(..).collect();
        drained.len()
    }

    pub fn contains(&self, id: OperationId) -> bool {
        self.inner.borrow().iter().any(|op| op.id == id)
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}

impl std::fmt::Debug for OperationQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationQueue")
            .field("pending", &self.len())
            .finish()
    }
}

fn remove(queue: &Pending, id: OperationId) -> bool {
    // The operation is dropped after the borrow ends; its closure may own
    // values whose destructors touch the queue.
    let removed = {
        let mut ops = queue.borrow_mut();
        ops.iter()
            .position(|op| op.id == id)
            .and_then(|index| ops.remove(index))
    };
    removed.is_some()
}

/// Caller-side reference to a scheduled operation.
///
/// Holding a handle does not keep the owner alive.
#[derive(Clone)]
pub struct OperationHandle {
    id: OperationId,
    queue: Weak<Pending>,
}

impl OperationHandle {
    pub fn id(&self) -> OperationId {
        self.id
    }

    /// Cancel the operation. False if it already ran, was cancelled, or its
    /// owner is gone.
    pub fn cancel(&self) -> bool {
        match self.queue.upgrade() {
            Some(queue) => remove(&queue, self.id),
            None => false,
        }
    }

    /// Whether the operation is still waiting to run.
    pub fn is_pending(&self) -> bool {
        match self.queue.upgrade() {
            Some(queue) => {
                let pending = queue.borrow().iter().any(|op| op.id == self.id);
                pending
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for OperationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationHandle")
            .field("id", &self.id)
            .field("pending", &self.is_pending())
            .finish()
    }
}
