//! Execution-context guard.
//!
//! Rendering and some engine calls are only valid on one privileged context.
//! A thread marks itself privileged with [`PrivilegedScope`]; work submitted
//! through [`ContextGuard`] from any other thread is queued and later run by
//! the [`JobPump`] that drains the queue on the privileged context.

use std::cell::Cell;
use std::marker::PhantomData;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TrySendError};

thread_local! {
    static PRIVILEGED: Cell<bool> = const { Cell::new(false) };
}

/// Queued unit of work.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Which context the calling thread is on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContextState {
    /// Privileged calls are valid here.
    OnPrivilegedContext,
    /// Privileged calls must be deferred.
    OffContext,
}

impl ContextState {
    /// State of the calling thread.
    #[must_use]
    pub fn current() -> Self {
        if PRIVILEGED.with(Cell::get) {
            Self::OnPrivilegedContext
        } else {
            Self::OffContext
        }
    }
}

/// Marks the current thread privileged until dropped.
///
/// Scopes nest; dropping restores whatever state was active before.
pub struct PrivilegedScope {
    previous: bool,
    // Tied to the thread whose flag it set.
    _not_send: PhantomData<*const ()>,
}

impl PrivilegedScope {
    /// Enters the privileged context on this thread.
    #[must_use]
    pub fn enter() -> Self {
        let previous = PRIVILEGED.with(|flag| flag.replace(true));
        Self {
            previous,
            _not_send: PhantomData,
        }
    }
}

impl Drop for PrivilegedScope {
    fn drop(&mut self) {
        PRIVILEGED.with(|flag| flag.set(self.previous));
    }
}

/// How a job submitted to [`ContextGuard::run_on_privileged_context`] was handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// Ran synchronously; the caller was already privileged.
    Immediate,
    /// Queued for the pump.
    Queued,
    /// The queue was full or the pump is gone; the job was discarded.
    Dropped,
}

/// Routes work onto the privileged context.
#[derive(Clone, Debug)]
pub struct ContextGuard {
    jobs: Sender<Job>,
}

/// Drains jobs queued by [`ContextGuard`]s, FIFO.
#[derive(Debug)]
pub struct JobPump {
    jobs: Receiver<Job>,
}

/// Creates a guard and the pump that serves it, with room for `capacity` pending jobs.
///
/// A capacity of zero is treated as one.
#[must_use]
pub fn job_queue(capacity: usize) -> (ContextGuard, JobPump) {
    if capacity == 0 {
        log::warn!("Privileged job queue capacity of 0 raised to 1");
    }
    let (sender, receiver) = channel::bounded(capacity.max(1));
    (ContextGuard { jobs: sender }, JobPump { jobs: receiver })
}

impl ContextGuard {
    /// Runs `job` now if the caller is privileged, otherwise queues it.
    ///
    /// Never blocks and gives no completion signal.
    pub fn run_on_privileged_context(&self, job: impl FnOnce() + Send + 'static) -> Dispatch {
        if ContextState::current() == ContextState::OnPrivilegedContext {
            job();
            return Dispatch::Immediate;
        }

        match self.jobs.try_send(Box::new(job)) {
            Ok(()) => Dispatch::Queued,
            Err(TrySendError::Full(_)) => {
                log::warn!("Privileged job queue is full, dropping job");
                Dispatch::Dropped
            }
            Err(TrySendError::Disconnected(_)) => {
                log::warn!("Privileged job pump has shut down, dropping job");
                Dispatch::Dropped
            }
        }
    }
}

impl JobPump {
    /// Jobs waiting to run.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.jobs.len()
    }

    /// Runs every job already queued on the calling thread, as privileged.
    pub fn run_pending(&self) -> usize {
        let _scope = PrivilegedScope::enter();
        let mut ran = 0;
        while let Ok(job) = self.jobs.try_recv() {
            job();
            ran += 1;
        }
        ran
    }

    /// Runs jobs as they arrive until `keep_running` returns false or every
    /// guard is dropped. Checks `keep_running` at least every `poll`.
    pub fn run(&self, poll: Duration, keep_running: impl Fn() -> bool) {
        let _scope = PrivilegedScope::enter();
        while keep_running() {
            match self.jobs.recv_timeout(poll) {
                Ok(job) => job(),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        log::debug!("Privileged job pump stopped");
    }
}
