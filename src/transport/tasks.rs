// src/transport/tasks.rs

//! Background work owned by a carrier instance.
//!
//! Every in-flight request, retry timer and reply hand-off a carrier starts
//! runs as a task in its [`TaskList`]. Closing the list aborts them all, and
//! dropping it (with the carrier) does the same, so no retry loop outlives
//! the transport that started it.
//!
//! Finished tasks are reaped whenever the list is touched. A task that
//! panicked leaves its panic behind, and the next [`TaskList::check`],
//! [`TaskList::spawn`] or [`TaskList::close`] resumes it on the caller.

use std::any::Any;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tokio::runtime::Handle;
use tokio::task::JoinSet;

use crate::transport_core::lock_ignore_poison;

type PanicPayload = Box<dyn Any + Send + 'static>;

struct Inner {
    tasks: Mutex<JoinSet<()>>,
    panicked: Mutex<Option<PanicPayload>>,
    closed: AtomicBool,
}

impl Inner {
    /// Drop finished tasks, keeping the first panic seen.
    fn reap(&self, tasks: &mut JoinSet<()>) {
        // ---
        while let Some(done) = tasks.try_join_next() {
            let Err(err) = done else { continue };
            if !err.is_panic() {
                continue;
            }
            let mut panicked = lock_ignore_poison(&self.panicked);
            if panicked.is_none() {
                *panicked = Some(err.into_panic());
            }
        }
    }

    fn take_panic(&self) -> Option<PanicPayload> {
        lock_ignore_poison(&self.panicked).take()
    }
}

/// Set of tasks aborted together.
pub(crate) struct TaskList {
    inner: Arc<Inner>,
}

/// Non-owning handle to a [`TaskList`], for callbacks that may outlive it.
pub(crate) struct WeakTaskList {
    inner: Weak<Inner>,
}

impl TaskList {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                tasks: Mutex::new(JoinSet::new()),
                panicked: Mutex::new(None),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Whether [`close`](Self::close) or [`shutdown`](Self::shutdown) ran.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Reap finished tasks and resume the first panic any of them raised.
    pub fn check(&self) {
        // ---
        self.inner.reap(&mut lock_ignore_poison(&self.inner.tasks));

        if let Some(payload) = self.inner.take_panic() {
            std::panic::resume_unwind(payload);
        }
    }

    /// Spawn `task` on the current runtime.
    ///
    /// Runs [`check`](Self::check) first, so a panic left by an earlier task
    /// surfaces here instead of the new task being spawned.
    ///
    /// Returns false, without spawning, once the list is closed.
    pub fn spawn<F>(&self, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        // ---
        self.check();

        if self.is_closed() {
            return false;
        }
        lock_ignore_poison(&self.inner.tasks).spawn(task);
        true
    }

    /// Handle that can spawn into this list without keeping it alive.
    pub fn downgrade(&self) -> WeakTaskList {
        WeakTaskList {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Abort every task and refuse new ones.
    ///
    /// A panic from a task that had already finished is resumed after the
    /// rest are aborted.
    pub fn close(&self) {
        // ---
        if let Some(payload) = self.abort() {
            std::panic::resume_unwind(payload);
        }
    }

    /// Like [`close`](Self::close), but a pending panic is only logged.
    /// For use from `Drop`.
    pub fn shutdown(&self) {
        // ---
        if self.abort().is_some() {
            crate::log_error!("carrier task panicked; discarded at shutdown");
        }
    }

    fn abort(&self) -> Option<PanicPayload> {
        // ---
        self.inner.closed.store(true, Ordering::Release);
        {
            let mut tasks = lock_ignore_poison(&self.inner.tasks);
            self.inner.reap(&mut tasks);
            tasks.abort_all();
        }
        self.inner.take_panic()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        lock_ignore_poison(&self.inner.tasks).len()
    }
}

impl WeakTaskList {
    /// Spawn `task` on `runtime` if the list is still alive and open.
    ///
    /// Usable from threads outside the runtime. Finished tasks are reaped
    /// first; a panic among them is kept for the owning carrier to resume.
    pub fn spawn_on<F>(&self, task: F, runtime: &Handle) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        // ---
        let Some(inner) = self.inner.upgrade() else {
            return false;
        };
        if inner.closed.load(Ordering::Acquire) {
            return false;
        }

        let mut tasks = lock_ignore_poison(&inner.tasks);
        inner.reap(&mut tasks);
        tasks.spawn_on(task, runtime);
        true
    }
}
