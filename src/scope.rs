//! Ambient scope chain.
//!
//! Each logical call chain sees one "current" frame. Frames are immutable
//! and linked to their parent, so a chain can be shared freely between
//! readers. The current head lives in a tokio task-local when the code runs
//! inside [`flow`] (or [`ScopeSnapshot::flow`] / [`ScopeSnapshot::enter`]),
//! and in a thread-local on threads that are not driving a tokio runtime.
//!
//! Entering a flow copies the caller's head: frames pushed inside are
//! visible across `.await` points of that future, even when the runtime
//! moves it between threads, but never leak back to the caller or to
//! sibling futures started from the same point.
//!
//! Inside a tokio runtime but outside any flow, [`push`] fails with
//! [`EventLoggerError::NoScopeContext`]: the worker thread is shared by
//! unrelated tasks, so there is no chain a frame could safely belong to.

use crate::data::EventData;
use crate::error::EventLoggerError;
use serde_json::Value;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

type Head = Option<Arc<ScopeFrame>>;

/// Storage for one chain's head. Guards keep a handle on the slot they
/// were pushed into, so dropping them anywhere restores that chain.
type Slot = Arc<Mutex<Head>>;

tokio::task_local! {
    static TASK_HEAD: Slot;
}

thread_local! {
    static THREAD_HEAD: Slot = Arc::new(Mutex::new(None));
}

fn new_slot(head: Head) -> Slot {
    Arc::new(Mutex::new(head))
}

fn read(slot: &Slot) -> Head {
    slot.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

fn write(slot: &Slot, head: Head) {
    *slot.lock().unwrap_or_else(PoisonError::into_inner) = head;
}

/// A single logical operation in the chain.
#[derive(Debug)]
pub struct ScopeFrame {
    name: String,
    state: Value,
    parent: Head,
}

impl ScopeFrame {
    /// Name of the logger that opened this scope.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> &Value {
        &self.state
    }

    pub fn parent(&self) -> Option<&Arc<ScopeFrame>> {
        self.parent.as_ref()
    }
}

/// Current head frame for the calling logical chain.
pub fn current() -> Option<Arc<ScopeFrame>> {
    TASK_HEAD
        .try_with(read)
        .unwrap_or_else(|_| THREAD_HEAD.with(read))
}

/// Slot of the calling chain, if it has one that is not shared with
/// unrelated tasks.
fn current_slot() -> Result<Slot, EventLoggerError> {
    if let Ok(slot) = TASK_HEAD.try_with(Arc::clone) {
        return Ok(slot);
    }
    if tokio::runtime::Handle::try_current().is_ok() {
        return Err(EventLoggerError::NoScopeContext);
    }
    Ok(THREAD_HEAD.with(Arc::clone))
}

/// Push a new frame on top of the current head.
///
/// A `null` state is rejected before anything is installed, as is a push
/// from a runtime task that is not running inside [`flow`].
pub fn push(name: impl Into<String>, state: Value) -> Result<ScopeGuard, EventLoggerError> {
    if state.is_null() {
        return Err(EventLoggerError::NullScopeState);
    }

    let slot = current_slot()?;
    let parent = read(&slot);
    write(
        &slot,
        Some(Arc::new(ScopeFrame {
            name: name.into(),
            state,
            parent: parent.clone(),
        })),
    );

    Ok(ScopeGuard { slot, parent })
}

/// Ends a scope when dropped.
///
/// Dropping always reinstalls the parent recorded at push time, whatever
/// the current head is at that moment. Guards dropped out of order
/// therefore leave the chain as the last drop set it. The parent is
/// restored in the chain the scope was opened in, even if the guard was
/// moved elsewhere.
#[must_use = "the scope ends as soon as the guard is dropped"]
#[derive(Debug)]
pub struct ScopeGuard {
    slot: Slot,
    parent: Head,
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        write(&self.slot, self.parent.take());
    }
}

/// Flatten the state of every frame from the root to `head`.
///
/// Outer frames are applied first, so inner frames win on key collisions.
pub fn flatten_scope_chain(head: Option<&ScopeFrame>) -> EventData {
    let mut frames = Vec::new();
    let mut next = head;
    while let Some(frame) = next {
        frames.push(frame);
        next = frame.parent.as_deref();
    }

    let mut data = EventData::new();
    for frame in frames.into_iter().rev() {
        data.add_value(&frame.state);
    }
    data
}

/// Run `fut` with a copy of the caller's current scope chain.
pub fn flow<F: Future>(fut: F) -> impl Future<Output = F::Output> {
    ScopeSnapshot::capture().flow(fut)
}

/// A captured head, used to carry scope context into spawned work.
#[derive(Debug, Clone, Default)]
pub struct ScopeSnapshot {
    head: Head,
}

impl ScopeSnapshot {
    pub fn capture() -> Self {
        ScopeSnapshot { head: current() }
    }

    pub fn head(&self) -> Option<&Arc<ScopeFrame>> {
        self.head.as_ref()
    }

    /// Run `fut` with this snapshot as its starting chain.
    pub fn flow<F: Future>(self, fut: F) -> impl Future<Output = F::Output> {
        TASK_HEAD.scope(new_slot(self.head), fut)
    }

    /// Run `f` synchronously with this snapshot as its starting chain.
    /// This is the way to open scopes in `spawn_blocking` closures.
    pub fn enter<R>(self, f: impl FnOnce() -> R) -> R {
        TASK_HEAD.sync_scope(new_slot(self.head), f)
    }
}
