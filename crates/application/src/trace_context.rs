//! Task-scoped trace correlation.
//!
//! Each tokio task that enters [`TraceContext::scope`] owns one slot holding at
//! most one [`TraceId`]. Code running in the same task reads it without the id
//! being passed around; other tasks never observe it.

use std::cell::Cell;
use std::future::Future;

use divehub_core::TraceId;

tokio::task_local! {
    static CURRENT_TRACE: Cell<Option<TraceId>>;
}

/// Accessors for the trace id of the current task.
pub struct TraceContext;

impl TraceContext {
    /// Runs `future` with a fresh, empty trace slot.
    pub async fn scope<F>(future: F) -> F::Output
    where
        F: Future,
    {
        CURRENT_TRACE.scope(Cell::new(None), future).await
    }

    /// Returns whether the current task runs inside [`TraceContext::scope`].
    #[must_use]
    pub fn is_scoped() -> bool {
        CURRENT_TRACE.try_with(|_| ()).is_ok()
    }

    /// Stores `trace_id` for the current task, replacing any previous value.
    ///
    /// Returns `false` when called outside a scope, where nothing is stored.
    pub fn set(trace_id: TraceId) -> bool {
        CURRENT_TRACE
            .try_with(|slot| slot.set(Some(trace_id)))
            .is_ok()
    }

    /// Returns the trace id of the current task, if one is set.
    #[must_use]
    pub fn get() -> Option<TraceId> {
        CURRENT_TRACE.try_with(Cell::get).ok().flatten()
    }

    /// Removes the trace id of the current task.
    pub fn clear() {
        // Outside a scope there is nothing to clear.
        let _ = CURRENT_TRACE.try_with(|slot| slot.set(None));
    }

    /// Sets `trace_id` and returns a guard that clears it when dropped.
    #[must_use = "dropping the guard clears the trace id immediately"]
    pub fn enter(trace_id: TraceId) -> TraceGuard {
        Self::set(trace_id);
        TraceGuard { _private: () }
    }
}

/// Clears the current task's trace id on drop, including during unwinding.
#[derive(Debug)]
pub struct TraceGuard {
    _private: (),
}

impl Drop for TraceGuard {
    fn drop(&mut self) {
        TraceContext::clear();
    }
}
