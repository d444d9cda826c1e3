//! Scope management for task contexts.
//!
//! # Design
//! - A single `tokio::task_local!` slot locates the context for the calling task;
//!   there is no shared map keyed by thread or worker.
//! - Tokio swaps the slot in and out on every poll, so interleaved scopes on the
//!   same worker stay isolated and nested scopes restore the outer context.
//! - Work handed to another tokio task is a causal descendant only when it goes
//!   through [`propagate`], [`spawn`], or [`spawn_blocking`].

use std::future::Future;

use tokio::task::JoinHandle;
use tokio::task::futures::TaskLocalFuture;
use tracing::trace;

use crate::context::TaskContext;

tokio::task_local! {
    static CURRENT_CONTEXT: TaskContext;
}

/// Run `future` with `context` as the current context for its whole extent.
///
/// The returned future yields exactly what `future` yields, including errors.
pub fn scope<F>(context: TaskContext, future: F) -> TaskLocalFuture<TaskContext, F>
where
    F: Future,
{
    trace!(entries = context.len(), "opening task context scope");
    CURRENT_CONTEXT.scope(context, future)
}

/// Run the synchronous callable `f` with `context` as the current context.
pub fn scope_sync<F, R>(context: TaskContext, f: F) -> R
where
    F: FnOnce() -> R,
{
    CURRENT_CONTEXT.sync_scope(context, f)
}

/// Handle to the context of the calling task, or `None` outside any scope.
#[must_use]
pub fn current() -> Option<TaskContext> {
    CURRENT_CONTEXT.try_with(TaskContext::clone).ok()
}

/// Borrow the current context without cloning the handle.
pub fn with_current<F, R>(f: F) -> Option<R>
where
    F: FnOnce(&TaskContext) -> R,
{
    CURRENT_CONTEXT.try_with(f).ok()
}

/// Capture the caller's context and re-establish it around `future`.
///
/// Outside any scope the future runs unchanged.
pub fn propagate<F>(future: F) -> impl Future<Output = F::Output>
where
    F: Future,
{
    let context = current();
    async move {
        match context {
            Some(context) => CURRENT_CONTEXT.scope(context, future).await,
            None => future.await,
        }
    }
}

/// Spawn `future` on the tokio runtime, inheriting the caller's context.
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::spawn(propagate(future))
}

/// Run `f` on the blocking pool, inheriting the caller's context.
pub fn spawn_blocking<F, R>(f: F) -> JoinHandle<R>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let context = current();
    tokio::task::spawn_blocking(move || match context {
        Some(context) => scope_sync(context, f),
        None => f(),
    })
}
