//! Reactive bindings over the analytics capabilities
//!
//! Each binding owns a background task and exposes its state through
//! `tokio::sync::watch` receivers. Consumers read the latest value with the
//! plain getters, or `subscribe_*` and await `changed()` to be notified.
//!
//! - [`Session`] publishes the current [`RemoteClientHandle`]
//! - [`DimensionsAndMetrics`] and [`SavedSegments`] recompute whenever the handle changes
//! - [`ReportRequester`] runs report requests through a [`LongRequestDetector`]

mod columns;
mod detector;
mod handle;
mod segments;

pub use columns::{split_columns, DimensionsAndMetrics};
pub use detector::{LongRequestDetector, ReportRequester};
pub use handle::{HandleReceiver, RemoteClientHandle, Session};
pub use segments::SavedSegments;

use std::future::Future;

use tokio::task::JoinHandle;

/// Run `on_handle` for every handle the session publishes, `on_signed_out` when it goes away.
///
/// A fetch still running when the handle changes is dropped so that its
/// result cannot land on the new connection's state. The task ends once the
/// session itself is dropped.
pub(crate) fn follow_handle<F, Fut, C>(
    mut handles: HandleReceiver,
    mut on_handle: F,
    on_signed_out: C,
) -> JoinHandle<()>
where
    F: FnMut(RemoteClientHandle) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
    C: Fn() + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            let current = handles.borrow_and_update().clone();
            match current {
                Some(handle) => {
                    let fetch = on_handle(handle);
                    tokio::select! {
                        _ = fetch => {}
                        changed = handles.changed() => {
                            if changed.is_err() {
                                return;
                            }
                            continue;
                        }
                    }
                }
                None => on_signed_out(),
            }

            if handles.changed().await.is_err() {
                return;
            }
        }
    })
}
