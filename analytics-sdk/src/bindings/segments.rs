//! Saved segments of the signed-in user

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{follow_handle, HandleReceiver, RemoteClientHandle};
use crate::services::google_analytics::Segment;

/// Segment list, `None` until loaded and again after sign-out
pub struct SavedSegments {
    segments: watch::Receiver<Option<Vec<Segment>>>,
    task: JoinHandle<()>,
}

impl SavedSegments {
    /// Start following `handles`; must be called inside a Tokio runtime
    pub fn spawn(handles: HandleReceiver) -> Self {
        let (tx, segments) = watch::channel(None);
        let tx = Arc::new(tx);

        let on_handle = {
            let tx = Arc::clone(&tx);
            move |handle: RemoteClientHandle| {
                let tx = Arc::clone(&tx);
                async move {
                    match handle.management().list_segments().await {
                        Ok(listing) => {
                            let items = listing.items.unwrap_or_default();
                            debug!(segments = items.len(), "loaded segments");
                            tx.send_replace(Some(items));
                        }
                        Err(e) => warn!("failed to list segments: {}", e),
                    }
                }
            }
        };

        let task = follow_handle(handles, on_handle, move || {
            tx.send_if_modified(|s| s.take().is_some());
        });

        Self { segments, task }
    }

    pub fn get(&self) -> Option<Vec<Segment>> {
        self.segments.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Vec<Segment>>> {
        self.segments.clone()
    }
}

impl Drop for SavedSegments {
    fn drop(&mut self) {
        self.task.abort();
    }
}
