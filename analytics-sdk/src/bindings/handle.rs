//! The authenticated client handle and the session that publishes it

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use crate::core::{ManagementApi, MetadataApi, ReportingApi};

/// Subscription to the current handle; `None` while signed out
pub type HandleReceiver = watch::Receiver<Option<RemoteClientHandle>>;

/// Capability set of an authenticated analytics connection.
///
/// The bindings only ever read a handle. It is created by the host once the
/// user has signed in and dropped from the [`Session`] on logout.
#[derive(Clone)]
pub struct RemoteClientHandle {
    metadata: Arc<dyn MetadataApi>,
    management: Arc<dyn ManagementApi>,
    reporting: Arc<dyn ReportingApi>,
}

impl RemoteClientHandle {
    /// Wrap a client that implements every capability
    pub fn new<C>(client: Arc<C>) -> Self
    where
        C: MetadataApi + ManagementApi + ReportingApi + 'static,
    {
        Self {
            metadata: client.clone(),
            management: client.clone(),
            reporting: client,
        }
    }

    /// Assemble a handle from separate capability implementations
    pub fn from_parts(
        metadata: Arc<dyn MetadataApi>,
        management: Arc<dyn ManagementApi>,
        reporting: Arc<dyn ReportingApi>,
    ) -> Self {
        Self {
            metadata,
            management,
            reporting,
        }
    }

    pub fn metadata(&self) -> Arc<dyn MetadataApi> {
        Arc::clone(&self.metadata)
    }

    pub fn management(&self) -> Arc<dyn ManagementApi> {
        Arc::clone(&self.management)
    }

    pub fn reporting(&self) -> Arc<dyn ReportingApi> {
        Arc::clone(&self.reporting)
    }

    /// Whether both handles wrap the same three capabilities
    pub fn same_connection(&self, other: &RemoteClientHandle) -> bool {
        Arc::ptr_eq(&self.metadata, &other.metadata)
            && Arc::ptr_eq(&self.management, &other.management)
            && Arc::ptr_eq(&self.reporting, &other.reporting)
    }
}

impl fmt::Debug for RemoteClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteClientHandle").finish_non_exhaustive()
    }
}

/// Owner of the current [`RemoteClientHandle`].
///
/// Bindings subscribe to it and recompute whenever the handle changes.
/// Dropping the session ends every binding task subscribed to it.
pub struct Session {
    tx: watch::Sender<Option<RemoteClientHandle>>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// A signed-out session
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Publish the handle of a freshly authenticated connection
    pub fn sign_in(&self, handle: RemoteClientHandle) {
        info!("analytics session signed in");
        self.tx.send_replace(Some(handle));
    }

    /// Drop the current handle, if any
    pub fn sign_out(&self) {
        let was_signed_in = self.tx.send_if_modified(|current| current.take().is_some());
        if was_signed_in {
            info!("analytics session signed out");
        }
    }

    pub fn subscribe(&self) -> HandleReceiver {
        self.tx.subscribe()
    }

    pub fn current(&self) -> Option<RemoteClientHandle> {
        self.tx.borrow().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// The reporting capability of the current handle
    pub fn reporting_api(&self) -> Option<Arc<dyn ReportingApi>> {
        self.tx.borrow().as_ref().map(RemoteClientHandle::reporting)
    }

    pub fn metadata_api(&self) -> Option<Arc<dyn MetadataApi>> {
        self.tx.borrow().as_ref().map(RemoteClientHandle::metadata)
    }

    pub fn management_api(&self) -> Option<Arc<dyn ManagementApi>> {
        self.tx.borrow().as_ref().map(RemoteClientHandle::management)
    }
}
