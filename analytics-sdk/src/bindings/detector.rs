//! Long-running-request detection
//!
//! A call cycle races the remote call against a detection timer. If the timer
//! wins, `is_slow` is raised while the call keeps running; once the call
//! settles its outcome is published and, after a grace delay, `is_slow` is
//! lowered again so a UI can show the "slow" state without flicker.
//!
//! Overlapping cycles follow a latest-wins policy: every `spawn` bumps a
//! cycle counter, and a cycle that has been superseded by the time it
//! settles drops its outcome and leaves `is_slow` alone. Superseded calls are
//! not cancelled.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::{self, Either};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{HandleReceiver, RemoteClientHandle};
use crate::config::DetectorConfig;
use crate::error::{Result, ServiceError};
use crate::services::google_analytics::{GetReportsRequest, GetReportsResponse};

struct DetectorState<T> {
    result: watch::Sender<Option<T>>,
    is_slow: watch::Sender<bool>,
    error: watch::Sender<Option<Arc<ServiceError>>>,
    latest_cycle: AtomicU64,
}

impl<T> DetectorState<T> {
    fn is_current(&self, cycle: u64) -> bool {
        self.latest_cycle.load(Ordering::SeqCst) == cycle
    }

    fn set_slow(&self, slow: bool) {
        // only wake observers on a real transition
        self.is_slow
            .send_if_modified(|current| std::mem::replace(current, slow) != slow);
    }

    async fn run_cycle<Fut>(&self, cycle: u64, call: Fut, config: DetectorConfig)
    where
        Fut: Future<Output = Result<T>>,
    {
        let call = Box::pin(call);
        let timer = Box::pin(tokio::time::sleep(config.slow_after));

        let outcome = match future::select(call, timer).await {
            Either::Left((outcome, _timer)) => outcome,
            Either::Right(((), call)) => {
                if self.is_current(cycle) {
                    debug!(cycle, after = ?config.slow_after, "request is taking long");
                    self.set_slow(true);
                }
                call.await
            }
        };

        if !self.is_current(cycle) {
            debug!(cycle, "dropping outcome of superseded request");
            return;
        }

        match outcome {
            Ok(value) => {
                self.result.send_replace(Some(value));
                self.error.send_if_modified(|e| e.take().is_some());
            }
            Err(e) => {
                warn!(cycle, "request failed: {}", e);
                self.error.send_replace(Some(Arc::new(e)));
            }
        }

        tokio::time::sleep(config.grace).await;

        if self.is_current(cycle) {
            self.set_slow(false);
        }
    }
}

/// Runs calls while flagging the ones that take longer than
/// [`DetectorConfig::slow_after`].
pub struct LongRequestDetector<T> {
    config: DetectorConfig,
    state: Arc<DetectorState<T>>,
}

impl<T> LongRequestDetector<T>
where
    T: Send + Sync + 'static,
{
    pub fn new(config: DetectorConfig) -> Self {
        let (result, _) = watch::channel(None);
        let (is_slow, _) = watch::channel(false);
        let (error, _) = watch::channel(None);

        Self {
            config,
            state: Arc::new(DetectorState {
                result,
                is_slow,
                error,
                latest_cycle: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> DetectorConfig {
        self.config
    }

    /// Start a call cycle on the current Tokio runtime.
    ///
    /// The returned handle completes after the grace delay; dropping it does
    /// not stop the cycle.
    pub fn spawn<Fut>(&self, call: Fut) -> JoinHandle<()>
    where
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let cycle = self.state.latest_cycle.fetch_add(1, Ordering::SeqCst) + 1;
        let state = Arc::clone(&self.state);
        let config = self.config;

        debug!(cycle, "starting request");
        tokio::spawn(async move { state.run_cycle(cycle, call, config).await })
    }

    pub fn is_slow(&self) -> bool {
        *self.state.is_slow.borrow()
    }

    /// Most recent failure of the current cycle, cleared by the next success
    pub fn last_error(&self) -> Option<Arc<ServiceError>> {
        self.state.error.borrow().clone()
    }

    pub fn subscribe_result(&self) -> watch::Receiver<Option<T>> {
        self.state.result.subscribe()
    }

    pub fn subscribe_slow(&self) -> watch::Receiver<bool> {
        self.state.is_slow.subscribe()
    }

    pub fn subscribe_error(&self) -> watch::Receiver<Option<Arc<ServiceError>>> {
        self.state.error.subscribe()
    }
}

impl<T> LongRequestDetector<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Most recent published result
    pub fn result(&self) -> Option<T> {
        self.state.result.borrow().clone()
    }
}

impl<T: Send + Sync + 'static> Default for LongRequestDetector<T> {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}

/// Runs `reports.batchGet` for the current handle and request payload
pub struct ReportRequester {
    handles: HandleReceiver,
    request: Option<Arc<GetReportsRequest>>,
    detector: LongRequestDetector<GetReportsResponse>,
}

impl ReportRequester {
    pub fn new(handles: HandleReceiver, config: DetectorConfig) -> Self {
        Self {
            handles,
            request: None,
            detector: LongRequestDetector::new(config),
        }
    }

    pub fn with_request(mut self, request: GetReportsRequest) -> Self {
        self.set_request(Some(request));
        self
    }

    /// Replace the payload used by the next [`trigger`](Self::trigger)
    pub fn set_request(&mut self, request: Option<GetReportsRequest>) {
        self.request = request.map(Arc::new);
    }

    pub fn request(&self) -> Option<&GetReportsRequest> {
        self.request.as_deref()
    }

    /// Start one request cycle.
    ///
    /// Does nothing and returns `None` while signed out or without a request
    /// payload. Results are observed through [`response`](Self::response),
    /// [`is_slow`](Self::is_slow) and [`last_error`](Self::last_error).
    pub fn trigger(&self) -> Option<JoinHandle<()>> {
        let Some(reporting) = self.handles.borrow().as_ref().map(RemoteClientHandle::reporting) else {
            debug!("no analytics handle yet, ignoring trigger");
            return None;
        };

        let Some(request) = self.request.clone() else {
            debug!("no report request yet, ignoring trigger");
            return None;
        };

        Some(
            self.detector
                .spawn(async move { reporting.batch_get(&request).await }),
        )
    }

    pub fn response(&self) -> Option<GetReportsResponse> {
        self.detector.result()
    }

    pub fn is_slow(&self) -> bool {
        self.detector.is_slow()
    }

    pub fn last_error(&self) -> Option<Arc<ServiceError>> {
        self.detector.last_error()
    }

    pub fn subscribe_response(&self) -> watch::Receiver<Option<GetReportsResponse>> {
        self.detector.subscribe_result()
    }

    pub fn subscribe_slow(&self) -> watch::Receiver<bool> {
        self.detector.subscribe_slow()
    }

    pub fn subscribe_error(&self) -> watch::Receiver<Option<Arc<ServiceError>>> {
        self.detector.subscribe_error()
    }
}
