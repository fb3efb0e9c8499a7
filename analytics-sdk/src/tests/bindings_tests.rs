//! Tests for the session-driven bindings
//!
//! The capabilities are replaced with mockall mocks so each test controls
//! exactly what the remote side answers.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use mockall::predicate::eq;
    use serde_json::json;
    use tokio::time::{sleep, sleep_until, timeout, Instant};

    use crate::bindings::{DimensionsAndMetrics, RemoteClientHandle, SavedSegments, Session};
    use crate::core::{ManagementApi, MockManagementApi, MockMetadataApi, MockReportingApi};
    use crate::error::{Result, ServiceError};
    use crate::services::google_analytics::{Columns, Segments};

    const WAIT: Duration = Duration::from_secs(5);

    fn columns_fixture() -> Columns {
        serde_json::from_value(json!({
            "kind": "analytics#columns",
            "totalResults": 4,
            "items": [
                {"id": "ga:userType", "attributes": {"type": "DIMENSION", "uiName": "User Type"}},
                {"id": "ga:users", "attributes": {"type": "METRIC", "uiName": "Users"}},
                {"id": "ga:mystery", "attributes": {"uiName": "No type"}},
                {"id": "ga:sessionDuration", "attributes": {"type": "METRIC"}}
            ]
        }))
        .unwrap()
    }

    fn segments_fixture(names: &[&str]) -> Segments {
        let items: Vec<_> = names
            .iter()
            .enumerate()
            .map(|(i, name)| json!({"id": format!("-{}", i + 1), "segmentId": format!("gaid::-{}", i + 1), "name": name, "type": "BUILT_IN"}))
            .collect();
        serde_json::from_value(json!({"totalResults": items.len(), "items": items})).unwrap()
    }

    fn handle_with(metadata: MockMetadataApi, management: MockManagementApi) -> RemoteClientHandle {
        RemoteClientHandle::from_parts(
            Arc::new(metadata),
            Arc::new(management),
            Arc::new(MockReportingApi::new()),
        )
    }

    /// Answers with a single named segment after `delay`
    struct DelayedSegments {
        delay: Duration,
        name: &'static str,
    }

    #[async_trait]
    impl ManagementApi for DelayedSegments {
        async fn list_segments(&self) -> Result<Segments> {
            sleep(self.delay).await;
            Ok(segments_fixture(&[self.name]))
        }
    }

    fn delayed_handle(millis: u64, name: &'static str) -> RemoteClientHandle {
        RemoteClientHandle::from_parts(
            Arc::new(MockMetadataApi::new()),
            Arc::new(DelayedSegments {
                delay: Duration::from_millis(millis),
                name,
            }),
            Arc::new(MockReportingApi::new()),
        )
    }

    fn ids<T, F: Fn(&T) -> &str>(items: &[T], id: F) -> Vec<String> {
        items.iter().map(|item| id(item).to_string()).collect()
    }

    #[tokio::test]
    async fn test_columns_start_absent_and_split_on_sign_in() {
        let session = Session::new();
        let binding = DimensionsAndMetrics::spawn(session.subscribe());

        assert!(binding.dimensions().is_none());
        assert!(binding.metrics().is_none());

        let mut metadata = MockMetadataApi::new();
        metadata
            .expect_list_columns()
            .with(eq("ga"))
            .times(1)
            .returning(|_| Ok(columns_fixture()));
        session.sign_in(handle_with(metadata, MockManagementApi::new()));

        let mut dimensions_rx = binding.subscribe_dimensions();
        timeout(WAIT, dimensions_rx.wait_for(|d| d.is_some()))
            .await
            .expect("dimensions should load")
            .unwrap();

        let dimensions = binding.dimensions().unwrap();
        let metrics = binding.metrics().unwrap();
        assert_eq!(ids(&dimensions, |c| c.id.as_str()), ["ga:userType"]);
        assert_eq!(ids(&metrics, |c| c.id.as_str()), ["ga:users", "ga:sessionDuration"]);
    }

    #[tokio::test]
    async fn test_columns_missing_items_load_as_empty() {
        let session = Session::new();
        let binding = DimensionsAndMetrics::spawn(session.subscribe());

        let mut metadata = MockMetadataApi::new();
        metadata
            .expect_list_columns()
            .returning(|_| Ok(Columns::default()));
        session.sign_in(handle_with(metadata, MockManagementApi::new()));

        let mut metrics_rx = binding.subscribe_metrics();
        timeout(WAIT, metrics_rx.wait_for(|m| m.is_some()))
            .await
            .expect("metrics should load")
            .unwrap();

        assert_eq!(binding.dimensions(), Some(Vec::new()));
        assert_eq!(binding.metrics(), Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_columns_clear_on_sign_out() {
        let session = Session::new();
        let mut metadata = MockMetadataApi::new();
        metadata
            .expect_list_columns()
            .returning(|_| Ok(columns_fixture()));
        session.sign_in(handle_with(metadata, MockManagementApi::new()));

        // handle already present when the binding starts
        let binding = DimensionsAndMetrics::spawn(session.subscribe());
        let mut dimensions_rx = binding.subscribe_dimensions();
        timeout(WAIT, dimensions_rx.wait_for(|d| d.is_some()))
            .await
            .expect("dimensions should load")
            .unwrap();

        session.sign_out();
        timeout(WAIT, dimensions_rx.wait_for(|d| d.is_none()))
            .await
            .expect("dimensions should clear")
            .unwrap();
        assert!(binding.metrics().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_columns_failure_leaves_lists_absent() {
        let session = Session::new();
        let binding = DimensionsAndMetrics::spawn(session.subscribe());

        let mut metadata = MockMetadataApi::new();
        metadata
            .expect_list_columns()
            .times(1)
            .returning(|_| Err(ServiceError::authorization("no access to this property")));
        session.sign_in(handle_with(metadata, MockManagementApi::new()));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(binding.dimensions().is_none());
        assert!(binding.metrics().is_none());
    }

    #[tokio::test]
    async fn test_segments_reload_when_handle_changes() {
        let session = Session::new();
        let binding = SavedSegments::spawn(session.subscribe());
        assert!(binding.get().is_none());

        let mut first = MockManagementApi::new();
        first
            .expect_list_segments()
            .times(1)
            .returning(|| Ok(segments_fixture(&["All Users"])));
        session.sign_in(handle_with(MockMetadataApi::new(), first));

        let mut segments_rx = binding.subscribe();
        timeout(WAIT, segments_rx.wait_for(|s| s.as_ref().is_some_and(|s| s.len() == 1)))
            .await
            .expect("first listing should load")
            .unwrap();

        let mut second = MockManagementApi::new();
        second
            .expect_list_segments()
            .times(1)
            .returning(|| Ok(segments_fixture(&["All Users", "New Users", "Bounced Sessions"])));
        session.sign_in(handle_with(MockMetadataApi::new(), second));

        timeout(WAIT, segments_rx.wait_for(|s| s.as_ref().is_some_and(|s| s.len() == 3)))
            .await
            .expect("second listing should load")
            .unwrap();

        let segments = binding.get().unwrap();
        assert_eq!(ids(&segments, |s| s.name.as_str()), ["All Users", "New Users", "Bounced Sessions"]);
        assert_eq!(segments[1].segment_id.as_deref(), Some("gaid::-2"));
    }

    #[tokio::test]
    async fn test_segments_without_items_load_as_empty() {
        let session = Session::new();
        let binding = SavedSegments::spawn(session.subscribe());

        let mut management = MockManagementApi::new();
        management
            .expect_list_segments()
            .returning(|| Ok(Segments::default()));
        session.sign_in(handle_with(MockMetadataApi::new(), management));

        let mut segments_rx = binding.subscribe();
        timeout(WAIT, segments_rx.wait_for(|s| s.is_some()))
            .await
            .expect("segments should load")
            .unwrap();
        assert_eq!(binding.get(), Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_segments_clear_on_sign_out() {
        let session = Session::new();
        let binding = SavedSegments::spawn(session.subscribe());

        let mut management = MockManagementApi::new();
        management
            .expect_list_segments()
            .times(1)
            .returning(|| Ok(segments_fixture(&["All Users"])));
        session.sign_in(handle_with(MockMetadataApi::new(), management));

        let mut segments_rx = binding.subscribe();
        timeout(WAIT, segments_rx.wait_for(|s| s.is_some()))
            .await
            .expect("segments should load")
            .unwrap();

        session.sign_out();
        timeout(WAIT, segments_rx.wait_for(|s| s.is_none()))
            .await
            .expect("segments should clear")
            .unwrap();
        assert!(binding.get().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_listing_from_replaced_handle_is_dropped() {
        let session = Session::new();
        let binding = SavedSegments::spawn(session.subscribe());
        let start = Instant::now();

        session.sign_in(delayed_handle(1000, "old"));
        sleep_until(start + Duration::from_millis(10)).await;
        session.sign_in(delayed_handle(100, "new"));

        sleep_until(start + Duration::from_millis(120)).await;
        assert_eq!(ids(&binding.get().unwrap(), |s| s.name.as_str()), ["new"]);

        // the old listing would have finished at 1000ms
        let mut segments_rx = binding.subscribe();
        segments_rx.borrow_and_update();
        sleep_until(start + Duration::from_millis(1100)).await;
        assert!(!segments_rx.has_changed().unwrap());
        assert_eq!(ids(&binding.get().unwrap(), |s| s.name.as_str()), ["new"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sign_out_during_listing_keeps_segments_absent() {
        let session = Session::new();
        let binding = SavedSegments::spawn(session.subscribe());
        let start = Instant::now();

        session.sign_in(delayed_handle(500, "All Users"));
        sleep_until(start + Duration::from_millis(10)).await;
        session.sign_out();

        sleep_until(start + Duration::from_millis(600)).await;
        assert!(binding.get().is_none());
    }

    #[test]
    fn test_session_accessors() {
        let session = Session::new();
        assert!(!session.is_signed_in());
        assert!(session.reporting_api().is_none());
        assert!(session.metadata_api().is_none());

        let handle = handle_with(MockMetadataApi::new(), MockManagementApi::new());
        session.sign_in(handle.clone());
        assert!(session.is_signed_in());
        assert!(session.management_api().is_some());
        assert!(session.current().unwrap().same_connection(&handle));

        // same reporting capability, different metadata and management
        let mixed = RemoteClientHandle::from_parts(
            Arc::new(MockMetadataApi::new()),
            Arc::new(MockManagementApi::new()),
            handle.reporting(),
        );
        assert!(!mixed.same_connection(&handle));
        assert!(mixed.same_connection(&mixed.clone()));

        session.sign_out();
        assert!(session.current().is_none());
    }
}
