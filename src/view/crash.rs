use crate::api::client::{ApiClient, ApiError};
use crate::model::id::EntityId;
use crate::model::report::{Application, CrashReport, ExitCode, SystemInfo};
use crate::view::group::GroupView;
use futures::future::join_all;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

static NEXT_VIEW_KEY: AtomicU64 = AtomicU64::new(1);

/// Identity of one view instance. Two views of the same report are still
/// different items in a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewKey(u64);

impl ViewKey {
    fn next() -> Self {
        ViewKey(NEXT_VIEW_KEY.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for ViewKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrashView {
    key: ViewKey,
    pub report_id: Option<EntityId>,
    pub report_url: String,
    pub group_id: Option<EntityId>,
    pub exit_code: Option<ExitCode>,
    pub stderr_output: String,
    pub application: Application,
    pub system_info: SystemInfo,
    pub group: Option<GroupView>,
}

/// Handle on a running group lookup for one crash view. Dropping the handle
/// cancels the lookup.
#[derive(Debug)]
pub struct GroupFetch {
    key: ViewKey,
    handle: JoinHandle<Result<GroupView, ApiError>>,
}

impl CrashView {
    pub fn new(report: &CrashReport) -> Self {
        CrashView {
            key: ViewKey::next(),
            report_id: report.crash_report_id.clone(),
            report_url: report.crash_report_url.clone().unwrap_or_default(),
            group_id: report.crash_group_id.clone(),
            exit_code: report.exit_code.clone(),
            stderr_output: report.stderr_output.clone(),
            application: report.application.clone(),
            system_info: report.system_info.clone(),
            group: None,
        }
    }

    pub fn key(&self) -> ViewKey {
        self.key
    }

    /// Report id as shown to a user; empty when the service never assigned one.
    pub fn display_id(&self) -> String {
        self.report_id
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default()
    }

    pub fn set_group(&mut self, group: GroupView) {
        self.group = Some(group);
    }

    /// Starts fetching the owning group in the background. Unassigned views
    /// have nothing to fetch.
    pub fn spawn_group_fetch(&self, client: &ApiClient) -> Option<GroupFetch> {
        let group_id = self.group_id.clone()?;
        let client = client.clone();

        debug!("Fetching group {} for crash view {}", group_id, self.key);

        let handle = tokio::spawn(async move {
            let group = client.get_group(&group_id).await?;
            Ok(GroupView::new(&group))
        });

        Some(GroupFetch {
            key: self.key,
            handle,
        })
    }
}

impl GroupFetch {
    pub fn key(&self) -> ViewKey {
        self.key
    }

    pub fn abort(&self) {
        self.handle.abort();
    }

    /// `None` when the fetch was aborted before it finished.
    pub async fn join(mut self) -> Option<Result<GroupView, ApiError>> {
        match (&mut self.handle).await {
            Ok(result) => Some(result),
            Err(e) if e.is_cancelled() => None,
            Err(e) => std::panic::resume_unwind(e.into_panic()),
        }
    }
}

impl Drop for GroupFetch {
    fn drop(&mut self) {
        self.abort();
    }
}

/// Fills the group slot of every assigned view, fetching concurrently. A
/// failed lookup leaves that slot empty.
pub async fn load_groups(client: &ApiClient, views: &mut [CrashView]) {
    let fetches: Vec<GroupFetch> = views
        .iter()
        .filter_map(|view| view.spawn_group_fetch(client))
        .collect();

    let lookups = fetches.into_iter().map(|fetch| async move {
        let key = fetch.key();
        (key, fetch.join().await)
    });

    for (key, result) in join_all(lookups).await {
        let Some(view) = views.iter_mut().find(|v| v.key() == key) else {
            continue;
        };
        match result {
            Some(Ok(group)) => view.set_group(group),
            Some(Err(e)) => warn!(
                "Failed to load group for crash report {}: {}",
                view.display_id(),
                e
            ),
            None => warn!(
                "Group lookup for crash report {} was cancelled",
                view.display_id()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn assigned(id: i64, group: i64) -> CrashReport {
        CrashReport {
            crash_report_id: Some(EntityId::Num(id)),
            crash_group_id: Some(EntityId::Num(group)),
            ..CrashReport::default()
        }
    }

    #[test]
    fn test_empty_report_defaults() {
        let view = CrashView::new(&CrashReport::default());
        assert_eq!(view.display_id(), "");
        assert_eq!(view.report_url, "");
        assert_eq!(view.application.name, "");
        assert_eq!(view.system_info.version, "");
        assert!(view.group.is_none());
    }

    #[test]
    fn test_views_of_same_report_have_distinct_keys() {
        let report = assigned(1, 2);
        let a = CrashView::new(&report);
        let b = CrashView::new(&report);
        assert_ne!(a.key(), b.key());
        assert_eq!(a.clone().key(), a.key());
    }

    #[tokio::test]
    async fn test_unassigned_view_issues_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = ApiClient::with_base_url(&format!("{}/vd1/", server.uri())).unwrap();
        let view = CrashView::new(&CrashReport::default());
        assert!(view.spawn_group_fetch(&client).is_none());
    }

    #[tokio::test]
    async fn test_spawned_fetch_fills_slot() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/vd1/crash-groups/4"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "crash_group_id": 4,
                "crash_group_url": "u4"
            })))
            .mount(&server)
            .await;

        let client = ApiClient::with_base_url(&format!("{}/vd1/", server.uri())).unwrap();
        let mut view = CrashView::new(&assigned(1, 4));

        let fetch = view.spawn_group_fetch(&client).unwrap();
        assert_eq!(fetch.key(), view.key());
        let group = fetch.join().await.unwrap().unwrap();
        view.set_group(group);

        assert_eq!(view.group.unwrap().group_url, "u4");
    }

    #[tokio::test]
    async fn test_aborted_fetch_joins_to_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"crash_group_id": 4}))
                    .set_delay(std::time::Duration::from_secs(10)),
            )
            .mount(&server)
            .await;

        let client = ApiClient::with_base_url(&format!("{}/vd1/", server.uri())).unwrap();
        let view = CrashView::new(&assigned(1, 4));

        let fetch = view.spawn_group_fetch(&client).unwrap();
        fetch.abort();
        assert!(fetch.join().await.is_none());
    }

    #[tokio::test]
    async fn test_dropped_fetch_cancels_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"crash_group_id": 4}))
                    .set_delay(std::time::Duration::from_secs(10)),
            )
            .mount(&server)
            .await;

        let client = ApiClient::with_base_url(&format!("{}/vd1/", server.uri())).unwrap();
        let view = CrashView::new(&assigned(1, 4));

        let fetch = view.spawn_group_fetch(&client).unwrap();
        let task = fetch.handle.abort_handle();
        drop(fetch);

        tokio::time::timeout(std::time::Duration::from_secs(2), async {
            while !task.is_finished() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_load_groups_skips_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/vd1/crash-groups/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "crash_group_id": 1,
                "crash_group_url": "u1"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/vd1/crash-groups/2"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = ApiClient::with_base_url(&format!("{}/vd1/", server.uri())).unwrap();
        let mut views = vec![
            CrashView::new(&assigned(10, 1)),
            CrashView::new(&assigned(11, 2)),
            CrashView::new(&CrashReport::default()),
        ];

        load_groups(&client, &mut views).await;

        assert_eq!(views[0].group.as_ref().unwrap().group_url, "u1");
        assert!(views[1].group.is_none());
        assert!(views[2].group.is_none());
    }
}
