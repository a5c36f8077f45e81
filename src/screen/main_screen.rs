use crate::api::client::ApiClient;
use crate::model::id::EntityId;
use crate::repository::query::{crash_groups, unassigned_reports};
use crate::repository::snapshot::Repository;
use crate::screen::composer::Composer;
use crate::screen::error::TriageError;
use crate::screen::notify::Notifier;
use crate::view::crash::{load_groups, CrashView, ViewKey};
use crate::view::group::CrashGroupDetails;
use crate::view::observable::Observable;
use reqwest::StatusCode;
use std::sync::Arc;
use tracing::info;

/// Triage page: the known groups on one side, unassigned reports on the
/// other.
pub struct MainScreen {
    client: ApiClient,
    repo: Repository,
    notifier: Arc<dyn Notifier>,
    crash_groups: Observable<Vec<CrashGroupDetails>>,
    crash_reports: Observable<Vec<CrashView>>,
    selected_group: Observable<Option<EntityId>>,
    group_to_view: Observable<Option<CrashGroupDetails>>,
    composer: Composer,
}

impl MainScreen {
    pub fn new(repo: Repository, client: ApiClient, notifier: Arc<dyn Notifier>) -> Self {
        MainScreen {
            crash_groups: Observable::new(crash_groups(&repo)),
            crash_reports: Observable::new(unassigned_reports(&repo)),
            selected_group: Observable::default(),
            group_to_view: Observable::default(),
            composer: Composer::default(),
            client,
            repo,
            notifier,
        }
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    pub fn crash_groups(&self) -> &Observable<Vec<CrashGroupDetails>> {
        &self.crash_groups
    }

    pub fn crash_reports(&self) -> &Observable<Vec<CrashView>> {
        &self.crash_reports
    }

    pub fn selected_group(&self) -> &Observable<Option<EntityId>> {
        &self.selected_group
    }

    pub fn group_to_view(&self) -> &Observable<Option<CrashGroupDetails>> {
        &self.group_to_view
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn select_group(&self, group_id: Option<EntityId>) {
        self.selected_group.set(group_id);
    }

    /// Moves an unassigned report into the selected group. The report only
    /// leaves the list once the service confirmed the update with HTTP 200.
    pub async fn assign_report(&mut self, key: ViewKey) -> Result<(), TriageError> {
        let result = self.try_assign_report(key).await;
        self.surface(result)
    }

    async fn try_assign_report(&mut self, key: ViewKey) -> Result<(), TriageError> {
        let group_id = self
            .selected_group
            .get()
            .ok_or(TriageError::NoGroupSelected)?;
        let group_url = self
            .repo
            .group(&group_id)
            .ok_or_else(|| TriageError::UnknownGroup(group_id.clone()))?
            .crash_group_url
            .clone();
        let report_id = self
            .crash_reports
            .find(|view| view.key() == key, |view| view.report_id.clone())
            .ok_or(TriageError::UnknownView(key))?
            .ok_or(TriageError::MissingReportId)?;

        info!(
            "Assigning crash report {} to group {}",
            report_id, group_id
        );

        let mut report = self.client.get_report(&report_id).await?;
        report.assign_to(group_id.clone(), group_url);

        let status = self.client.update_report(&report_id, &report).await?;
        if status != StatusCode::OK {
            return Err(TriageError::Rejected {
                id: report_id,
                status,
            });
        }

        self.crash_reports.remove_first(|view| view.key() == key);
        if !self.repo.assign(&report_id, &group_id) {
            self.repo.push_report(report);
        }
        self.crash_groups.set(crash_groups(&self.repo));

        info!("Crash report {} assigned to group {}", report_id, group_id);

        Ok(())
    }

    pub fn add_crash(&self) {
        self.composer.open();
    }

    /// Submits the composed report; it shows up among the unassigned ones.
    pub async fn send_crash(&mut self) -> Result<ViewKey, TriageError> {
        let result = self.composer.send(&self.client).await;
        let report = self.surface(result)?;

        let view = CrashView::new(&report);
        let key = view.key();
        self.repo.push_report(report);
        self.crash_reports.push(view);

        Ok(key)
    }

    pub async fn send_crash_group(&mut self) -> Result<Option<EntityId>, TriageError> {
        let result = self.client.create_group().await.map_err(TriageError::from);
        let group = self.surface(result)?;

        let group_id = group.crash_group_id.clone();
        self.crash_groups.push(CrashGroupDetails::empty(&group));
        self.repo.push_group(group);

        Ok(group_id)
    }

    /// Publishes a fresh details view of the group, with each member crash's
    /// group slot loaded from the service.
    pub async fn view_crash_group(&self, group_id: &EntityId) -> Result<(), TriageError> {
        let result = self
            .repo
            .group(group_id)
            .map(|group| CrashGroupDetails::new(&self.repo, group))
            .ok_or_else(|| TriageError::UnknownGroup(group_id.clone()));
        let mut details = self.surface(result)?;

        load_groups(&self.client, &mut details.crashes).await;

        self.group_to_view.set(Some(details));
        Ok(())
    }

    pub fn close_group_view(&self) {
        self.group_to_view.set(None);
    }

    fn surface<T>(&self, result: Result<T, TriageError>) -> Result<T, TriageError> {
        if let Err(e) = &result {
            self.notifier.notify(e);
        }
        result
    }
}
