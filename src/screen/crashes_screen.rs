use crate::api::client::ApiClient;
use crate::screen::composer::Composer;
use crate::screen::error::TriageError;
use crate::screen::notify::Notifier;
use crate::view::crash::{load_groups, CrashView, ViewKey};
use crate::view::observable::Observable;
use std::sync::Arc;
use tracing::info;

/// Flat list of every crash report the service knows about.
pub struct CrashesScreen {
    client: ApiClient,
    notifier: Arc<dyn Notifier>,
    crashes: Observable<Vec<CrashView>>,
    composer: Composer,
}

impl CrashesScreen {
    pub fn new(client: ApiClient, notifier: Arc<dyn Notifier>) -> Self {
        CrashesScreen {
            client,
            notifier,
            crashes: Observable::default(),
            composer: Composer::default(),
        }
    }

    pub fn crashes(&self) -> &Observable<Vec<CrashView>> {
        &self.crashes
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    /// Fetches all reports and their groups, replacing the current list.
    pub async fn load(&self) -> Result<usize, TriageError> {
        let result = self.client.list_reports().await.map_err(TriageError::from);
        let reports = self.surface(result)?;

        let mut views: Vec<CrashView> = reports.iter().map(CrashView::new).collect();
        load_groups(&self.client, &mut views).await;

        let count = views.len();
        self.crashes.set(views);

        info!("Crashes screen loaded {} reports", count);

        Ok(count)
    }

    /// Deletes the report behind `key`. The list is only touched once the
    /// service confirmed the deletion.
    pub async fn remove(&self, key: ViewKey) -> Result<(), TriageError> {
        let result = self.try_remove(key).await;
        self.surface(result)
    }

    async fn try_remove(&self, key: ViewKey) -> Result<(), TriageError> {
        let report_id = self
            .crashes
            .find(|view| view.key() == key, |view| view.report_id.clone())
            .ok_or(TriageError::UnknownView(key))?
            .ok_or(TriageError::MissingReportId)?;

        self.client
            .delete_report(&report_id)
            .await
            .map_err(|source| TriageError::RemoveFailed {
                id: report_id.to_string(),
                source,
            })?;

        self.crashes.remove_first(|view| view.key() == key);
        Ok(())
    }

    pub fn add_crash(&self) {
        self.composer.open();
    }

    pub async fn send_crash(&self) -> Result<ViewKey, TriageError> {
        let result = self.composer.send(&self.client).await;
        let report = self.surface(result)?;

        let view = CrashView::new(&report);
        let key = view.key();
        self.crashes.push(view);

        Ok(key)
    }

    fn surface<T>(&self, result: Result<T, TriageError>) -> Result<T, TriageError> {
        if let Err(e) = &result {
            self.notifier.notify(e);
        }
        result
    }
}
