use crate::api::client::ApiClient;
use crate::model::report::{Application, CrashReport, NewCrashReport, SystemInfo};
use crate::screen::error::TriageError;
use crate::view::observable::Observable;
use tracing::info;

/// Fields a user fills in when reporting a crash by hand.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrashDraft {
    pub application_name: String,
    pub application_version: String,
    pub system_version: String,
    pub exit_code: Option<i64>,
    pub stderr_output: String,
}

impl CrashDraft {
    pub fn to_payload(&self) -> NewCrashReport {
        NewCrashReport {
            application: Application {
                name: self.application_name.clone(),
                version: self.application_version.clone(),
            },
            system_info: SystemInfo {
                version: self.system_version.clone(),
            },
            exit_code: self.exit_code,
            stderr_output: self.stderr_output.clone(),
        }
    }
}

/// The "add crash" dialog state shared by both screens.
#[derive(Debug, Default)]
pub struct Composer {
    draft: Observable<CrashDraft>,
    open: Observable<bool>,
}

impl Composer {
    pub fn draft(&self) -> &Observable<CrashDraft> {
        &self.draft
    }

    pub fn open_state(&self) -> &Observable<bool> {
        &self.open
    }

    pub fn is_open(&self) -> bool {
        self.open.get()
    }

    /// Starts a fresh draft.
    pub fn open(&self) {
        self.draft.set(CrashDraft::default());
        self.open.set(true);
    }

    pub fn edit<F>(&self, f: F)
    where
        F: FnOnce(&mut CrashDraft),
    {
        self.draft.update(f);
    }

    /// Submits the current draft and closes the dialog. On failure the dialog
    /// stays as it was.
    pub async fn send(&self, client: &ApiClient) -> Result<CrashReport, TriageError> {
        let payload = self.draft.borrow().to_payload();
        let ack = client.create_report(&payload).await?;

        info!("Crash report submitted, ack id {:?}", ack.crash_report_id);

        self.open.set(false);
        Ok(CrashReport::from_submission(payload, ack))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::id::EntityId;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_open_resets_draft() {
        let composer = Composer::default();
        composer.edit(|d| d.stderr_output = "old".to_string());

        composer.open();
        assert!(composer.is_open());
        assert_eq!(composer.draft().get(), CrashDraft::default());
    }

    #[tokio::test]
    async fn test_send_posts_payload_and_closes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/vd1/crash-reports/"))
            .and(body_json(json!({"crash_report": {
                "application": {"name": "nautilus", "version": "3.10.1"},
                "system_info": {"version": "Ubuntu 14.04"},
                "exit_code": 11,
                "stderr_output": "boom"
            }})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "crash_report_ack": {"crash_report_id": 5}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::with_base_url(&format!("{}/vd1/", server.uri())).unwrap();
        let composer = Composer::default();
        composer.open();
        composer.edit(|d| {
            d.application_name = "nautilus".to_string();
            d.application_version = "3.10.1".to_string();
            d.system_version = "Ubuntu 14.04".to_string();
            d.exit_code = Some(11);
            d.stderr_output = "boom".to_string();
        });

        let report = composer.send(&client).await.unwrap();
        assert_eq!(report.crash_report_id, Some(EntityId::Num(5)));
        assert_eq!(report.application.name, "nautilus");
        assert!(!composer.is_open());
    }

    #[tokio::test]
    async fn test_failed_send_keeps_dialog_open() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = ApiClient::with_base_url(&format!("{}/vd1/", server.uri())).unwrap();
        let composer = Composer::default();
        composer.open();

        assert!(composer.send(&client).await.is_err());
        assert!(composer.is_open());
    }

    #[tokio::test]
    async fn test_send_without_opening_posts_empty_draft() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/vd1/crash-reports/"))
            .and(body_json(json!({"crash_report": {
                "application": {"name": "", "version": ""},
                "system_info": {"version": ""},
                "exit_code": null,
                "stderr_output": ""
            }})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "crash_report_ack": {"crash_report_id": 6}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::with_base_url(&format!("{}/vd1/", server.uri())).unwrap();
        let composer = Composer::default();

        let report = composer.send(&client).await.unwrap();
        assert_eq!(report.crash_report_id, Some(EntityId::Num(6)));
        assert_eq!(report.exit_code, None);
        assert!(!composer.is_open());
    }
}
