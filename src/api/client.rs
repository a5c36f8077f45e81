use crate::config::config::{ApiConfig, Config, ProxyConfig};
use crate::model::group::CrashGroup;
use crate::model::id::EntityId;
use crate::model::report::{
    CrashReport, CrashReportAck, CrashReportAckEnvelope, CrashReportEnvelope, NewCrashReport,
    NewCrashReportEnvelope,
};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

const CRASH_REPORTS: &str = "crash-reports/";
const CRASH_GROUPS: &str = "crash-groups";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid API url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Request {method} {url} failed: {source}")]
    Transport {
        method: Method,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{method} {url} returned HTTP {status}")]
    Status {
        method: Method,
        url: String,
        status: StatusCode,
    },

    #[error("Failed to decode response of {method} {url}: {source}")]
    Decode {
        method: Method,
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Typed access to the crash service under its `/vd1/` base.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(api: &ApiConfig, proxy: Option<&ProxyConfig>) -> Result<Self, ApiError> {
        let base_url = parse_base_url(&api.base_url)?;

        let builder = Client::builder().timeout(api.timeout);
        let builder = match proxy {
            Some(proxy) => {
                let proxy_url = proxy.url();
                let proxy = reqwest::Proxy::all(&proxy_url).map_err(ApiError::Client)?;
                info!("Using HTTP proxy {}", proxy_url);
                builder.proxy(proxy)
            }
            None => builder.no_proxy(),
        };

        let http = builder.build().map_err(ApiError::Client)?;

        Ok(ApiClient { http, base_url })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(&config.api, config.proxy.as_ref())
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, ApiError> {
        Self::new(
            &ApiConfig {
                base_url: base_url.to_string(),
                timeout: Duration::from_secs(30),
            },
            None,
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn list_reports(&self) -> Result<Vec<CrashReport>, ApiError> {
        let url = self.url(CRASH_REPORTS)?;
        let response = self.send(Method::GET, &url, |r| r).await?;
        let records: Vec<Value> = decode(Method::GET, &url, response).await?;
        let total = records.len();

        // one malformed record must not hide the rest of the list
        let reports: Vec<CrashReport> = records
            .into_iter()
            .enumerate()
            .filter_map(
                |(index, record)| match serde_json::from_value::<CrashReportEnvelope>(record) {
                    Ok(envelope) => Some(envelope.crash_report),
                    Err(e) => {
                        warn!("Skipping crash report #{} from {}: {}", index, url, e);
                        None
                    }
                },
            )
            .collect();

        info!("Fetched {} of {} crash reports", reports.len(), total);

        Ok(reports)
    }

    pub async fn get_report(&self, id: &EntityId) -> Result<CrashReport, ApiError> {
        let url = self.report_url(id)?;
        let response = self.send(Method::GET, &url, |r| r).await?;
        let envelope: CrashReportEnvelope = decode(Method::GET, &url, response).await?;
        Ok(envelope.crash_report)
    }

    /// Returns whatever status the service answered with; callers decide what
    /// counts as persisted.
    pub async fn update_report(
        &self,
        id: &EntityId,
        report: &CrashReport,
    ) -> Result<StatusCode, ApiError> {
        let url = self.report_url(id)?;
        let body = CrashReportEnvelope {
            crash_report: report.clone(),
        };
        debug!("PUT {} body: {:?}", url, body);

        let response = self
            .http
            .put(url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                method: Method::PUT,
                url: url.to_string(),
                source,
            })?;

        Ok(response.status())
    }

    pub async fn create_report(&self, report: &NewCrashReport) -> Result<CrashReportAck, ApiError> {
        let url = self.url(CRASH_REPORTS)?;
        let body = NewCrashReportEnvelope {
            crash_report: report,
        };
        debug!("POST {} body: {:?}", url, body);

        let response = self.send(Method::POST, &url, |r| r.json(&body)).await?;
        let ack: CrashReportAckEnvelope = decode(Method::POST, &url, response).await?;
        Ok(ack.crash_report_ack)
    }

    pub async fn delete_report(&self, id: &EntityId) -> Result<(), ApiError> {
        let url = self.report_url(id)?;
        self.send(Method::DELETE, &url, |r| r).await?;
        info!("Deleted crash report {}", id);
        Ok(())
    }

    pub async fn get_group(&self, id: &EntityId) -> Result<CrashGroup, ApiError> {
        let url = self.url(&format!("{}/{}", CRASH_GROUPS, id.as_path_segment()))?;
        let response = self.send(Method::GET, &url, |r| r).await?;
        decode(Method::GET, &url, response).await
    }

    pub async fn create_group(&self) -> Result<CrashGroup, ApiError> {
        let url = self.url(CRASH_GROUPS)?;
        let response = self.send(Method::PUT, &url, |r| r).await?;
        let group: CrashGroup = decode(Method::PUT, &url, response).await?;

        info!("Created crash group {:?}", group.crash_group_id);

        Ok(group)
    }

    fn report_url(&self, id: &EntityId) -> Result<Url, ApiError> {
        self.url(&format!("{}{}", CRASH_REPORTS, id.as_path_segment()))
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::InvalidUrl {
                url: format!("{}{}", self.base_url, path),
                reason: e.to_string(),
            })
    }

    async fn send<F>(&self, method: Method, url: &Url, build: F) -> Result<Response, ApiError>
    where
        F: FnOnce(RequestBuilder) -> RequestBuilder,
    {
        debug!("{} {}", method, url);

        let request = build(self.http.request(method.clone(), url.clone()));
        let response = request.send().await.map_err(|source| ApiError::Transport {
            method: method.clone(),
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                method,
                url: url.to_string(),
                status,
            });
        }

        Ok(response)
    }
}

async fn decode<T: DeserializeOwned>(
    method: Method,
    url: &Url,
    response: Response,
) -> Result<T, ApiError> {
    response.json::<T>().await.map_err(|source| ApiError::Decode {
        method,
        url: url.to_string(),
        source,
    })
}

// Url::join drops the last segment unless the base ends with '/'
fn parse_base_url(base_url: &str) -> Result<Url, ApiError> {
    let normalized = if base_url.ends_with('/') {
        base_url.to_string()
    } else {
        format!("{}/", base_url)
    };

    Url::parse(&normalized).map_err(|e| ApiError::InvalidUrl {
        url: base_url.to_string(),
        reason: e.to_string(),
    })
}
