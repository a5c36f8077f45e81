use crate::model::de::deserialize_null_default;
use crate::model::id::{deserialize_optional_id, EntityId};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

// crash report struct
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct CrashReport {
    #[serde(
        default,
        alias = "id",
        deserialize_with = "deserialize_optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub crash_report_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crash_report_url: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub crash_group_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crash_group_url: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_null_default",
        skip_serializing_if = "Application::is_empty"
    )]
    pub application: Application,
    #[serde(
        default,
        deserialize_with = "deserialize_null_default",
        skip_serializing_if = "SystemInfo::is_empty"
    )]
    pub system_info: SystemInfo,
    #[serde(
        default,
        deserialize_with = "deserialize_exit_code",
        skip_serializing_if = "Option::is_none"
    )]
    pub exit_code: Option<ExitCode>,
    #[serde(
        default,
        deserialize_with = "deserialize_null_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub stderr_output: String,
    // fields the triage client does not model, kept for GET -> PUT round trips
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Application {
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct SystemInfo {
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub version: String,
}

/// Exit code as reported. Some reporters send signal names or other text
/// instead of a number; that text is kept as-is.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum ExitCode {
    Code(i64),
    Text(String),
}

impl ExitCode {
    pub fn code(&self) -> Option<i64> {
        match self {
            ExitCode::Code(code) => Some(*code),
            ExitCode::Text(_) => None,
        }
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitCode::Code(code) => write!(f, "{}", code),
            ExitCode::Text(text) => write!(f, "{}", text),
        }
    }
}

impl Application {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.version.is_empty()
    }
}

impl SystemInfo {
    pub fn is_empty(&self) -> bool {
        self.version.is_empty()
    }
}

/// Reads an exit code, treating `null` and `""` as absent. Numeric strings
/// become codes, any other text is kept.
fn deserialize_exit_code<'de, D>(deserializer: D) -> Result<Option<ExitCode>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(code) => Ok(Some(ExitCode::Code(code))),
            None => Ok(Some(ExitCode::Text(n.to_string()))),
        },
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Ok(None)
            } else if let Ok(code) = trimmed.parse::<i64>() {
                Ok(Some(ExitCode::Code(code)))
            } else {
                Ok(Some(ExitCode::Text(s)))
            }
        }
        Some(other) => Err(D::Error::custom(format!(
            "unsupported exit code value: {}",
            other
        ))),
    }
}

/// `{"crash_report": {...}}` as it travels over the wire.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CrashReportEnvelope {
    pub crash_report: CrashReport,
}

/// Payload of a freshly composed report. Group and solution fields are never
/// part of a submission.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct NewCrashReport {
    pub application: Application,
    pub system_info: SystemInfo,
    pub exit_code: Option<i64>,
    pub stderr_output: String,
}

#[derive(Debug, Serialize, Clone)]
pub struct NewCrashReportEnvelope<'a> {
    pub crash_report: &'a NewCrashReport,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct CrashReportAck {
    #[serde(default, alias = "id", deserialize_with = "deserialize_optional_id")]
    pub crash_report_id: Option<EntityId>,
    #[serde(default)]
    pub crash_report_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CrashReportAckEnvelope {
    #[serde(default)]
    pub crash_report_ack: CrashReportAck,
}

impl CrashReport {
    pub fn is_assigned(&self) -> bool {
        self.crash_group_id.is_some()
    }

    pub fn belongs_to(&self, group_id: &EntityId) -> bool {
        self.crash_group_id.as_ref() == Some(group_id)
    }

    pub fn assign_to(&mut self, group_id: EntityId, group_url: Option<String>) {
        self.crash_group_id = Some(group_id);
        self.crash_group_url = group_url;
    }

    /// Local copy of a submitted report, completed with what the service
    /// acknowledged.
    pub fn from_submission(submitted: NewCrashReport, ack: CrashReportAck) -> Self {
        CrashReport {
            crash_report_id: ack.crash_report_id,
            crash_report_url: ack.crash_report_url,
            application: submitted.application,
            system_info: submitted.system_info,
            exit_code: submitted.exit_code.map(ExitCode::Code),
            stderr_output: submitted.stderr_output,
            extra: ack.extra,
            ..CrashReport::default()
        }
    }
}
