use crate::api::client::ApiError;
use crate::model::id::EntityId;
use crate::view::crash::ViewKey;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TriageError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("No crash group selected")]
    NoGroupSelected,

    #[error("Crash group {0} is not in the snapshot")]
    UnknownGroup(EntityId),

    #[error("Crash view {0} is not on this screen")]
    UnknownView(ViewKey),

    #[error("Crash report has no id")]
    MissingReportId,

    #[error("Crash service answered HTTP {status} when updating crash report {id}")]
    Rejected { id: EntityId, status: StatusCode },

    #[error("Cannot remove crash report with Id: {id}")]
    RemoveFailed {
        id: String,
        #[source]
        source: ApiError,
    },
}
