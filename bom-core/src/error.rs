use thiserror::Error;

/// Why a single station was left out of a run.
///
/// None of these stop the run; the station is logged and skipped.
#[derive(Debug, Error)]
pub enum StationError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("response body was empty")]
    EmptyBody,

    #[error("response body is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("response has no `observations.data` array")]
    MissingData,

    #[error("`observations.data` is empty")]
    EmptyData,

    #[error("selected observation has an unexpected shape: {0}")]
    Observation(serde_json::Error),

    #[error("unparsable observation timestamp {0:?}")]
    Timestamp(Option<String>),
}
