use serde::{Deserialize, Serialize};

/// Failure kinds surfaced by the location session and the spot catalog.
///
/// None of these are fatal. Each one is also recorded as a message on the
/// owning state container so the presentation layer can display it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum Error {
    #[error("位置情報の許可が必要です")]
    PermissionDenied,
    #[error("位置情報サービスが無効になっています")]
    ServiceDisabled,
    #[error("could not determine current location: {0}")]
    Acquisition(String),
    #[error("could not start location updates: {0}")]
    WatchStart(String),
    #[error("spot provider request failed: {0}")]
    Fetch(String),
    #[error("spot not found: {0}")]
    NotFound(String),
}

impl Error {
    /// Wrap a provider failure, keeping the whole context chain in the message.
    pub(crate) fn acquisition(err: anyhow::Error) -> Self {
        Error::Acquisition(format!("{err:#}"))
    }

    pub(crate) fn watch_start(err: anyhow::Error) -> Self {
        Error::WatchStart(format!("{err:#}"))
    }

    pub(crate) fn fetch(err: anyhow::Error) -> Self {
        Error::Fetch(format!("{err:#}"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
