use thiserror::Error;

use crate::catalog::CatalogError;
use crate::host::HostError;
use crate::store::StoreError;
use crate::target::TargetError;

/// Failure of a single data or context provider. Isolated per provider by
/// the runner and recorded as the history error message.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("host error: {0}")]
    Host(#[from] HostError),
    #[error("unsupported content model `{0}`")]
    UnsupportedContent(String),
    #[error("revision has no content")]
    MissingContent,
    #[error("no file behind page {0}")]
    MissingFile(String),
    #[error("target error: {0}")]
    Target(#[from] TargetError),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Other(String),
}

/// Errors surfaced by scheduler and runner operations.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Host(#[from] HostError),
    #[error("target error: {0}")]
    Target(#[from] TargetError),
    #[error("queue drain already in progress (held by {owner})")]
    DrainInProgress { owner: String },
    #[error("invalid resource id `{0}`")]
    InvalidId(String),
    #[error("page {0} has no exportable revision")]
    NoOutcome(String),
    #[error("provider `{provider}` failed: {message}")]
    ProviderFailed { provider: String, message: String },
    #[error("provider `{provider}` wrote nothing for {page}")]
    NothingWritten { provider: String, page: String },
}
