use wikirag_core::{Page, Revision};

use crate::error::ProviderError;

/// Produces one per-page artifact and judges its own applicability.
///
/// Instances are shared across pages and runs, so they must not keep
/// per-page state.
pub trait DataProvider: Send + Sync {
    fn provide_for_revision(&self, revision: &Revision) -> Result<Vec<u8>, ProviderError>;

    fn can_provide_for_page(&self, page: &Page) -> Result<bool, ProviderError>;

    /// Change observer keys this provider reacts to.
    fn change_observers(&self) -> Vec<String> {
        Vec::new()
    }

    /// Fixed artifact extension replacing the provider key. Providers with a
    /// forced extension never have their artifact removed on skip.
    fn forced_extension(&self) -> Option<&str> {
        None
    }

    /// Real extension of the underlying file for attachment providers; the
    /// artifact tag becomes `attachment.<ext>`.
    fn attachment_extension(&self, _revision: &Revision) -> Result<Option<String>, ProviderError> {
        Ok(None)
    }
}

/// Produces one corpus-wide artifact.
pub trait ContextProvider: Send + Sync {
    fn provide(&self) -> Result<Vec<u8>, ProviderError>;

    fn can_provide(&self) -> Result<bool, ProviderError> {
        Ok(true)
    }

    fn extension(&self) -> &str;
}

/// Wikitext to retrieval-friendly text transformation.
pub trait TextFilter: Send + Sync {
    fn filter(&self, wikitext: &str) -> String;
}
