use wikirag_core::{Page, Revision};

use crate::error::ProviderError;
use crate::provider::DataProvider;

/// Empty tombstone artifact for pages that no longer exist.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeletedProvider;

impl DataProvider for DeletedProvider {
    fn provide_for_revision(&self, _revision: &Revision) -> Result<Vec<u8>, ProviderError> {
        Ok(Vec::new())
    }

    fn can_provide_for_page(&self, page: &Page) -> Result<bool, ProviderError> {
        Ok(!page.exists())
    }
}
