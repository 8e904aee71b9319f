use wikirag_core::{Page, ResourceIdentity, Revision};

use crate::error::ProviderError;
use crate::provider::DataProvider;

/// Content is the page's id base. Always applicable.
pub struct IdProvider {
    identity: ResourceIdentity,
}

impl IdProvider {
    pub fn new(identity: ResourceIdentity) -> Self {
        Self { identity }
    }
}

impl DataProvider for IdProvider {
    fn provide_for_revision(&self, revision: &Revision) -> Result<Vec<u8>, ProviderError> {
        Ok(self.identity.id_base(revision.page.reference()).into_bytes())
    }

    fn can_provide_for_page(&self, _page: &Page) -> Result<bool, ProviderError> {
        Ok(true)
    }
}
