use std::sync::Arc;

use wikirag_core::{Page, Revision};

use crate::error::ProviderError;
use crate::host::WikiHost;
use crate::observer::PAGE_CONTENT;
use crate::provider::DataProvider;

/// Host-rendered HTML of the revision.
pub struct HtmlProvider {
    host: Arc<dyn WikiHost>,
}

impl HtmlProvider {
    pub fn new(host: Arc<dyn WikiHost>) -> Self {
        Self { host }
    }
}

impl DataProvider for HtmlProvider {
    fn provide_for_revision(&self, revision: &Revision) -> Result<Vec<u8>, ProviderError> {
        Ok(self.host.render(revision)?.html.into_bytes())
    }

    fn can_provide_for_page(&self, page: &Page) -> Result<bool, ProviderError> {
        Ok(page.exists())
    }

    fn change_observers(&self) -> Vec<String> {
        vec![PAGE_CONTENT.to_string()]
    }
}
