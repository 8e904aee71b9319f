use std::sync::Arc;

use wikirag_core::{Page, Revision};

use crate::error::ProviderError;
use crate::host::WikiHost;
use crate::observer::PAGE_CONTENT;
use crate::provider::{DataProvider, TextFilter};

/// Raw main-slot wikitext.
pub struct WikitextProvider {
    host: Arc<dyn WikiHost>,
}

impl WikitextProvider {
    pub fn new(host: Arc<dyn WikiHost>) -> Self {
        Self { host }
    }
}

fn wikitext_of(revision: &Revision) -> Result<&str, ProviderError> {
    let content = revision
        .content
        .as_ref()
        .ok_or(ProviderError::MissingContent)?;
    if !content.is_wikitext() {
        return Err(ProviderError::UnsupportedContent(content.model.clone()));
    }
    Ok(&content.text)
}

impl DataProvider for WikitextProvider {
    fn provide_for_revision(&self, revision: &Revision) -> Result<Vec<u8>, ProviderError> {
        Ok(wikitext_of(revision)?.as_bytes().to_vec())
    }

    fn can_provide_for_page(&self, page: &Page) -> Result<bool, ProviderError> {
        if !page.exists() {
            return Ok(false);
        }
        let revision = self.host.current_revision(page)?;
        Ok(revision
            .and_then(|revision| revision.content)
            .is_some_and(|content| content.is_wikitext()))
    }

    fn change_observers(&self) -> Vec<String> {
        vec![PAGE_CONTENT.to_string()]
    }
}

/// Wikitext passed through a [`TextFilter`].
pub struct RagWikitextProvider {
    inner: WikitextProvider,
    filter: Arc<dyn TextFilter>,
}

impl RagWikitextProvider {
    pub fn new(host: Arc<dyn WikiHost>, filter: Arc<dyn TextFilter>) -> Self {
        Self {
            inner: WikitextProvider::new(host),
            filter,
        }
    }
}

impl DataProvider for RagWikitextProvider {
    fn provide_for_revision(&self, revision: &Revision) -> Result<Vec<u8>, ProviderError> {
        let text = wikitext_of(revision)?;
        Ok(self.filter.filter(text).into_bytes())
    }

    fn can_provide_for_page(&self, page: &Page) -> Result<bool, ProviderError> {
        self.inner.can_provide_for_page(page)
    }

    fn change_observers(&self) -> Vec<String> {
        self.inner.change_observers()
    }
}
