use std::sync::Arc;

use wikirag_core::{Page, Revision, NS_FILE};

use crate::error::ProviderError;
use crate::host::WikiHost;
use crate::observer::FILE_UPLOAD;
use crate::provider::DataProvider;

/// Raw bytes of the file behind a file page, stored as `attachment.<ext>`.
pub struct FileProvider {
    host: Arc<dyn WikiHost>,
}

impl FileProvider {
    pub fn new(host: Arc<dyn WikiHost>) -> Self {
        Self { host }
    }
}

impl DataProvider for FileProvider {
    fn provide_for_revision(&self, revision: &Revision) -> Result<Vec<u8>, ProviderError> {
        let page = revision.page.reference();
        let file = self
            .host
            .file_for_page(page)?
            .ok_or_else(|| ProviderError::MissingFile(page.to_string()))?;
        Ok(file.bytes)
    }

    fn can_provide_for_page(&self, page: &Page) -> Result<bool, ProviderError> {
        if page.namespace() != NS_FILE {
            return Ok(false);
        }
        Ok(self.host.file_for_page(page.reference())?.is_some())
    }

    fn change_observers(&self) -> Vec<String> {
        vec![FILE_UPLOAD.to_string()]
    }

    fn attachment_extension(&self, revision: &Revision) -> Result<Option<String>, ProviderError> {
        if revision.page.namespace() != NS_FILE {
            return Ok(None);
        }
        Ok(self
            .host
            .file_for_page(revision.page.reference())?
            .map(|file| file.extension))
    }
}
