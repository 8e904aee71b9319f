use std::collections::BTreeMap;
use std::io;

use thiserror::Error;
use wikirag_core::{Page, PageRef, Revision, NS_MAIN};

pub const MEDIA_TYPE_TEXT: &str = "TEXT";
pub const MEDIA_TYPE_OFFICE: &str = "OFFICE";

#[derive(Debug, Error)]
pub enum HostError {
    #[error("page not found: {0}")]
    NotFound(String),
    #[error("rendering {page} failed: {message}")]
    Render { page: String, message: String },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("{0}")]
    Other(String),
}

/// Output of the host's renderer for one revision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedPage {
    pub html: String,
    pub categories: Vec<String>,
    /// Titles of transcluded pages.
    pub templates: Vec<String>,
    pub sections: Vec<String>,
    pub properties: BTreeMap<String, String>,
}

/// The file stored behind a file page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub extension: String,
    /// Upper-case media class, e.g. [`MEDIA_TYPE_TEXT`].
    pub media_type: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// The host platform: page storage, revisions and rendering.
pub trait WikiHost: Send + Sync {
    /// Resolve a page handle; `None` when the title cannot name a page.
    fn resolve_page(&self, namespace: i32, title: &str) -> Option<Page>;

    /// Existing pages in the given namespaces.
    fn list_pages(&self, namespaces: &[i32]) -> Result<Vec<PageRef>, HostError>;

    fn current_revision(&self, page: &Page) -> Result<Option<Revision>, HostError>;

    fn first_revision(&self, page: &Page) -> Result<Option<Revision>, HostError> {
        self.current_revision(page)
    }

    fn render(&self, revision: &Revision) -> Result<RenderedPage, HostError>;

    fn namespace_text(&self, namespace: i32) -> String;

    fn file_for_page(&self, _page: &PageRef) -> Result<Option<FileInfo>, HostError> {
        Ok(None)
    }

    fn content_namespaces(&self) -> Vec<i32> {
        vec![NS_MAIN]
    }

    fn redirect_target(&self, _page: &PageRef) -> Result<Option<PageRef>, HostError> {
        Ok(None)
    }

    fn outgoing_links(&self, _page: &PageRef) -> Result<Vec<PageRef>, HostError> {
        Ok(Vec::new())
    }

    fn incoming_link_count(&self, _page: &PageRef) -> Result<usize, HostError> {
        Ok(0)
    }

    fn display_title(&self, _page: &PageRef) -> Option<String> {
        None
    }

    fn permalink(&self, revision: &Revision) -> Option<String> {
        revision
            .id
            .map(|id| format!("Special:PermanentLink/{id}"))
    }

    /// `Namespace:Title` text with spaces.
    fn prefixed_text(&self, page: &PageRef) -> String {
        let namespace = self.namespace_text(page.namespace());
        if namespace.is_empty() {
            page.text()
        } else {
            format!("{namespace}:{}", page.text())
        }
    }
}
