use std::sync::Arc;

use rag_logging::rag_warn;
use wikirag_core::{Page, NS_FILE};

use crate::hooks::HookRegistry;
use crate::host::{WikiHost, MEDIA_TYPE_OFFICE, MEDIA_TYPE_TEXT};

/// Decides which pages are eligible for export.
pub trait IndexabilityChecker: Send + Sync {
    fn is_indexable(&self, page: &Page) -> bool;

    /// Namespaces enumerated for corpus-wide passes.
    fn candidate_namespaces(&self) -> Vec<i32>;
}

/// Content subject namespaces plus text/office files. Pages that no longer
/// exist are always indexable so their deletion propagates.
pub struct NamespaceIndexability {
    host: Arc<dyn WikiHost>,
    hooks: Arc<HookRegistry>,
}

impl NamespaceIndexability {
    pub fn new(host: Arc<dyn WikiHost>, hooks: Arc<HookRegistry>) -> Self {
        Self { host, hooks }
    }

    fn is_indexable_file(&self, page: &Page) -> bool {
        if page.namespace() != NS_FILE {
            return false;
        }
        match self.host.file_for_page(page.reference()) {
            Ok(Some(file)) => {
                let media_type = file.media_type.to_ascii_uppercase();
                media_type == MEDIA_TYPE_OFFICE || media_type == MEDIA_TYPE_TEXT
            }
            Ok(None) => false,
            Err(err) => {
                rag_warn!("Cannot look up file for {}: {err}", page.reference());
                false
            }
        }
    }
}

fn is_subject_namespace(namespace: i32) -> bool {
    namespace >= 0 && namespace % 2 == 0
}

impl IndexabilityChecker for NamespaceIndexability {
    fn is_indexable(&self, page: &Page) -> bool {
        if !page.exists() {
            return true;
        }
        let namespace = page.namespace();
        let in_content_namespace = is_subject_namespace(namespace)
            && self.host.content_namespaces().contains(&namespace);
        let mut indexable = in_content_namespace || self.is_indexable_file(page);
        self.hooks.run_can_be_indexed(page, &mut indexable);
        indexable
    }

    fn candidate_namespaces(&self) -> Vec<i32> {
        let mut namespaces: Vec<i32> = self
            .host
            .content_namespaces()
            .into_iter()
            .filter(|ns| is_subject_namespace(*ns))
            .collect();
        if !namespaces.contains(&NS_FILE) {
            namespaces.push(NS_FILE);
        }
        namespaces
    }
}
