use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use wikirag_core::{Page, PageRef, ResourceIdentity, Revision, NS_FILE};

use crate::error::ProviderError;
use crate::hooks::HookRegistry;
use crate::host::WikiHost;
use crate::indexability::IndexabilityChecker;
use crate::observer::PAGE_CONTENT;
use crate::provider::DataProvider;

const MAX_REDIRECT_DEPTH: usize = 10;
const NO_RAG_PROPERTY: &str = "NO_RAG";

/// Pretty JSON document describing the page: dates, categories, links,
/// redirects, inclusions and sections, plus file details for file pages.
pub struct MetadataProvider {
    host: Arc<dyn WikiHost>,
    identity: ResourceIdentity,
    indexability: Arc<dyn IndexabilityChecker>,
    hooks: Arc<HookRegistry>,
}

impl MetadataProvider {
    pub fn new(
        host: Arc<dyn WikiHost>,
        identity: ResourceIdentity,
        indexability: Arc<dyn IndexabilityChecker>,
        hooks: Arc<HookRegistry>,
    ) -> Self {
        Self {
            host,
            identity,
            indexability,
            hooks,
        }
    }

    /// Follow redirects from `page`, at most ten hops.
    fn resolve_redirects(&self, page: PageRef) -> Result<PageRef, ProviderError> {
        let mut current = page;
        for _ in 0..MAX_REDIRECT_DEPTH {
            match self.host.redirect_target(&current)? {
                Some(target) => current = target,
                None => break,
            }
        }
        Ok(current)
    }

    fn redirect_target(&self, page: &PageRef) -> Result<Option<String>, ProviderError> {
        match self.host.redirect_target(page)? {
            Some(target) => {
                let resolved = self.resolve_redirects(target)?;
                Ok(Some(self.identity.id_base(&resolved)))
            }
            None => Ok(None),
        }
    }

    fn linked_pages(&self, page: &PageRef) -> Result<Vec<String>, ProviderError> {
        let mut linked = Vec::new();
        for link in self.host.outgoing_links(page)? {
            let resolved = self.resolve_redirects(link)?;
            let Some(handle) = self
                .host
                .resolve_page(resolved.namespace(), resolved.title())
            else {
                continue;
            };
            if self.indexability.is_indexable(&handle) {
                linked.push(self.identity.id_base(&resolved));
            }
        }
        Ok(linked)
    }
}

fn format_date(timestamp: Option<DateTime<Utc>>) -> Value {
    match timestamp {
        Some(timestamp) => json!(timestamp.format("%Y%m%d%H%M%S").to_string()),
        None => Value::Null,
    }
}

impl DataProvider for MetadataProvider {
    fn provide_for_revision(&self, revision: &Revision) -> Result<Vec<u8>, ProviderError> {
        let page = &revision.page;
        let reference = page.reference();
        let rendered = self.host.render(revision)?;
        let created = self
            .host
            .first_revision(page)?
            .and_then(|first| first.timestamp)
            .or(revision.timestamp);
        let redirect_target = self.redirect_target(reference)?;

        let mut meta = Map::new();
        meta.insert("wiki_id".into(), json!(self.identity.wiki_id()));
        meta.insert("title".into(), json!(self.host.prefixed_text(reference)));
        meta.insert(
            "namespace_text".into(),
            json!(self.host.namespace_text(reference.namespace())),
        );
        meta.insert("url".into(), json!(self.host.permalink(revision)));
        meta.insert("modification-date".into(), format_date(revision.timestamp));
        meta.insert("creation-date".into(), format_date(created));
        meta.insert("categories".into(), json!(rendered.categories));
        meta.insert(
            "display-title".into(),
            json!(self
                .host
                .display_title(reference)
                .unwrap_or_else(|| reference.text())),
        );
        meta.insert("is-redirect".into(), json!(redirect_target.is_some()));
        meta.insert(
            "redirect_target".into(),
            json!(redirect_target.unwrap_or_default()),
        );
        meta.insert(
            "incoming-link-count".into(),
            json!(self.host.incoming_link_count(reference)?),
        );
        meta.insert("linked_pages".into(), json!(self.linked_pages(reference)?));
        meta.insert(
            "subpage-of".into(),
            json!(reference
                .base_page()
                .map(|base| self.identity.id_base(&base))),
        );
        meta.insert(
            "noindex".into(),
            json!(rendered.properties.contains_key(NO_RAG_PROPERTY)),
        );
        meta.insert("includes".into(), json!(rendered.templates));
        meta.insert("sections".into(), json!(rendered.sections));

        if reference.namespace() == NS_FILE {
            if let Some(file) = self.host.file_for_page(reference)? {
                meta.insert("is_file".into(), json!(true));
                meta.insert("mime_type".into(), json!(file.mime_type));
                meta.insert("extension".into(), json!(file.extension));
            }
        }

        self.hooks.run_metadata(page, revision, &mut meta);
        Ok(serde_json::to_vec_pretty(&Value::Object(meta))?)
    }

    fn can_provide_for_page(&self, page: &Page) -> Result<bool, ProviderError> {
        Ok(page.exists())
    }

    fn change_observers(&self) -> Vec<String> {
        vec![PAGE_CONTENT.to_string()]
    }
}
