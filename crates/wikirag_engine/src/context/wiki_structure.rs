use std::sync::Arc;

use serde_json::{json, Map, Value};
use wikirag_core::ResourceIdentity;

use crate::error::ProviderError;
use crate::host::WikiHost;
use crate::indexability::IndexabilityChecker;
use crate::provider::ContextProvider;

/// Site outline: every indexable page as a tree split on `/`, plus the
/// namespaces taking part in the export.
pub struct WikiStructureProvider {
    host: Arc<dyn WikiHost>,
    indexability: Arc<dyn IndexabilityChecker>,
    identity: ResourceIdentity,
}

impl WikiStructureProvider {
    pub fn new(
        host: Arc<dyn WikiHost>,
        indexability: Arc<dyn IndexabilityChecker>,
        identity: ResourceIdentity,
    ) -> Self {
        Self {
            host,
            indexability,
            identity,
        }
    }

    fn page_names(&self) -> Result<Vec<String>, ProviderError> {
        let namespaces = self.indexability.candidate_namespaces();
        let mut names = Vec::new();
        for reference in self.host.list_pages(&namespaces)? {
            let Some(page) = self
                .host
                .resolve_page(reference.namespace(), reference.title())
            else {
                continue;
            };
            if self.indexability.is_indexable(&page) {
                // Main namespace entries still start with a colon.
                names.push(format!(
                    "{}:{}",
                    self.host.namespace_text(reference.namespace()),
                    reference.title()
                ));
            }
        }
        Ok(names)
    }

    fn namespace_map(&self) -> Map<String, Value> {
        self.indexability
            .candidate_namespaces()
            .into_iter()
            .map(|namespace| {
                (
                    namespace.to_string(),
                    json!(self.host.namespace_text(namespace)),
                )
            })
            .collect()
    }
}

fn make_tree(names: &[String]) -> Map<String, Value> {
    let mut tree = Map::new();
    for name in names {
        let parts: Vec<&str> = name.split('/').collect();
        insert_path(&mut tree, &parts);
    }
    tree
}

fn insert_path(node: &mut Map<String, Value>, parts: &[&str]) {
    let Some((first, rest)) = parts.split_first() else {
        return;
    };
    let child = node
        .entry(first.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if let Value::Object(children) = child {
        insert_path(children, rest);
    }
}

impl ContextProvider for WikiStructureProvider {
    fn provide(&self) -> Result<Vec<u8>, ProviderError> {
        let names = self.page_names()?;
        let document = json!({
            "wiki_id": self.identity.wiki_id(),
            "pages": make_tree(&names),
            "namespaces": self.namespace_map(),
        });
        Ok(serde_json::to_vec_pretty(&document)?)
    }

    fn extension(&self) -> &str {
        "json"
    }
}
