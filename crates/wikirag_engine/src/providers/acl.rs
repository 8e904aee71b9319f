use std::collections::BTreeMap;

use wikirag_core::{Page, Revision};

use crate::error::ProviderError;
use crate::observer::PAGE_CONTENT;
use crate::provider::DataProvider;

/// JSON array of the groups granted `read`.
pub struct AclProvider {
    group_permissions: BTreeMap<String, BTreeMap<String, bool>>,
}

impl AclProvider {
    pub fn new(group_permissions: BTreeMap<String, BTreeMap<String, bool>>) -> Self {
        Self { group_permissions }
    }

    pub fn read_groups(&self) -> Vec<&str> {
        self.group_permissions
            .iter()
            .filter(|(_, permissions)| permissions.get("read").copied().unwrap_or(false))
            .map(|(group, _)| group.as_str())
            .collect()
    }
}

impl DataProvider for AclProvider {
    fn provide_for_revision(&self, _revision: &Revision) -> Result<Vec<u8>, ProviderError> {
        Ok(serde_json::to_vec(&self.read_groups())?)
    }

    fn can_provide_for_page(&self, _page: &Page) -> Result<bool, ProviderError> {
        Ok(true)
    }

    // Permission changes are not observable; refresh with every content change.
    fn change_observers(&self) -> Vec<String> {
        vec![PAGE_CONTENT.to_string()]
    }
}
