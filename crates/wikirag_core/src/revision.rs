use chrono::{DateTime, Utc};

use crate::page::Page;

pub const CONTENT_MODEL_WIKITEXT: &str = "wikitext";

/// Main-slot content of a revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionContent {
    pub model: String,
    pub text: String,
}

impl RevisionContent {
    pub fn wikitext(text: impl Into<String>) -> Self {
        Self {
            model: CONTENT_MODEL_WIKITEXT.to_string(),
            text: text.into(),
        }
    }

    pub fn is_wikitext(&self) -> bool {
        self.model == CONTENT_MODEL_WIKITEXT
    }
}

/// A revision as handed to data providers.
///
/// Pages that no longer exist are represented by a placeholder revision with
/// no id, timestamp or content, so deletion-aware providers can still run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    pub page: Page,
    pub id: Option<u64>,
    pub timestamp: Option<DateTime<Utc>>,
    pub is_current: bool,
    pub content: Option<RevisionContent>,
}

impl Revision {
    pub fn placeholder(page: Page) -> Self {
        Self {
            page,
            id: None,
            timestamp: None,
            is_current: true,
            content: None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.id.is_none()
    }
}
