use std::sync::Arc;

use wikirag_core::PageRef;

use crate::error::ProviderError;
use crate::host::WikiHost;
use crate::provider::ContextProvider;

pub const DEFAULT_PROMPT_TITLE: &str = "MediaWiki:Wikirag-prompt-analyzer";

pub const DEFAULT_ANALYZER_PROMPT: &str = "\
You are analyzing documents exported from a wiki.
Each document comes with a metadata file describing its title, categories, \
links to other pages and the page it is a subpage of.
Use the wiki structure document to place every page in its hierarchy, and \
prefer the most specific page when several pages answer a question.
Pages marked with noindex must not be quoted.
";

/// Analyzer prompt text, read from the prompt page when it has content.
pub struct AnalyzePromptProvider {
    host: Arc<dyn WikiHost>,
    prompt_page: PageRef,
}

impl AnalyzePromptProvider {
    pub fn new(host: Arc<dyn WikiHost>, prompt_page: PageRef) -> Self {
        Self { host, prompt_page }
    }

    pub fn prompt_page(&self) -> &PageRef {
        &self.prompt_page
    }

    fn page_prompt(&self) -> Result<Option<String>, ProviderError> {
        let Some(page) = self
            .host
            .resolve_page(self.prompt_page.namespace(), self.prompt_page.title())
        else {
            return Ok(None);
        };
        if !page.exists() {
            return Ok(None);
        }
        let text = self
            .host
            .current_revision(&page)?
            .and_then(|revision| revision.content)
            .map(|content| content.text)
            .filter(|text| !text.trim().is_empty());
        Ok(text)
    }
}

impl ContextProvider for AnalyzePromptProvider {
    fn provide(&self) -> Result<Vec<u8>, ProviderError> {
        let prompt = self
            .page_prompt()?
            .unwrap_or_else(|| DEFAULT_ANALYZER_PROMPT.to_string());
        Ok(prompt.into_bytes())
    }

    fn extension(&self) -> &str {
        "prompt"
    }
}
