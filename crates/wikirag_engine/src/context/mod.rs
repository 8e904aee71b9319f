//! Built-in context (corpus-wide) providers.
mod prompts;
mod wiki_structure;

pub use prompts::{AnalyzePromptProvider, DEFAULT_ANALYZER_PROMPT, DEFAULT_PROMPT_TITLE};
pub use wiki_structure::WikiStructureProvider;

pub const WIKI_STRUCTURE_KEY: &str = "wiki-structure";
pub const ANALYZE_KEY: &str = "analyze";
