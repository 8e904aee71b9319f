//! WikiRAG core: identity, outcome and queue value types shared by the engine.
mod page;
mod queue;
mod resource;
mod revision;
mod status;

pub use page::{
    canonical_namespace_name, is_valid_title, namespace_from_name, normalize_title, Page, PageRef,
    CONTEXT_NAMESPACE, CONTEXT_TITLE, NS_CATEGORY, NS_FILE, NS_HELP, NS_MAIN, NS_MEDIAWIKI,
    NS_PROJECT, NS_TALK, NS_TEMPLATE, NS_USER,
};
pub use queue::{group_queue_entries, HistoryEntry, HistoryStatus, QueueEntry, QueuedItem, ReindexSummary};
pub use resource::{is_filesystem_safe, ResourceDescriptor, ResourceIdentity, PURGE_EXTENSION};
pub use revision::{Revision, RevisionContent, CONTENT_MODEL_WIKITEXT};
pub use status::RunStatus;
