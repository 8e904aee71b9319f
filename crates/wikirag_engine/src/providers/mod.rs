//! Built-in data providers.
mod acl;
mod deleted;
mod file;
mod html;
mod id;
mod metadata;
mod wikitext;

pub use acl::AclProvider;
pub use deleted::DeletedProvider;
pub use file::FileProvider;
pub use html::HtmlProvider;
pub use id::IdProvider;
pub use metadata::MetadataProvider;
pub use wikitext::{RagWikitextProvider, WikitextProvider};

pub const ID_KEY: &str = "id";
pub const DELETED_KEY: &str = "deleted";
pub const WIKITEXT_KEY: &str = "wikitext";
pub const WIKITEXT_RAG_KEY: &str = "wikitext-rag";
pub const HTML_KEY: &str = "html";
pub const METADATA_KEY: &str = "metadata";
pub const ACL_KEY: &str = "acl";
pub const FILE_KEY: &str = "file";
