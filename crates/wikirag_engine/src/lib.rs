//! WikiRAG export engine: catalog, runner, scheduler and the durable queue.
mod catalog;
mod clock;
mod config;
mod context;
mod error;
mod hooks;
mod host;
mod indexability;
mod observer;
mod persist;
mod pipeline;
mod provider;
mod providers;
mod runner;
mod scheduler;
mod services;
mod store;
mod target;

pub use catalog::{
    Catalog, CatalogError, ChangeObserverFactory, ContextProviderFactory, DataProviderFactory,
    Registries, TargetFactory,
};
pub use clock::{system_clock, Clock};
pub use config::{ExportConfig, QueueSettings, TargetDescriptor, TargetSettings};
pub use context::{
    AnalyzePromptProvider, WikiStructureProvider, ANALYZE_KEY, DEFAULT_ANALYZER_PROMPT,
    DEFAULT_PROMPT_TITLE, WIKI_STRUCTURE_KEY,
};
pub use error::{ExportError, ProviderError};
pub use hooks::{
    HookRegistry, IndexabilityHook, MetadataHook, RunForPageHook, SchedulePipelineHook,
};
pub use host::{FileInfo, HostError, RenderedPage, WikiHost, MEDIA_TYPE_OFFICE, MEDIA_TYPE_TEXT};
pub use indexability::{IndexabilityChecker, NamespaceIndexability};
pub use observer::{
    notify, ChangeObserver, FileUploadObserver, PageContentObserver, PageDeletionObserver,
    PageEvent, PageSetObserver, PromptObserver, FILE_UPLOAD, PAGE_CONTENT, PAGE_DELETION,
    PAGE_SET, PROMPT,
};
pub use persist::{ensure_output_dir, ArtifactDirectory, PersistError};
pub use pipeline::{ContextProviders, KeyedMap, Pipeline};
pub use provider::{ContextProvider, DataProvider, TextFilter};
pub use providers::{
    AclProvider, DeletedProvider, FileProvider, HtmlProvider, IdProvider, MetadataProvider,
    RagWikitextProvider, WikitextProvider, ACL_KEY, DELETED_KEY, FILE_KEY, HTML_KEY, ID_KEY,
    METADATA_KEY, WIKITEXT_KEY, WIKITEXT_RAG_KEY,
};
pub use runner::Runner;
pub use scheduler::{Scheduler, DRAIN_SCOPE};
pub use services::{
    BuiltinEnv, ExportServices, ServiceOptions, LOCAL_DIRECTORY_TARGET, MAX_LEASE_TTL_SECS,
    NULL_TARGET,
};
pub use store::{Lease, QueueStore, StoreError, SCHEMA_VERSION};
pub use target::{LocalDirectoryTarget, NullTarget, Target, TargetError};
