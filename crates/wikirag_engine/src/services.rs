use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::TimeDelta;
use rag_logging::rag_warn;
use wikirag_core::{PageRef, ReindexSummary, ResourceIdentity, RunStatus};

use crate::catalog::{Catalog, Registries};
use crate::clock::{system_clock, Clock};
use crate::config::ExportConfig;
use crate::context::{
    AnalyzePromptProvider, WikiStructureProvider, ANALYZE_KEY, DEFAULT_PROMPT_TITLE,
    WIKI_STRUCTURE_KEY,
};
use crate::error::ExportError;
use crate::hooks::HookRegistry;
use crate::host::WikiHost;
use crate::indexability::{IndexabilityChecker, NamespaceIndexability};
use crate::observer::{
    notify, FileUploadObserver, PageContentObserver, PageDeletionObserver, PageEvent,
    PageSetObserver, PromptObserver, FILE_UPLOAD, PAGE_CONTENT, PAGE_DELETION, PAGE_SET, PROMPT,
};
use crate::provider::TextFilter;
use crate::providers::{
    AclProvider, FileProvider, HtmlProvider, MetadataProvider, RagWikitextProvider,
    WikitextProvider, ACL_KEY, FILE_KEY, HTML_KEY, METADATA_KEY, WIKITEXT_KEY, WIKITEXT_RAG_KEY,
};
use crate::runner::Runner;
use crate::scheduler::Scheduler;
use crate::store::QueueStore;
use crate::target::{LocalDirectoryTarget, NullTarget};

pub const LOCAL_DIRECTORY_TARGET: &str = "local-directory";
pub const NULL_TARGET: &str = "null";

/// Collaborators the built-in registry entries are constructed from.
pub struct BuiltinEnv<'a> {
    pub config: &'a ExportConfig,
    pub host: Arc<dyn WikiHost>,
    pub indexability: Arc<dyn IndexabilityChecker>,
    pub hooks: Arc<HookRegistry>,
    pub text_filter: Option<Arc<dyn TextFilter>>,
}

impl Registries {
    /// Targets, data providers, change observers and context providers
    /// shipped with the engine. `wikitext-rag` needs a text filter.
    pub fn builtin(env: &BuiltinEnv<'_>) -> Self {
        let mut registries = Registries::default();
        let identity = ResourceIdentity::new(env.config.wiki_id.clone());

        registries.register_target(LOCAL_DIRECTORY_TARGET, || {
            Box::new(LocalDirectoryTarget::new())
        });
        registries.register_target(NULL_TARGET, || Box::new(NullTarget));

        let host = env.host.clone();
        registries.register_data_provider(WIKITEXT_KEY, move || {
            Ok(Arc::new(WikitextProvider::new(host.clone())))
        });
        if let Some(filter) = env.text_filter.clone() {
            let host = env.host.clone();
            registries.register_data_provider(WIKITEXT_RAG_KEY, move || {
                Ok(Arc::new(RagWikitextProvider::new(
                    host.clone(),
                    filter.clone(),
                )))
            });
        }
        let host = env.host.clone();
        registries.register_data_provider(HTML_KEY, move || {
            Ok(Arc::new(HtmlProvider::new(host.clone())))
        });
        let (host, indexability, hooks, meta_identity) = (
            env.host.clone(),
            env.indexability.clone(),
            env.hooks.clone(),
            identity.clone(),
        );
        registries.register_data_provider(METADATA_KEY, move || {
            Ok(Arc::new(MetadataProvider::new(
                host.clone(),
                meta_identity.clone(),
                indexability.clone(),
                hooks.clone(),
            )))
        });
        let group_permissions = env.config.group_permissions.clone();
        registries.register_data_provider(ACL_KEY, move || {
            Ok(Arc::new(AclProvider::new(group_permissions.clone())))
        });
        let host = env.host.clone();
        registries.register_data_provider(FILE_KEY, move || {
            Ok(Arc::new(FileProvider::new(host.clone())))
        });

        let prompt_title = env
            .config
            .prompt_title
            .clone()
            .unwrap_or_else(|| DEFAULT_PROMPT_TITLE.to_string());
        let prompt_page = PageRef::parse(&prompt_title);

        registries.register_change_observer(PAGE_CONTENT, |pipeline| {
            Ok(Arc::new(PageContentObserver::new(pipeline)))
        });
        registries.register_change_observer(PAGE_DELETION, |pipeline| {
            Ok(Arc::new(PageDeletionObserver::new(pipeline)))
        });
        registries.register_change_observer(FILE_UPLOAD, |pipeline| {
            Ok(Arc::new(FileUploadObserver::new(pipeline)))
        });
        registries.register_change_observer(PAGE_SET, |_pipeline| Ok(Arc::new(PageSetObserver)));
        let observed_prompt = prompt_page.clone();
        let observed_title = prompt_title.clone();
        registries.register_change_observer(PROMPT, move |_pipeline| {
            let page = observed_prompt
                .clone()
                .ok_or_else(|| format!("invalid prompt title `{observed_title}`"))?;
            Ok(Arc::new(PromptObserver::new(page)))
        });

        let (host, indexability) = (env.host.clone(), env.indexability.clone());
        registries.register_context_provider(WIKI_STRUCTURE_KEY, move || {
            Ok(Arc::new(WikiStructureProvider::new(
                host.clone(),
                indexability.clone(),
                identity.clone(),
            )))
        });
        let host = env.host.clone();
        registries.register_context_provider(ANALYZE_KEY, move || {
            let page = prompt_page
                .clone()
                .ok_or_else(|| format!("invalid prompt title `{prompt_title}`"))?;
            Ok(Arc::new(AnalyzePromptProvider::new(host.clone(), page)))
        });

        registries
    }

    /// Add or replace entries with those of `other`.
    pub fn extend(&mut self, other: Registries) {
        for (key, factory) in other.targets.iter() {
            self.targets.insert(key, factory.clone());
        }
        for (key, factory) in other.data_providers.iter() {
            self.data_providers.insert(key, factory.clone());
        }
        for (key, factory) in other.change_observers.iter() {
            self.change_observers.insert(key, factory.clone());
        }
        for (key, factory) in other.context_providers.iter() {
            self.context_providers.insert(key, factory.clone());
        }
    }
}

/// Longest drain lease honoured; larger settings are clamped.
pub const MAX_LEASE_TTL_SECS: u64 = 7 * 24 * 60 * 60;

fn lease_ttl(secs: u64) -> TimeDelta {
    if secs > MAX_LEASE_TTL_SECS {
        rag_warn!("lease_ttl_secs {secs} exceeds {MAX_LEASE_TTL_SECS}; clamping");
    }
    let secs = i64::try_from(secs.min(MAX_LEASE_TTL_SECS)).unwrap_or_default();
    TimeDelta::try_seconds(secs).unwrap_or_default()
}

pub struct ServiceOptions {
    pub clock: Clock,
    pub hooks: HookRegistry,
    pub text_filter: Option<Arc<dyn TextFilter>>,
    /// Replaces the namespace-based checker when set.
    pub indexability: Option<Arc<dyn IndexabilityChecker>>,
    /// Entries added over the built-in registries.
    pub registries: Registries,
    pub lease_owner: String,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            clock: system_clock(),
            hooks: HookRegistry::default(),
            text_filter: None,
            indexability: None,
            registries: Registries::default(),
            lease_owner: format!("wikirag-{}", std::process::id()),
        }
    }
}

/// The wired export subsystem for one wiki instance.
pub struct ExportServices {
    pub catalog: Arc<Catalog>,
    pub runner: Arc<Runner>,
    pub scheduler: Arc<Scheduler>,
    pub host: Arc<dyn WikiHost>,
    pub hooks: Arc<HookRegistry>,
    pub indexability: Arc<dyn IndexabilityChecker>,
}

impl ExportServices {
    pub fn new(
        config: ExportConfig,
        host: Arc<dyn WikiHost>,
        store: QueueStore,
        options: ServiceOptions,
    ) -> Self {
        let ServiceOptions {
            clock,
            hooks,
            text_filter,
            indexability,
            registries: extra,
            lease_owner,
        } = options;
        let hooks = Arc::new(hooks);
        let indexability: Arc<dyn IndexabilityChecker> = match indexability {
            Some(indexability) => indexability,
            None => Arc::new(NamespaceIndexability::new(host.clone(), hooks.clone())),
        };

        let mut registries = Registries::builtin(&BuiltinEnv {
            config: &config,
            host: host.clone(),
            indexability: indexability.clone(),
            hooks: hooks.clone(),
            text_filter,
        });
        registries.extend(extra);

        let lease_ttl = lease_ttl(config.queue.lease_ttl_secs);
        let catalog = Arc::new(Catalog::new(config, registries));
        let runner = Arc::new(Runner::new(
            catalog.clone(),
            host.clone(),
            hooks.clone(),
            clock.clone(),
        ));
        let scheduler = Arc::new(Scheduler::new(
            store,
            runner.clone(),
            host.clone(),
            indexability.clone(),
            hooks.clone(),
            clock,
            lease_owner,
            lease_ttl,
        ));

        Self {
            catalog,
            runner,
            scheduler,
            host,
            hooks,
            indexability,
        }
    }

    /// Fan a platform event out to every enabled change observer.
    pub fn notify(&self, event: &PageEvent) -> Result<(), ExportError> {
        let observers = self.catalog.get_change_observers()?;
        notify(&observers, &self.scheduler, event);
        Ok(())
    }

    /// Schedule every indexable page and context provider.
    pub fn schedule_all(&self) -> Result<ReindexSummary, ExportError> {
        let pipeline = self.catalog.get_pipeline(None)?;
        let context_providers = self.catalog.get_context_providers()?;
        self.scheduler
            .schedule_full_reindex(&pipeline, &context_providers)
    }

    pub fn full_reindex(&self) -> Result<BTreeMap<String, RunStatus>, ExportError> {
        let pipeline = self.catalog.get_pipeline(None)?;
        let context_providers = self.catalog.get_context_providers()?;
        self.scheduler.full_reindex(&pipeline, &context_providers)
    }

    pub fn export_queued(
        &self,
        limit: Option<usize>,
    ) -> Result<BTreeMap<String, RunStatus>, ExportError> {
        self.scheduler.run_queued(limit)
    }
}
