use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rag_logging::{page_label, rag_debug, rag_error, rag_info, rag_warn};
use uuid::Uuid;
use wikirag_core::{
    group_queue_entries, HistoryEntry, Page, PageRef, QueuedItem, ReindexSummary, RunStatus,
    CONTEXT_NAMESPACE, CONTEXT_TITLE,
};

use crate::clock::Clock;
use crate::error::ExportError;
use crate::hooks::HookRegistry;
use crate::host::WikiHost;
use crate::indexability::IndexabilityChecker;
use crate::pipeline::{ContextProviders, Pipeline};
use crate::runner::Runner;
use crate::store::QueueStore;

/// Lease scope guarding queue drains.
pub const DRAIN_SCOPE: &str = "queue-drain";

/// Owns the durable queue and history; schedules work and drains it.
pub struct Scheduler {
    store: Mutex<QueueStore>,
    runner: Arc<Runner>,
    host: Arc<dyn WikiHost>,
    indexability: Arc<dyn IndexabilityChecker>,
    hooks: Arc<HookRegistry>,
    clock: Clock,
    lease_owner: String,
    lease_ttl: chrono::Duration,
}

impl Scheduler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: QueueStore,
        runner: Arc<Runner>,
        host: Arc<dyn WikiHost>,
        indexability: Arc<dyn IndexabilityChecker>,
        hooks: Arc<HookRegistry>,
        clock: Clock,
        lease_owner: impl Into<String>,
        lease_ttl: chrono::Duration,
    ) -> Self {
        Self {
            store: Mutex::new(store),
            runner,
            host,
            indexability,
            hooks,
            clock,
            lease_owner: lease_owner.into(),
            lease_ttl,
        }
    }

    pub fn runner(&self) -> &Arc<Runner> {
        &self.runner
    }

    pub fn host(&self) -> &Arc<dyn WikiHost> {
        &self.host
    }

    pub fn indexability(&self) -> &Arc<dyn IndexabilityChecker> {
        &self.indexability
    }

    fn store(&self) -> MutexGuard<'_, QueueStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn can_schedule(&self, page: &Page) -> bool {
        self.indexability.is_indexable(page)
    }

    /// Queue `pipeline` for `page`, replacing any pending rows of the same
    /// providers. Never fails loudly: storage errors are logged and reported
    /// as `false`.
    pub fn schedule(&self, page: &Page, pipeline: &Pipeline) -> bool {
        if !self.can_schedule(page) {
            return false;
        }
        let mut clear_keys = pipeline.key_list();
        let mut pipeline = pipeline.clone();
        self.hooks.run_schedule_pipeline(page, &mut pipeline);
        let insert_keys = pipeline.key_list();
        if insert_keys.is_empty() {
            return false;
        }
        for key in &insert_keys {
            if !clear_keys.contains(key) {
                clear_keys.push(key.clone());
            }
        }

        let result = self.store().replace_entries(
            page.namespace(),
            page.title(),
            &clear_keys,
            &insert_keys,
            (self.clock)(),
        );
        match result {
            Ok(()) => true,
            Err(err) => {
                rag_error!(
                    "Scheduling page {} failed: {err}",
                    page_label(page.namespace(), page.title())
                );
                false
            }
        }
    }

    pub fn schedule_context_provider(&self, key: &str) -> bool {
        let keys = [key.to_string()];
        let result = self.store().replace_entries(
            CONTEXT_NAMESPACE,
            CONTEXT_TITLE,
            &keys,
            &keys,
            (self.clock)(),
        );
        match result {
            Ok(()) => true,
            Err(err) => {
                rag_error!("Scheduling context provider {key} failed: {err}");
                false
            }
        }
    }

    pub fn clear_queue(&self) -> Result<(), ExportError> {
        let removed = self.store().clear_all()?;
        rag_debug!("Cleared {removed} queue rows");
        Ok(())
    }

    /// Every existing indexable page, in host order.
    pub fn indexable_pages(&self) -> Result<Vec<Page>, ExportError> {
        let namespaces = self.indexability.candidate_namespaces();
        let mut pages = Vec::new();
        for reference in self.host.list_pages(&namespaces)? {
            let Some(page) = self
                .host
                .resolve_page(reference.namespace(), reference.title())
            else {
                continue;
            };
            if self.indexability.is_indexable(&page) {
                pages.push(page);
            }
        }
        Ok(pages)
    }

    /// Replace the whole queue with every indexable page (each with the
    /// providers applicable to it) and every context provider.
    pub fn schedule_full_reindex(
        &self,
        pipeline: &Pipeline,
        context_providers: &ContextProviders,
    ) -> Result<ReindexSummary, ExportError> {
        let pages = self.indexable_pages()?;
        self.clear_queue()?;
        self.runner.request_purge()?;

        let mut summary = ReindexSummary::default();
        for page in &pages {
            let mut applicable = pipeline.clone();
            applicable.retain(|key, provider| match provider.can_provide_for_page(page) {
                Ok(can_provide) => can_provide,
                Err(err) => {
                    rag_warn!(
                        "Provider {key} cannot judge {}: {err}",
                        page_label(page.namespace(), page.title())
                    );
                    false
                }
            });
            if self.schedule(page, &applicable) {
                summary.pages += 1;
            }
        }
        for key in context_providers.keys() {
            if self.schedule_context_provider(key) {
                summary.context_providers += 1;
            }
        }
        rag_info!(
            "Scheduled full reindex: {} pages, {} context providers",
            summary.pages,
            summary.context_providers
        );
        Ok(summary)
    }

    pub fn full_reindex(
        &self,
        pipeline: &Pipeline,
        context_providers: &ContextProviders,
    ) -> Result<BTreeMap<String, RunStatus>, ExportError> {
        self.schedule_full_reindex(pipeline, context_providers)?;
        self.run_queued(None)
    }

    /// Drain the queue under the drain lease.
    ///
    /// Context rows always run in full. Page rows run oldest first, at most
    /// `limit` of them; pages that cannot be resolved stay queued and do not
    /// count. Results are keyed `namespace:title`.
    pub fn run_queued(
        &self,
        limit: Option<usize>,
    ) -> Result<BTreeMap<String, RunStatus>, ExportError> {
        let lease = DrainLease::acquire(self)?;
        let items = self.get_queued()?;
        let (context_items, page_items): (Vec<QueuedItem>, Vec<QueuedItem>) =
            items.into_iter().partition(QueuedItem::is_context);

        for item in &context_items {
            self.runner.run_for_context_providers(&item.providers)?;
            self.store()
                .clear_entries(CONTEXT_NAMESPACE, CONTEXT_TITLE, &item.providers)?;
        }
        if !context_items.is_empty() && !lease.heartbeat()? {
            rag_warn!("Drain lease lost while running context providers; stopping");
            return Ok(BTreeMap::new());
        }

        rag_info!("Draining export queue: {} pages pending", page_items.len());
        let mut results = BTreeMap::new();
        let mut processed = 0;
        for item in &page_items {
            if limit.is_some_and(|limit| processed >= limit) {
                break;
            }
            let label = item.queue_key();
            let Some(page) = self.host.resolve_page(item.namespace, &item.title) else {
                rag_error!("Cannot resolve queued page {label}");
                continue;
            };
            rag_debug!(
                "Exporting page {label} with providers {}",
                item.providers.join(", ")
            );
            if let Some(status) = self.runner.run_for_page(&page, &item.providers)? {
                self.store_run_status(&status)?;
                self.clear_dropped_keys(item, &status)?;
                results.insert(label, status);
            }
            processed += 1;
            if !lease.heartbeat()? {
                rag_warn!("Drain lease lost after {processed} pages; stopping");
                break;
            }
        }

        rag_info!("Export queue drained: {} pages exported", results.len());
        Ok(results)
    }

    /// Rows of providers the runner dropped as unconfigured are consumed too.
    fn clear_dropped_keys(&self, item: &QueuedItem, status: &RunStatus) -> Result<(), ExportError> {
        let touched = status.touched_providers();
        let dropped: Vec<String> = item
            .providers
            .iter()
            .filter(|key| !touched.contains(key))
            .cloned()
            .collect();
        if !dropped.is_empty() {
            self.store()
                .clear_entries(item.namespace, &item.title, &dropped)?;
        }
        Ok(())
    }

    /// Pending work grouped by page, oldest first.
    pub fn get_queued(&self) -> Result<Vec<QueuedItem>, ExportError> {
        let entries = self.store().queue_entries()?;
        Ok(group_queue_entries(&entries))
    }

    pub fn get_history_for_page(&self, page: &PageRef) -> Result<Vec<HistoryEntry>, ExportError> {
        Ok(self
            .store()
            .history_for_page(page.namespace(), page.title())?)
    }

    /// Persist an outcome: history and queue rows of every touched provider
    /// are replaced; successes and failures leave a history row.
    pub fn store_run_status(&self, status: &RunStatus) -> Result<(), ExportError> {
        let now = (self.clock)();
        self.store().store_outcome(status, now)?;
        Ok(())
    }
}

/// Drain lease held for the duration of [`Scheduler::run_queued`]. Every
/// drain holds it under its own token, `{lease_owner}/{uuid}`.
struct DrainLease<'a> {
    scheduler: &'a Scheduler,
    token: String,
}

impl<'a> DrainLease<'a> {
    fn acquire(scheduler: &'a Scheduler) -> Result<Self, ExportError> {
        let token = format!("{}/{}", scheduler.lease_owner, Uuid::new_v4());
        let store = scheduler.store();
        let acquired = store.try_acquire_lease(
            DRAIN_SCOPE,
            &token,
            (scheduler.clock)(),
            scheduler.lease_ttl,
        )?;
        if !acquired {
            let owner = store
                .lease(DRAIN_SCOPE)?
                .map(|lease| lease.owner_id)
                .unwrap_or_default();
            rag_warn!("Queue drain skipped: lease held by {owner}");
            return Err(ExportError::DrainInProgress { owner });
        }
        rag_debug!("Drain lease taken as {token}");
        Ok(Self { scheduler, token })
    }

    fn heartbeat(&self) -> Result<bool, ExportError> {
        Ok(self.scheduler.store().heartbeat_lease(
            DRAIN_SCOPE,
            &self.token,
            (self.scheduler.clock)(),
            self.scheduler.lease_ttl,
        )?)
    }
}

impl Drop for DrainLease<'_> {
    fn drop(&mut self) {
        if let Err(err) = self
            .scheduler
            .store()
            .release_lease(DRAIN_SCOPE, &self.token)
        {
            rag_error!("Releasing drain lease failed: {err}");
        }
    }
}
