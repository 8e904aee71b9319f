use std::sync::Arc;

use wikirag_core::{Page, Revision};

use crate::pipeline::Pipeline;

/// Mutates the pipeline of a page right before its queue rows are written.
pub trait SchedulePipelineHook: Send + Sync {
    fn on_schedule_pipeline(&self, page: &Page, pipeline: &mut Pipeline);
}

/// May veto (set `None`) or replace the revision the runner resolved.
pub trait RunForPageHook: Send + Sync {
    fn on_run_for_page(&self, page: &Page, revision: &mut Option<Revision>);
}

/// May flip the indexability verdict for an existing page.
pub trait IndexabilityHook: Send + Sync {
    fn on_can_be_indexed(&self, page: &Page, indexable: &mut bool);
}

/// Enriches the metadata artifact before it is serialized.
pub trait MetadataHook: Send + Sync {
    fn on_metadata(
        &self,
        page: &Page,
        revision: &Revision,
        meta: &mut serde_json::Map<String, serde_json::Value>,
    );
}

/// Ordered lists of registered extension hooks, invoked in registration order.
#[derive(Default, Clone)]
pub struct HookRegistry {
    schedule_pipeline: Vec<Arc<dyn SchedulePipelineHook>>,
    run_for_page: Vec<Arc<dyn RunForPageHook>>,
    indexability: Vec<Arc<dyn IndexabilityHook>>,
    metadata: Vec<Arc<dyn MetadataHook>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_schedule_pipeline(&mut self, hook: Arc<dyn SchedulePipelineHook>) {
        self.schedule_pipeline.push(hook);
    }

    pub fn add_run_for_page(&mut self, hook: Arc<dyn RunForPageHook>) {
        self.run_for_page.push(hook);
    }

    pub fn add_indexability(&mut self, hook: Arc<dyn IndexabilityHook>) {
        self.indexability.push(hook);
    }

    pub fn add_metadata(&mut self, hook: Arc<dyn MetadataHook>) {
        self.metadata.push(hook);
    }

    pub fn run_schedule_pipeline(&self, page: &Page, pipeline: &mut Pipeline) {
        for hook in &self.schedule_pipeline {
            hook.on_schedule_pipeline(page, pipeline);
        }
    }

    pub fn run_for_page(&self, page: &Page, revision: &mut Option<Revision>) {
        for hook in &self.run_for_page {
            hook.on_run_for_page(page, revision);
        }
    }

    pub fn run_can_be_indexed(&self, page: &Page, indexable: &mut bool) {
        for hook in &self.indexability {
            hook.on_can_be_indexed(page, indexable);
        }
    }

    pub fn run_metadata(
        &self,
        page: &Page,
        revision: &Revision,
        meta: &mut serde_json::Map<String, serde_json::Value>,
    ) {
        for hook in &self.metadata {
            hook.on_metadata(page, revision, meta);
        }
    }
}
