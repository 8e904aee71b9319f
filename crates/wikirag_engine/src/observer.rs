use std::sync::Arc;

use wikirag_core::{Page, PageRef, NS_FILE};

use crate::context::{ANALYZE_KEY, WIKI_STRUCTURE_KEY};
use crate::pipeline::Pipeline;
use crate::providers::{DeletedProvider, DELETED_KEY};
use crate::scheduler::Scheduler;

pub const PAGE_CONTENT: &str = "page-content";
pub const PAGE_DELETION: &str = "page-deletion";
pub const FILE_UPLOAD: &str = "file-upload";
pub const PAGE_SET: &str = "page-set";
pub const PROMPT: &str = "prompt";

/// Host platform events relevant to the export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    Saved { page: Page, created: bool },
    Deleted { page: Page },
    Undeleted { page: Page },
    Moved { old: Page, new: Page, redirect_left: bool },
    FileUploaded { page: Page },
}

/// Turns platform events into scheduler calls.
pub trait ChangeObserver: Send + Sync {
    fn key(&self) -> &str;

    fn on_event(&self, scheduler: &Scheduler, event: &PageEvent);
}

/// Fan one event out to every observer.
pub fn notify(observers: &[Arc<dyn ChangeObserver>], scheduler: &Scheduler, event: &PageEvent) {
    for observer in observers {
        observer.on_event(scheduler, event);
    }
}

/// Re-exports content of saved, restored and moved pages.
pub struct PageContentObserver {
    pipeline: Pipeline,
}

impl PageContentObserver {
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }
}

impl ChangeObserver for PageContentObserver {
    fn key(&self) -> &str {
        PAGE_CONTENT
    }

    fn on_event(&self, scheduler: &Scheduler, event: &PageEvent) {
        match event {
            PageEvent::Saved { page, .. } | PageEvent::Undeleted { page } => {
                scheduler.schedule(page, &self.pipeline);
            }
            PageEvent::Moved {
                old,
                new,
                redirect_left,
            } => {
                if *redirect_left {
                    scheduler.schedule(old, &self.pipeline);
                }
                scheduler.schedule(new, &self.pipeline);
            }
            PageEvent::Deleted { .. } | PageEvent::FileUploaded { .. } => {}
        }
    }
}

/// Propagates deletions; its pipeline always carries the `deleted` provider.
pub struct PageDeletionObserver {
    pipeline: Pipeline,
}

impl PageDeletionObserver {
    pub fn new(mut pipeline: Pipeline) -> Self {
        pipeline.insert(DELETED_KEY, Arc::new(DeletedProvider));
        Self { pipeline }
    }
}

impl ChangeObserver for PageDeletionObserver {
    fn key(&self) -> &str {
        PAGE_DELETION
    }

    fn on_event(&self, scheduler: &Scheduler, event: &PageEvent) {
        match event {
            PageEvent::Deleted { page } => {
                scheduler.schedule(page, &self.pipeline);
            }
            // A redirect left behind keeps the old page alive.
            PageEvent::Moved {
                old,
                redirect_left: false,
                ..
            } => {
                scheduler.schedule(old, &self.pipeline);
            }
            _ => {}
        }
    }
}

/// Exports uploaded files and file pages that were restored or moved.
pub struct FileUploadObserver {
    pipeline: Pipeline,
}

impl FileUploadObserver {
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }
}

impl ChangeObserver for FileUploadObserver {
    fn key(&self) -> &str {
        FILE_UPLOAD
    }

    fn on_event(&self, scheduler: &Scheduler, event: &PageEvent) {
        match event {
            PageEvent::FileUploaded { page } => {
                scheduler.schedule(page, &self.pipeline);
            }
            PageEvent::Undeleted { page } if page.namespace() == NS_FILE => {
                scheduler.schedule(page, &self.pipeline);
            }
            PageEvent::Moved { old, new, .. } if new.namespace() == NS_FILE => {
                scheduler.schedule(old, &self.pipeline);
                scheduler.schedule(new, &self.pipeline);
            }
            _ => {}
        }
    }
}

/// Refreshes the wiki structure when the set of indexable pages changes.
#[derive(Default)]
pub struct PageSetObserver;

impl ChangeObserver for PageSetObserver {
    fn key(&self) -> &str {
        PAGE_SET
    }

    fn on_event(&self, scheduler: &Scheduler, event: &PageEvent) {
        let indexability = scheduler.indexability();
        let changed = match event {
            PageEvent::Saved { page, created } => *created && indexability.is_indexable(page),
            PageEvent::Deleted { page } | PageEvent::Undeleted { page } => {
                indexability.is_indexable(page)
            }
            PageEvent::Moved { old, new, .. } => {
                indexability.is_indexable(old) || indexability.is_indexable(new)
            }
            PageEvent::FileUploaded { .. } => false,
        };
        if changed {
            scheduler.schedule_context_provider(WIKI_STRUCTURE_KEY);
        }
    }
}

/// Refreshes the analyzer prompt when its page is saved.
pub struct PromptObserver {
    prompt_page: PageRef,
}

impl PromptObserver {
    pub fn new(prompt_page: PageRef) -> Self {
        Self { prompt_page }
    }
}

impl ChangeObserver for PromptObserver {
    fn key(&self) -> &str {
        PROMPT
    }

    fn on_event(&self, scheduler: &Scheduler, event: &PageEvent) {
        let PageEvent::Saved { page, .. } = event else {
            return;
        };
        let saved = page.reference();
        if saved.namespace() == self.prompt_page.namespace()
            && saved.title().eq_ignore_ascii_case(self.prompt_page.title())
        {
            scheduler.schedule_context_provider(ANALYZE_KEY);
        }
    }
}
