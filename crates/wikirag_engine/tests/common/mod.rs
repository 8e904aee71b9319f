#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;
use tempfile::TempDir;
use wikirag_core::{
    canonical_namespace_name, Page, PageRef, ResourceDescriptor, Revision, RevisionContent,
    NS_MAIN,
};
use wikirag_engine::{
    Clock, DataProvider, ExportConfig, ExportServices, FileInfo, HostError, ProviderError,
    QueueStore, Registries, RenderedPage, ServiceOptions, Target, TargetDescriptor, TargetError,
    TargetSettings, WikiHost, LOCAL_DIRECTORY_TARGET,
};

pub const WIKI_ID: &str = "wiki-a";

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

/// Advances one second per reading, so queue rows get distinct timestamps.
pub fn stepping_clock() -> Clock {
    let ticks = Arc::new(AtomicI64::new(0));
    Arc::new(move || base_time() + Duration::seconds(ticks.fetch_add(1, Ordering::SeqCst)))
}

struct StoredPage {
    revision_id: u64,
    model: String,
    text: String,
}

/// In-memory wiki: pages keyed by reference, optional files behind file pages.
#[derive(Default)]
pub struct MemoryWiki {
    pages: Mutex<BTreeMap<PageRef, StoredPage>>,
    files: Mutex<BTreeMap<PageRef, FileInfo>>,
    next_revision: AtomicU64,
}

impl MemoryWiki {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Create or edit a wikitext page; returns its reference.
    pub fn put(&self, text_title: &str, text: &str) -> PageRef {
        self.put_with_model(text_title, "wikitext", text)
    }

    pub fn put_with_model(&self, text_title: &str, model: &str, text: &str) -> PageRef {
        let reference = PageRef::parse(text_title).unwrap();
        let revision_id = self.next_revision.fetch_add(1, Ordering::SeqCst) + 1;
        self.pages.lock().unwrap().insert(
            reference.clone(),
            StoredPage {
                revision_id,
                model: model.to_string(),
                text: text.to_string(),
            },
        );
        reference
    }

    pub fn put_file(&self, text_title: &str, extension: &str, media_type: &str, bytes: &[u8]) {
        let reference = self.put(text_title, "file description");
        self.files.lock().unwrap().insert(
            reference,
            FileInfo {
                extension: extension.to_string(),
                media_type: media_type.to_string(),
                mime_type: "application/octet-stream".to_string(),
                bytes: bytes.to_vec(),
            },
        );
    }

    pub fn delete(&self, text_title: &str) {
        let reference = PageRef::parse(text_title).unwrap();
        self.pages.lock().unwrap().remove(&reference);
        self.files.lock().unwrap().remove(&reference);
    }

    pub fn page(&self, text_title: &str) -> Page {
        let reference = PageRef::parse(text_title).unwrap();
        self.resolve_page(reference.namespace(), reference.title())
            .unwrap()
    }
}

impl WikiHost for MemoryWiki {
    fn resolve_page(&self, namespace: i32, title: &str) -> Option<Page> {
        let reference = PageRef::new(namespace, title)?;
        let exists = self.pages.lock().unwrap().contains_key(&reference);
        Some(Page::new(reference, exists))
    }

    fn list_pages(&self, namespaces: &[i32]) -> Result<Vec<PageRef>, HostError> {
        Ok(self
            .pages
            .lock()
            .unwrap()
            .keys()
            .filter(|reference| namespaces.contains(&reference.namespace()))
            .cloned()
            .collect())
    }

    fn current_revision(&self, page: &Page) -> Result<Option<Revision>, HostError> {
        let pages = self.pages.lock().unwrap();
        Ok(pages.get(page.reference()).map(|stored| Revision {
            page: page.clone(),
            id: Some(stored.revision_id),
            timestamp: Some(base_time()),
            is_current: true,
            content: Some(RevisionContent {
                model: stored.model.clone(),
                text: stored.text.clone(),
            }),
        }))
    }

    fn render(&self, revision: &Revision) -> Result<RenderedPage, HostError> {
        let text = revision
            .content
            .as_ref()
            .map(|content| content.text.clone())
            .unwrap_or_default();
        Ok(RenderedPage {
            html: format!("<p>{text}</p>"),
            ..RenderedPage::default()
        })
    }

    fn namespace_text(&self, namespace: i32) -> String {
        canonical_namespace_name(namespace)
            .unwrap_or_default()
            .replace('_', " ")
    }

    fn file_for_page(&self, page: &PageRef) -> Result<Option<FileInfo>, HostError> {
        Ok(self.files.lock().unwrap().get(page).cloned())
    }

    fn content_namespaces(&self) -> Vec<i32> {
        vec![NS_MAIN]
    }
}

/// Writes `dummy:<title>` for existing pages.
pub struct DummyProvider;

impl DataProvider for DummyProvider {
    fn provide_for_revision(&self, revision: &Revision) -> Result<Vec<u8>, ProviderError> {
        Ok(format!("dummy:{}", revision.page.title()).into_bytes())
    }

    fn can_provide_for_page(&self, page: &Page) -> Result<bool, ProviderError> {
        Ok(page.exists())
    }
}

/// Always applicable, always fails.
pub struct FailingProvider;

impl DataProvider for FailingProvider {
    fn provide_for_revision(&self, _revision: &Revision) -> Result<Vec<u8>, ProviderError> {
        Err(ProviderError::Other("boom".into()))
    }

    fn can_provide_for_page(&self, _page: &Page) -> Result<bool, ProviderError> {
        Ok(true)
    }
}

pub const RECORDING_TARGET: &str = "recording";

/// Sink operations as `write <file>` / `remove <file>`, in call order.
pub type TargetLog = Arc<Mutex<Vec<String>>>;

/// Sink that only remembers what it was asked to do.
pub struct RecordingTarget {
    log: TargetLog,
}

impl Target for RecordingTarget {
    fn set_config(&mut self, _settings: TargetSettings) -> Result<(), TargetError> {
        Ok(())
    }

    fn write(&self, resource: &ResourceDescriptor) -> Result<(), TargetError> {
        self.log
            .lock()
            .unwrap()
            .push(format!("write {}", resource.file_name()));
        Ok(())
    }

    fn remove(&self, resource: &ResourceDescriptor) -> Result<(), TargetError> {
        self.log
            .lock()
            .unwrap()
            .push(format!("remove {}", resource.file_name()));
        Ok(())
    }
}

pub fn test_registries() -> Registries {
    let mut registries = Registries::default();
    registries.register_data_provider("dummy", || Ok(Arc::new(DummyProvider)));
    registries.register_data_provider("failing", || Ok(Arc::new(FailingProvider)));
    registries
}

pub fn test_config(output: &Path, pipeline: &[&str]) -> ExportConfig {
    let mut config = ExportConfig::new(WIKI_ID);
    config.target = Some(TargetDescriptor {
        kind: LOCAL_DIRECTORY_TARGET.to_string(),
        configuration: json!({ "path": output.to_string_lossy() }),
    });
    config.pipeline = pipeline.iter().map(|key| key.to_string()).collect();
    config
}

/// Services over an in-memory queue, exporting into a temp directory.
pub struct Harness {
    pub wiki: Arc<MemoryWiki>,
    pub services: ExportServices,
    pub output: TempDir,
}

impl Harness {
    pub fn new(pipeline: &[&str]) -> Self {
        Self::with_store(pipeline, QueueStore::open_in_memory().unwrap(), "test-worker")
    }

    pub fn with_store(pipeline: &[&str], store: QueueStore, lease_owner: &str) -> Self {
        let output = TempDir::new().unwrap();
        let config = test_config(output.path(), pipeline);
        Self::build(config, store, lease_owner, test_registries(), output)
    }

    /// Like [`Harness::with_store`], with extra registry entries and a chance
    /// to adjust the configuration before the services are built.
    pub fn customized(
        pipeline: &[&str],
        store: QueueStore,
        extra: Registries,
        adjust: impl FnOnce(&mut ExportConfig),
    ) -> Self {
        let output = TempDir::new().unwrap();
        let mut config = test_config(output.path(), pipeline);
        adjust(&mut config);
        let mut registries = test_registries();
        registries.extend(extra);
        Self::build(config, store, "test-worker", registries, output)
    }

    /// Services exporting into a [`RecordingTarget`]; the returned log
    /// receives every sink call.
    pub fn recording(pipeline: &[&str]) -> (Self, TargetLog) {
        let log = TargetLog::default();
        let mut registries = test_registries();
        let target_log = log.clone();
        registries.register_target(RECORDING_TARGET, move || {
            Box::new(RecordingTarget {
                log: target_log.clone(),
            })
        });
        let output = TempDir::new().unwrap();
        let mut config = test_config(output.path(), pipeline);
        config.target = Some(TargetDescriptor {
            kind: RECORDING_TARGET.to_string(),
            configuration: json!({}),
        });
        let store = QueueStore::open_in_memory().unwrap();
        let harness = Self::build(config, store, "test-worker", registries, output);
        (harness, log)
    }

    fn build(
        config: ExportConfig,
        store: QueueStore,
        lease_owner: &str,
        registries: Registries,
        output: TempDir,
    ) -> Self {
        rag_logging::initialize_for_tests();
        let wiki = MemoryWiki::new();
        let options = ServiceOptions {
            clock: stepping_clock(),
            registries,
            lease_owner: lease_owner.to_string(),
            ..ServiceOptions::default()
        };
        let services = ExportServices::new(config, wiki.clone(), store, options);
        Self {
            wiki,
            services,
            output,
        }
    }

    pub fn resource_id(&self, text_title: &str) -> String {
        let reference = PageRef::parse(text_title).unwrap();
        self.services.catalog.identity().resource_id(&reference)
    }

    pub fn artifact_path(&self, text_title: &str, extension: &str) -> PathBuf {
        self.output
            .path()
            .join(format!("{}.{extension}", self.resource_id(text_title)))
    }

    /// Queued items as `(namespace:title, providers)`.
    pub fn queued(&self) -> Vec<(String, Vec<String>)> {
        self.services
            .scheduler
            .get_queued()
            .unwrap()
            .into_iter()
            .map(|item| (item.queue_key(), item.providers))
            .collect()
    }
}

pub fn keys(keys: &[&str]) -> Vec<String> {
    keys.iter().map(|key| key.to_string()).collect()
}
