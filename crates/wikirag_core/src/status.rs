use chrono::{DateTime, Utc};

use crate::page::PageRef;
use crate::resource::ResourceDescriptor;

/// Per-page outcome of one export run, provider by provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStatus {
    page: PageRef,
    success: Vec<String>,
    failed: Vec<(String, String)>,
    skipped: Vec<String>,
    written: Vec<ResourceDescriptor>,
    timestamp: Option<DateTime<Utc>>,
}

impl RunStatus {
    pub fn new(page: PageRef) -> Self {
        Self {
            page,
            success: Vec::new(),
            failed: Vec::new(),
            skipped: Vec::new(),
            written: Vec::new(),
            timestamp: None,
        }
    }

    pub fn page(&self) -> &PageRef {
        &self.page
    }

    pub fn success(&self) -> &[String] {
        &self.success
    }

    /// `(provider key, error message)` pairs.
    pub fn failed(&self) -> &[(String, String)] {
        &self.failed
    }

    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    /// Descriptors written by successful providers, in run order.
    pub fn written(&self) -> &[ResourceDescriptor] {
        &self.written
    }

    /// Set once the run finished.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    pub fn record_success(&mut self, provider_key: &str, descriptor: ResourceDescriptor) {
        self.success.push(provider_key.to_string());
        self.written.push(descriptor);
    }

    pub fn record_skipped(&mut self, provider_key: &str) {
        self.skipped.push(provider_key.to_string());
    }

    pub fn record_failure(&mut self, provider_key: &str, message: impl Into<String>) {
        let message = message.into();
        match self.failed.iter_mut().find(|(key, _)| key == provider_key) {
            Some(entry) => entry.1 = message,
            None => self.failed.push((provider_key.to_string(), message)),
        }
    }

    /// Every provider key this run touched: success, skipped and failed.
    pub fn touched_providers(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .success
            .iter()
            .chain(self.skipped.iter())
            .chain(self.failed.iter().map(|(key, _)| key))
            .cloned()
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }

    pub fn finish(mut self, at: DateTime<Utc>) -> Self {
        self.timestamp = Some(at);
        self
    }
}
