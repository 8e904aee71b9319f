use std::collections::HashSet;
use std::sync::Arc;

use rag_logging::{page_label, rag_debug, rag_error, rag_info, rag_warn};
use wikirag_core::{Page, ResourceDescriptor, ResourceIdentity, Revision, RunStatus};

use crate::catalog::Catalog;
use crate::clock::Clock;
use crate::error::{ExportError, ProviderError};
use crate::hooks::HookRegistry;
use crate::host::WikiHost;
use crate::provider::{ContextProvider, DataProvider};
use crate::providers::DELETED_KEY;
use crate::target::Target;

/// Executes one page or a set of context providers against the catalog.
/// Never touches the queue; outcomes are handed back to the scheduler.
pub struct Runner {
    catalog: Arc<Catalog>,
    host: Arc<dyn WikiHost>,
    hooks: Arc<HookRegistry>,
    identity: ResourceIdentity,
    clock: Clock,
}

impl Runner {
    pub fn new(
        catalog: Arc<Catalog>,
        host: Arc<dyn WikiHost>,
        hooks: Arc<HookRegistry>,
        clock: Clock,
    ) -> Self {
        let identity = catalog.identity().clone();
        Self {
            catalog,
            host,
            hooks,
            identity,
            clock,
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Run `pipeline_keys` for one page.
    ///
    /// `Ok(None)` means the page has no exportable revision right now; nothing
    /// is recorded and the queue rows stay. Keys no longer configured are
    /// dropped. Provider errors are isolated into the returned status.
    pub fn run_for_page(
        &self,
        page: &Page,
        pipeline_keys: &[String],
    ) -> Result<Option<RunStatus>, ExportError> {
        let target = self.catalog.get_target()?;
        let label = page_label(page.namespace(), page.title());

        let revision = if page.exists() {
            let mut resolved = match self.host.current_revision(page) {
                Ok(revision) => revision,
                Err(err) => {
                    rag_error!("Cannot load current revision of {label}: {err}");
                    None
                }
            };
            self.hooks.run_for_page(page, &mut resolved);
            match resolved {
                Some(revision) => revision,
                None => {
                    rag_warn!("Page {label} has no valid revision for export");
                    return Ok(None);
                }
            }
        } else {
            Revision::placeholder(page.clone())
        };

        let configured = self.catalog.get_pipeline(None)?;
        let resource_id = self.identity.resource_id(page.reference());
        let mut status = RunStatus::new(page.reference().clone());
        let mut seen = HashSet::new();

        for key in pipeline_keys {
            if !seen.insert(key.as_str()) {
                continue;
            }
            let provider = match configured.get(key) {
                Some(provider) => Ok(provider.clone()),
                None if key == DELETED_KEY => self
                    .catalog
                    .get_data_provider(DELETED_KEY)
                    .map_err(|err| ProviderError::Other(err.to_string())),
                None => {
                    rag_debug!("Dropping unconfigured provider {key} for page {label}");
                    continue;
                }
            };
            let outcome = provider.and_then(|provider| {
                run_provider(
                    target.as_ref(),
                    provider.as_ref(),
                    key,
                    &resource_id,
                    page,
                    &revision,
                )
            });
            match outcome {
                Ok(Some(descriptor)) => status.record_success(key, descriptor),
                Ok(None) => {
                    rag_debug!("Skipping provider {key} for page {label}: cannot provide content");
                    status.record_skipped(key);
                }
                Err(err) => {
                    rag_error!("Error in provider {key} for page {label}: {err}");
                    status.record_failure(key, err.to_string());
                }
            }
        }

        Ok(Some(status.finish((self.clock)())))
    }

    /// Run context providers by key. Unknown keys and provider errors are
    /// logged and do not stop the remaining keys.
    pub fn run_for_context_providers(&self, keys: &[String]) -> Result<(), ExportError> {
        let target = self.catalog.get_target()?;
        for key in keys {
            let Some(provider) = self.catalog.get_context_provider(key)? else {
                rag_error!("Context provider {key} not found");
                continue;
            };
            match self.run_context_provider(target.as_ref(), key, provider.as_ref()) {
                Ok(true) => rag_info!("Context provider {key} ran successfully"),
                Ok(false) => {}
                Err(err) => rag_error!("Error in context provider {key}: {err}"),
            }
        }
        Ok(())
    }

    fn run_context_provider(
        &self,
        target: &dyn Target,
        key: &str,
        provider: &dyn ContextProvider,
    ) -> Result<bool, ProviderError> {
        let resource_id = self.identity.context_resource_id(key);
        if !provider.can_provide()? {
            rag_debug!("Skipping context provider {key}: cannot provide content");
            target.remove(&ResourceDescriptor::empty(resource_id, provider.extension()))?;
            return Ok(false);
        }
        let content = provider.provide()?;
        if content.is_empty() {
            return Ok(false);
        }
        target.write(&ResourceDescriptor::new(
            resource_id,
            provider.extension(),
            content,
        ))?;
        Ok(true)
    }

    /// Ask the target to drop everything exported for this wiki.
    pub fn request_purge(&self) -> Result<(), ExportError> {
        let target = self.catalog.get_target()?;
        target.remove(&self.identity.purge_marker())?;
        Ok(())
    }

    /// Export a single artifact on demand: the page named by `id_base`,
    /// one provider. Returns what was written.
    pub fn export_item(
        &self,
        id_base: &str,
        provider_key: &str,
    ) -> Result<ResourceDescriptor, ExportError> {
        let reference = self
            .identity
            .page_ref_from_id_base(id_base)
            .ok_or_else(|| ExportError::InvalidId(id_base.to_string()))?;
        let page = self
            .host
            .resolve_page(reference.namespace(), reference.title())
            .ok_or_else(|| ExportError::InvalidId(id_base.to_string()))?;
        let label = page_label(page.namespace(), page.title());

        let status = self
            .run_for_page(&page, &[provider_key.to_string()])?
            .ok_or_else(|| ExportError::NoOutcome(label.clone()))?;
        if let Some((provider, message)) = status.failed().first() {
            return Err(ExportError::ProviderFailed {
                provider: provider.clone(),
                message: message.clone(),
            });
        }
        status
            .written()
            .first()
            .cloned()
            .ok_or(ExportError::NothingWritten {
                provider: provider_key.to_string(),
                page: label,
            })
    }
}

/// One provider for one page: `Ok(Some)` written, `Ok(None)` skipped.
fn run_provider(
    target: &dyn Target,
    provider: &dyn DataProvider,
    key: &str,
    resource_id: &str,
    page: &Page,
    revision: &Revision,
) -> Result<Option<ResourceDescriptor>, ProviderError> {
    let extension = match provider.forced_extension() {
        Some(forced) => forced.to_string(),
        None => match provider.attachment_extension(revision)? {
            Some(attachment) => format!("attachment.{attachment}"),
            None => key.to_string(),
        },
    };

    if !provider.can_provide_for_page(page)? {
        if provider.forced_extension().is_none() {
            target.remove(&ResourceDescriptor::empty(resource_id, extension))?;
        }
        return Ok(None);
    }

    let content = provider.provide_for_revision(revision)?;
    let descriptor = ResourceDescriptor::new(resource_id, extension, content);
    target.write(&descriptor)?;
    Ok(Some(descriptor))
}
