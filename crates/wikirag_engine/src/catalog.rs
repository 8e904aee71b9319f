use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rag_logging::rag_debug;
use thiserror::Error;
use wikirag_core::ResourceIdentity;

use crate::config::{ExportConfig, TargetSettings};
use crate::observer::ChangeObserver;
use crate::pipeline::{ContextProviders, KeyedMap, Pipeline};
use crate::provider::{ContextProvider, DataProvider};
use crate::providers::{DeletedProvider, IdProvider, DELETED_KEY, ID_KEY};
use crate::target::{Target, TargetError};

pub type TargetFactory = dyn Fn() -> Box<dyn Target> + Send + Sync;
pub type DataProviderFactory = dyn Fn() -> Result<Arc<dyn DataProvider>, String> + Send + Sync;
pub type ContextProviderFactory =
    dyn Fn() -> Result<Arc<dyn ContextProvider>, String> + Send + Sync;
/// Receives the pipeline subset of providers reacting to the observer's key.
pub type ChangeObserverFactory =
    dyn Fn(Pipeline) -> Result<Arc<dyn ChangeObserver>, String> + Send + Sync;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid target configuration: {0}")]
    InvalidTarget(String),
    #[error("target type '{0}' not found in registry")]
    UnknownTarget(String),
    #[error("target '{key}' rejected its configuration: {source}")]
    TargetConfig {
        key: String,
        #[source]
        source: TargetError,
    },
    #[error("data provider type '{0}' not found in registry")]
    UnknownDataProvider(String),
    #[error("failed to create {kind} '{key}': {message}")]
    Construction {
        kind: &'static str,
        key: String,
        message: String,
    },
}

/// Factories keyed by configuration key, in registration order.
#[derive(Default, Clone)]
pub struct Registries {
    pub targets: KeyedMap<TargetFactory>,
    pub data_providers: KeyedMap<DataProviderFactory>,
    pub change_observers: KeyedMap<ChangeObserverFactory>,
    pub context_providers: KeyedMap<ContextProviderFactory>,
}

impl Registries {
    pub fn register_target(
        &mut self,
        key: &str,
        factory: impl Fn() -> Box<dyn Target> + Send + Sync + 'static,
    ) {
        self.targets.insert(key, Arc::new(factory));
    }

    pub fn register_data_provider(
        &mut self,
        key: &str,
        factory: impl Fn() -> Result<Arc<dyn DataProvider>, String> + Send + Sync + 'static,
    ) {
        self.data_providers.insert(key, Arc::new(factory));
    }

    pub fn register_change_observer(
        &mut self,
        key: &str,
        factory: impl Fn(Pipeline) -> Result<Arc<dyn ChangeObserver>, String> + Send + Sync + 'static,
    ) {
        self.change_observers.insert(key, Arc::new(factory));
    }

    pub fn register_context_provider(
        &mut self,
        key: &str,
        factory: impl Fn() -> Result<Arc<dyn ContextProvider>, String> + Send + Sync + 'static,
    ) {
        self.context_providers.insert(key, Arc::new(factory));
    }
}

/// Resolves configuration into the target, pipeline, change observers and
/// context providers. Everything constructed is cached for the process.
pub struct Catalog {
    config: ExportConfig,
    identity: ResourceIdentity,
    registries: Registries,
    target: Mutex<Option<Arc<dyn Target>>>,
    data_providers: Mutex<HashMap<String, Arc<dyn DataProvider>>>,
    change_observers: Mutex<Option<Vec<Arc<dyn ChangeObserver>>>>,
    context_providers: Mutex<Option<ContextProviders>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Catalog {
    pub fn new(config: ExportConfig, mut registries: Registries) -> Self {
        let identity = ResourceIdentity::new(config.wiki_id.clone());
        let id_identity = identity.clone();
        registries.register_data_provider(DELETED_KEY, || Ok(Arc::new(DeletedProvider)));
        registries.register_data_provider(ID_KEY, move || {
            Ok(Arc::new(IdProvider::new(id_identity.clone())))
        });
        Self {
            config,
            identity,
            registries,
            target: Mutex::new(None),
            data_providers: Mutex::new(HashMap::new()),
            change_observers: Mutex::new(None),
            context_providers: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn identity(&self) -> &ResourceIdentity {
        &self.identity
    }

    pub fn get_target(&self) -> Result<Arc<dyn Target>, CatalogError> {
        let mut cached = lock(&self.target);
        if let Some(target) = cached.as_ref() {
            return Ok(target.clone());
        }
        let descriptor = self
            .config
            .target
            .as_ref()
            .ok_or_else(|| CatalogError::InvalidTarget("no target configured".into()))?;
        if descriptor.kind.is_empty() {
            return Err(CatalogError::InvalidTarget("target type is empty".into()));
        }
        let factory = self
            .registries
            .targets
            .get(&descriptor.kind)
            .ok_or_else(|| CatalogError::UnknownTarget(descriptor.kind.clone()))?;
        let settings = parse_target_config(&descriptor.configuration)?;
        let mut target = factory();
        target
            .set_config(settings)
            .map_err(|source| CatalogError::TargetConfig {
                key: descriptor.kind.clone(),
                source,
            })?;
        let target: Arc<dyn Target> = Arc::from(target);
        *cached = Some(target.clone());
        rag_debug!("Created target '{}'", descriptor.kind);
        Ok(target)
    }

    /// A non-empty pipeline is configured and the target resolves.
    pub fn is_configured(&self) -> bool {
        !self.config.pipeline.is_empty() && self.get_target().is_ok()
    }

    /// Configured providers in order, plus the implicit `id` provider. With
    /// `observer` set, only providers reacting to that observer key are kept
    /// (`id` is still appended).
    pub fn get_pipeline(&self, observer: Option<&str>) -> Result<Pipeline, CatalogError> {
        let mut pipeline = Pipeline::new();
        for key in &self.config.pipeline {
            let provider = self.get_data_provider(key)?;
            let include = match observer {
                Some(observer) => provider.change_observers().iter().any(|o| o == observer),
                None => true,
            };
            if include {
                pipeline.insert(key.clone(), provider);
            }
        }
        if !pipeline.contains_key(ID_KEY) {
            pipeline.insert(ID_KEY, self.get_data_provider(ID_KEY)?);
        }
        Ok(pipeline)
    }

    pub fn get_data_provider(&self, key: &str) -> Result<Arc<dyn DataProvider>, CatalogError> {
        let mut cached = lock(&self.data_providers);
        if let Some(provider) = cached.get(key) {
            return Ok(provider.clone());
        }
        let factory = self
            .registries
            .data_providers
            .get(key)
            .ok_or_else(|| CatalogError::UnknownDataProvider(key.to_string()))?;
        let provider = factory().map_err(|message| CatalogError::Construction {
            kind: "data provider",
            key: key.to_string(),
            message,
        })?;
        cached.insert(key.to_string(), provider.clone());
        Ok(provider)
    }

    pub fn get_change_observers(&self) -> Result<Vec<Arc<dyn ChangeObserver>>, CatalogError> {
        let mut cached = lock(&self.change_observers);
        if let Some(observers) = cached.as_ref() {
            return Ok(observers.clone());
        }
        let mut observers = Vec::new();
        for (key, factory) in self.registries.change_observers.iter() {
            if self.config.is_disabled(key) {
                continue;
            }
            let pipeline = self.get_pipeline(Some(key))?;
            let observer = factory(pipeline).map_err(|message| CatalogError::Construction {
                kind: "change observer",
                key: key.to_string(),
                message,
            })?;
            observers.push(observer);
        }
        *cached = Some(observers.clone());
        Ok(observers)
    }

    pub fn get_context_providers(&self) -> Result<ContextProviders, CatalogError> {
        let mut cached = lock(&self.context_providers);
        if let Some(providers) = cached.as_ref() {
            return Ok(providers.clone());
        }
        let mut providers = ContextProviders::new();
        for (key, factory) in self.registries.context_providers.iter() {
            if self.config.is_disabled(key) {
                continue;
            }
            let provider = factory().map_err(|message| CatalogError::Construction {
                kind: "context provider",
                key: key.to_string(),
                message,
            })?;
            providers.insert(key, provider);
        }
        *cached = Some(providers.clone());
        Ok(providers)
    }

    pub fn get_context_provider(
        &self,
        key: &str,
    ) -> Result<Option<Arc<dyn ContextProvider>>, CatalogError> {
        Ok(self.get_context_providers()?.get(key).cloned())
    }
}

/// Accepts a JSON object, a string holding one, or nothing.
fn parse_target_config(value: &serde_json::Value) -> Result<TargetSettings, CatalogError> {
    match value {
        serde_json::Value::Object(map) => Ok(map.clone()),
        serde_json::Value::Null => Ok(TargetSettings::new()),
        serde_json::Value::String(text) => match serde_json::from_str(text) {
            Ok(serde_json::Value::Object(map)) => Ok(map),
            Ok(_) => Err(CatalogError::InvalidTarget(
                "configuration string must hold a JSON object".into(),
            )),
            Err(err) => Err(CatalogError::InvalidTarget(format!(
                "invalid JSON in target configuration: {err}"
            ))),
        },
        _ => Err(CatalogError::InvalidTarget(
            "configuration must be an object or a JSON string".into(),
        )),
    }
}
