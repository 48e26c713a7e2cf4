//! Registry mapping (category, key) to backend implementations

use super::traits::{Backend, BackendDescriptor, Category};
use super::{annasarchive, bing, brave, duckduckgo, google, grokipedia, mojeek, wikipedia, yahoo, youtube};
use crate::config::BackendConfig;
use crate::error::BackendError;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type BuildFn = dyn Fn(&BackendConfig) -> Result<Arc<dyn Backend>, BackendError> + Send + Sync;

/// Text keys always moved to the front of an `auto` selection
pub const TEXT_PRIORITY_KEYS: [&str; 2] = ["wikipedia", "grokipedia"];

static BUILTIN: Lazy<Registry> = Lazy::new(Registry::builtin_table);

/// Descriptor plus constructor for one backend implementation
#[derive(Clone)]
pub struct BackendFactory {
    descriptor: BackendDescriptor,
    build: Arc<BuildFn>,
}

impl BackendFactory {
    /// Create a factory from a descriptor and a constructor
    pub fn new<B, F>(descriptor: BackendDescriptor, build: F) -> Self
    where
        B: Backend + 'static,
        F: Fn(&BackendConfig) -> Result<B, BackendError> + Send + Sync + 'static,
    {
        Self {
            descriptor,
            build: Arc::new(move |config| Ok(Arc::new(build(config)?) as Arc<dyn Backend>)),
        }
    }

    pub fn descriptor(&self) -> &BackendDescriptor {
        &self.descriptor
    }

    /// Construct a configured instance
    pub fn build(&self, config: &BackendConfig) -> Result<Arc<dyn Backend>, BackendError> {
        (self.build)(config)
    }
}

impl fmt::Debug for BackendFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendFactory")
            .field("descriptor", &self.descriptor)
            .finish()
    }
}

/// Read-only table of available backends per category
#[derive(Debug, Clone, Default)]
pub struct Registry {
    /// Keys per category, in registration order
    categories: HashMap<Category, Vec<(String, BackendFactory)>>,
    /// Keys pinned to the front of `auto` selections
    priority_keys: HashMap<Category, Vec<String>>,
}

impl Registry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in backend
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    fn builtin_table() -> Self {
        let mut registry = Self::new();
        registry.set_priority_keys(Category::Text, TEXT_PRIORITY_KEYS);

        let table: [(&str, BackendFactory); 14] = [
            ("wikipedia", BackendFactory::new(wikipedia::Wikipedia::DESCRIPTOR, wikipedia::Wikipedia::new)),
            ("grokipedia", BackendFactory::new(grokipedia::Grokipedia::DESCRIPTOR, grokipedia::Grokipedia::new)),
            ("bing", BackendFactory::new(bing::Bing::DESCRIPTOR, bing::Bing::new)),
            ("brave", BackendFactory::new(brave::Brave::DESCRIPTOR, brave::Brave::new)),
            ("duckduckgo", BackendFactory::new(duckduckgo::DuckDuckGo::DESCRIPTOR, duckduckgo::DuckDuckGo::new)),
            ("google", BackendFactory::new(google::Google::DESCRIPTOR, google::Google::new)),
            ("mojeek", BackendFactory::new(mojeek::Mojeek::DESCRIPTOR, mojeek::Mojeek::new)),
            ("yahoo", BackendFactory::new(yahoo::Yahoo::DESCRIPTOR, yahoo::Yahoo::new)),
            ("duckduckgo", BackendFactory::new(duckduckgo::DuckDuckGoImages::DESCRIPTOR, duckduckgo::DuckDuckGoImages::new)),
            ("duckduckgo", BackendFactory::new(duckduckgo::DuckDuckGoNews::DESCRIPTOR, duckduckgo::DuckDuckGoNews::new)),
            ("bing", BackendFactory::new(bing::BingNews::DESCRIPTOR, bing::BingNews::new)),
            ("duckduckgo", BackendFactory::new(duckduckgo::DuckDuckGoVideos::DESCRIPTOR, duckduckgo::DuckDuckGoVideos::new)),
            ("youtube", BackendFactory::new(youtube::YouTube::DESCRIPTOR, youtube::YouTube::new)),
            ("annasarchive", BackendFactory::new(annasarchive::AnnasArchive::DESCRIPTOR, annasarchive::AnnasArchive::new)),
        ];

        for (key, factory) in table {
            registry.register(key, factory);
        }
        registry
    }

    /// Register a backend under a key in its descriptor's category
    ///
    /// Registering an existing key replaces it in place.
    pub fn register(&mut self, key: impl Into<String>, factory: BackendFactory) {
        let key = key.into();
        let entries = self
            .categories
            .entry(factory.descriptor().category)
            .or_default();

        match entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = factory,
            None => entries.push((key, factory)),
        }
    }

    /// Builder-style register
    pub fn with(mut self, key: impl Into<String>, factory: BackendFactory) -> Self {
        self.register(key, factory);
        self
    }

    /// Set the keys pinned to the front of `auto` selections for a category
    pub fn set_priority_keys<I, S>(&mut self, category: Category, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.priority_keys
            .insert(category, keys.into_iter().map(Into::into).collect());
    }

    /// Look up a backend by category and key
    pub fn get(&self, category: Category, key: &str) -> Option<&BackendFactory> {
        self.categories
            .get(&category)?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, f)| f)
    }

    /// All keys registered for a category, in registration order
    pub fn keys(&self, category: Category) -> Vec<&str> {
        self.categories
            .get(&category)
            .map(|entries| entries.iter().map(|(k, _)| k.as_str()).collect())
            .unwrap_or_default()
    }

    /// Pinned keys for a category
    pub fn priority_keys(&self, category: Category) -> &[String] {
        self.priority_keys
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Total number of registered (category, key) pairs
    pub fn len(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
