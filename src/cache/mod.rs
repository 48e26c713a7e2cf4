//! Backend instance cache
//!
//! Holds at most one constructed instance per backend implementation for the
//! lifetime of a search session.

use crate::backends::{Backend, BackendFactory};
use crate::config::BackendConfig;
use crate::error::BackendError;
use moka::future::Cache;
use std::sync::Arc;
use tracing::debug;

/// Lazily constructed backend instances keyed by implementation name
pub struct BackendCache {
    cache: Cache<&'static str, Arc<dyn Backend>>,
    config: BackendConfig,
}

impl BackendCache {
    /// Create an empty cache; instances are built with `config`
    pub fn new(config: BackendConfig) -> Self {
        Self {
            cache: Cache::builder().build(),
            config,
        }
    }

    /// Get the instance for `factory`, constructing it on first use
    ///
    /// Concurrent first uses of the same implementation construct it once.
    pub async fn get_or_build(&self, factory: &BackendFactory) -> Result<Arc<dyn Backend>, BackendError> {
        let name = factory.descriptor().name;
        self.cache
            .try_get_with(name, async {
                debug!("constructing backend {}", name);
                factory.build(&self.config)
            })
            .await
            .map_err(|e| BackendError::Build(format!("{name}: {e}")))
    }

    /// Whether an instance of `name` has been constructed
    pub fn contains(&self, name: &str) -> bool {
        self.cache.contains_key(name)
    }

    /// Configuration new instances are built with
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }
}

impl Default for BackendCache {
    fn default() -> Self {
        Self::new(BackendConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{BackendDescriptor, Category, SearchParams};
    use crate::results::ResultRecord;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Dummy;

    const DUMMY: BackendDescriptor = BackendDescriptor {
        name: "dummy",
        provider: "dummy",
        priority: 1,
        category: Category::Text,
    };

    #[async_trait]
    impl Backend for Dummy {
        fn descriptor(&self) -> &BackendDescriptor {
            &DUMMY
        }

        async fn search(&self, _params: &SearchParams) -> Result<Vec<ResultRecord>, BackendError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_concurrent_first_use_builds_once() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = built.clone();
        let factory = BackendFactory::new(DUMMY, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Dummy)
        });

        let cache = BackendCache::default();
        let lookups = (0..8).map(|_| cache.get_or_build(&factory));
        let instances = futures::future::join_all(lookups).await;

        assert!(instances.iter().all(Result::is_ok));
        assert_eq!(built.load(Ordering::SeqCst), 1);
        assert!(cache.contains("dummy"));
    }

    #[tokio::test]
    async fn test_failed_build_is_retried() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let factory = BackendFactory::new(DUMMY, move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(BackendError::Build("first attempt".into()))
            } else {
                Ok(Dummy)
            }
        });

        let cache = BackendCache::default();
        assert!(cache.get_or_build(&factory).await.is_err());
        assert!(!cache.contains("dummy"));
        assert!(cache.get_or_build(&factory).await.is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_instances_are_never_evicted() {
        let cache = BackendCache::default();
        let names: Vec<&'static str> = (0..300)
            .map(|i| &*Box::leak(format!("backend{i}").into_boxed_str()))
            .collect();

        for name in &names {
            let descriptor = BackendDescriptor { name: *name, ..DUMMY };
            let factory = BackendFactory::new(descriptor, |_| Ok(Dummy));
            assert!(cache.get_or_build(&factory).await.is_ok());
        }
        cache.cache.run_pending_tasks().await;

        assert!(names.iter().all(|name| cache.contains(name)));
    }
}
