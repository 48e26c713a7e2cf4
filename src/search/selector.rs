//! Backend selection
//!
//! Turns a requested backend list into the ordered list of instances a call
//! will dispatch to.

use super::models::BackendSpec;
use crate::backends::{Backend, BackendFactory, Category, Registry};
use crate::cache::BackendCache;
use crate::error::{Result, SearchError};
use futures::future::try_join_all;
use rand::seq::SliceRandom;
use rand::Rng;
use std::cmp::Reverse;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;

/// Resolves requested backend lists against a registry and instance cache
pub struct Selector<'a> {
    registry: &'a Registry,
    cache: &'a BackendCache,
}

impl<'a> Selector<'a> {
    pub fn new(registry: &'a Registry, cache: &'a BackendCache) -> Self {
        Self { registry, cache }
    }

    /// Resolve and instantiate the backends for one call
    pub async fn select(&self, category: Category, spec: &BackendSpec) -> Result<Vec<Arc<dyn Backend>>> {
        let factories = {
            let mut rng = rand::thread_rng();
            self.resolve(category, spec, &mut rng)?
        };
        self.instantiate(&factories).await
    }

    /// Resolve a backend list to factories ordered by descending priority
    ///
    /// An unknown key makes the whole list fall back to `auto`.
    pub fn resolve<R: Rng + ?Sized>(
        &self,
        category: Category,
        spec: &BackendSpec,
        rng: &mut R,
    ) -> Result<Vec<&'a BackendFactory>> {
        match self.resolve_keys(category, spec, rng) {
            Ok(factories) => Ok(factories),
            Err(unknown) => {
                let mut available = self.registry.keys(category);
                available.sort_unstable();
                warn!(
                    "{:?} - backend does not exist or is disabled. Available: {}. Using 'auto'",
                    unknown,
                    available.join(", ")
                );
                self.resolve_keys(category, &BackendSpec::auto(), rng)
                    .map_err(|key| SearchError::msg(format!("no {category} backend registered as {key:?}")))
            }
        }
    }

    /// Resolve without fallback, returning the first unknown key on failure
    fn resolve_keys<R: Rng + ?Sized>(
        &self,
        category: Category,
        spec: &BackendSpec,
        rng: &mut R,
    ) -> std::result::Result<Vec<&'a BackendFactory>, String> {
        let keys: Vec<&str> = if spec.is_auto() {
            let mut all = self.registry.keys(category);
            all.shuffle(rng);

            let pinned: Vec<&str> = self
                .registry
                .priority_keys(category)
                .iter()
                .map(String::as_str)
                .filter(|key| all.contains(key))
                .collect();
            all.retain(|key| !pinned.contains(key));
            pinned.into_iter().chain(all).collect()
        } else {
            spec.keys().iter().map(String::as_str).collect()
        };

        let mut names = HashSet::new();
        let mut factories = Vec::with_capacity(keys.len());
        for key in keys {
            let factory = self
                .registry
                .get(category, key)
                .ok_or_else(|| key.to_string())?;
            // Several keys may map to one implementation
            if names.insert(factory.descriptor().name) {
                factories.push(factory);
            }
        }

        // Stable: equal priorities keep the shuffled (or caller's) order
        factories.sort_by_key(|f| Reverse(f.descriptor().priority));
        Ok(factories)
    }

    /// Fetch or construct an instance for each factory, preserving order
    pub async fn instantiate(&self, factories: &[&BackendFactory]) -> Result<Vec<Arc<dyn Backend>>> {
        try_join_all(factories.iter().map(|f| self.cache.get_or_build(f)))
            .await
            .map_err(|e| SearchError::Search {
                message: e.to_string(),
                source: Some(e),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn names(factories: &[&BackendFactory]) -> Vec<&'static str> {
        factories.iter().map(|f| f.descriptor().name).collect()
    }

    #[test]
    fn test_auto_pins_priority_keys() {
        let registry = Registry::builtin();
        let cache = BackendCache::default();
        let selector = Selector::new(&registry, &cache);

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let resolved = selector
                .resolve(Category::Text, &BackendSpec::auto(), &mut rng)
                .unwrap();
            let names = names(&resolved);
            assert_eq!(&names[..2], ["wikipedia", "grokipedia"]);
            assert_eq!(names.len(), 8);
        }
    }

    #[test]
    fn test_literal_keys_keep_order() {
        let registry = Registry::builtin();
        let cache = BackendCache::default();
        let selector = Selector::new(&registry, &cache);
        let mut rng = StdRng::seed_from_u64(7);

        let resolved = selector
            .resolve(Category::Text, &BackendSpec::from("mojeek,brave,bing"), &mut rng)
            .unwrap();
        assert_eq!(names(&resolved), ["mojeek", "brave", "bing"]);

        // Higher priority moves ahead of the caller's order
        let resolved = selector
            .resolve(Category::Text, &BackendSpec::from("brave,wikipedia"), &mut rng)
            .unwrap();
        assert_eq!(names(&resolved), ["wikipedia", "brave"]);
    }

    #[test]
    fn test_unknown_key_falls_back_to_auto() {
        let registry = Registry::builtin();
        let cache = BackendCache::default();
        let selector = Selector::new(&registry, &cache);
        let mut rng = StdRng::seed_from_u64(1);

        let resolved = selector
            .resolve(Category::News, &BackendSpec::from("bing,nope"), &mut rng)
            .unwrap();
        let mut names = names(&resolved);
        names.sort_unstable();
        assert_eq!(names, ["bing_news", "duckduckgo_news"]);
    }

    #[test]
    fn test_duplicate_keys_resolve_once() {
        let registry = Registry::builtin();
        let cache = BackendCache::default();
        let selector = Selector::new(&registry, &cache);
        let mut rng = StdRng::seed_from_u64(3);

        let resolved = selector
            .resolve(Category::Text, &BackendSpec::from("bing,bing"), &mut rng)
            .unwrap();
        assert_eq!(names(&resolved), ["bing"]);
    }

    #[tokio::test]
    async fn test_instances_are_shared() {
        let registry = Registry::builtin();
        let cache = BackendCache::default();
        let selector = Selector::new(&registry, &cache);

        let first = selector.select(Category::Books, &BackendSpec::auto()).await.unwrap();
        let second = selector.select(Category::Books, &BackendSpec::auto()).await.unwrap();
        assert_eq!(first.len(), 1);
        assert!(Arc::ptr_eq(&first[0], &second[0]));
        assert!(cache.contains("annasarchive"));
    }
}
