//! Search facade
//!
//! A `Search` is one long-lived session: it owns the backend registry, the
//! instance cache and the worker pool shared by all of its calls.

use super::dispatcher::{DispatchPlan, Dispatcher};
use super::models::SearchRequest;
use super::selector::Selector;
use crate::backends::{Category, Registry};
use crate::cache::BackendCache;
use crate::config::{BackendConfig, Settings};
use crate::error::{Result, SearchError};
use crate::results::{ResultRecord, SimpleFilterRanker};
use std::time::Duration;
use tracing::{debug, info};

/// Metasearch session coordinating backends for every category
pub struct Search {
    /// Backend registry
    registry: Registry,
    /// Constructed backend instances
    cache: BackendCache,
    /// Worker pool shared by all calls
    dispatcher: Dispatcher,
    /// Per-batch wait timeout
    timeout: Duration,
    ranker: SimpleFilterRanker,
}

impl Search {
    /// Create a session with the built-in backends
    pub fn new(settings: &Settings) -> Self {
        Self::with_registry(settings, Registry::builtin())
    }

    /// Create a session with a custom registry
    pub fn with_registry(settings: &Settings, registry: Registry) -> Self {
        let config = settings.backend_config();
        Self {
            registry,
            timeout: config.timeout,
            cache: BackendCache::new(config),
            dispatcher: Dispatcher::new(settings.worker_budget()),
            ranker: SimpleFilterRanker::default(),
        }
    }

    /// Set the timeout for backend requests and for each call's wait
    ///
    /// Backends are rebuilt with the new timeout on their next use.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let config = BackendConfig {
            timeout,
            ..self.cache.config().clone()
        };
        self.cache = BackendCache::new(config);
        self.timeout = timeout;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Perform a text search
    pub async fn text(&self, request: SearchRequest) -> Result<Vec<ResultRecord>> {
        self.search(Category::Text, request).await
    }

    /// Perform an image search
    pub async fn images(&self, request: SearchRequest) -> Result<Vec<ResultRecord>> {
        self.search(Category::Images, request).await
    }

    /// Perform a news search
    pub async fn news(&self, request: SearchRequest) -> Result<Vec<ResultRecord>> {
        self.search(Category::News, request).await
    }

    /// Perform a video search
    pub async fn videos(&self, request: SearchRequest) -> Result<Vec<ResultRecord>> {
        self.search(Category::Videos, request).await
    }

    /// Perform a book search
    pub async fn books(&self, request: SearchRequest) -> Result<Vec<ResultRecord>> {
        self.search(Category::Books, request).await
    }

    /// Search one category
    ///
    /// Partial results win over errors: an error is returned only when no
    /// backend produced anything.
    pub async fn search(&self, category: Category, request: SearchRequest) -> Result<Vec<ResultRecord>> {
        let query = request
            .resolved_query()
            .ok_or_else(|| SearchError::msg("query is mandatory."))?
            .to_string();

        let backends = Selector::new(&self.registry, &self.cache)
            .select(category, &request.backend)
            .await?;
        let plan = DispatchPlan::new(backends, request.target(), self.timeout);

        info!(
            "Executing {} search '{}' on {} backends",
            category,
            query,
            plan.len()
        );

        let (aggregator, last_error) = self.dispatcher.run(&plan, request.params(&query)).await;
        let results = self.ranker.rank(aggregator.into_records(), &query);
        debug!("{} results after ranking", results.len());

        if results.is_empty() {
            return Err(SearchError::from_last_error(last_error));
        }

        Ok(match request.target() {
            Some(max) => results.into_iter().take(max).collect(),
            None => results,
        })
    }
}
