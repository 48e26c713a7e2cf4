//! Search request and related data models

use crate::backends::{SafeSearch, SearchParams, TimeLimit};
use crate::config::SearchDefaults;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Default number of results returned per call
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// Requested backends: `auto`, `all`, or a list of registry keys
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct BackendSpec(Vec<String>);

impl BackendSpec {
    /// Let the selector pick every backend of the category
    pub fn auto() -> Self {
        Self(vec!["auto".to_string()])
    }

    /// Requested keys, trimmed, in the order given
    pub fn keys(&self) -> &[String] {
        &self.0
    }

    /// Whether every registered backend should be used
    pub fn is_auto(&self) -> bool {
        self.0.iter().any(|k| k == "auto" || k == "all")
    }
}

impl Default for BackendSpec {
    fn default() -> Self {
        Self::auto()
    }
}

impl From<&str> for BackendSpec {
    fn from(spec: &str) -> Self {
        Self(spec.split(',').map(|k| k.trim().to_string()).collect())
    }
}

impl From<String> for BackendSpec {
    fn from(spec: String) -> Self {
        Self::from(spec.as_str())
    }
}

/// Legacy list form, equivalent to joining the keys with commas
impl<S: AsRef<str>> From<Vec<S>> for BackendSpec {
    fn from(keys: Vec<S>) -> Self {
        let joined = keys.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(",");
        Self::from(joined.as_str())
    }
}

impl From<BackendSpec> for String {
    fn from(spec: BackendSpec) -> Self {
        spec.to_string()
    }
}

impl fmt::Display for BackendSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(","))
    }
}

/// A single call to one of the category operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// The search query string
    pub query: String,
    /// Deprecated alias for `query`; wins when non-empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    /// Region code such as `us-en` or `wt-wt`
    pub region: String,
    /// Safe search level
    pub safesearch: SafeSearch,
    /// Time limit filter
    pub timelimit: Option<TimeLimit>,
    /// Maximum number of results (None = everything collected)
    pub max_results: Option<usize>,
    /// Page number (1-indexed)
    pub page: u32,
    /// Requested backends
    pub backend: BackendSpec,
    /// Backend-specific options
    #[serde(default)]
    pub extra: HashMap<String, String>,
}

impl SearchRequest {
    /// Create a request with default parameters
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            keywords: None,
            region: "us-en".to_string(),
            safesearch: SafeSearch::default(),
            timelimit: None,
            max_results: Some(DEFAULT_MAX_RESULTS),
            page: 1,
            backend: BackendSpec::auto(),
            extra: HashMap::new(),
        }
    }

    /// Create a request using configured defaults
    ///
    /// Unparseable safesearch values fall back to `moderate`.
    pub fn from_defaults(query: impl Into<String>, defaults: &SearchDefaults) -> Self {
        Self {
            region: defaults.region.clone(),
            safesearch: defaults.safesearch.parse().unwrap_or_default(),
            max_results: defaults.max_results,
            backend: BackendSpec::from(defaults.backend.as_str()),
            ..Self::new(query)
        }
    }

    /// Set the deprecated `keywords` alias
    pub fn with_keywords(mut self, keywords: impl Into<String>) -> Self {
        self.keywords = Some(keywords.into());
        self
    }

    /// Set region
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Set safe search
    pub fn with_safesearch(mut self, safesearch: SafeSearch) -> Self {
        self.safesearch = safesearch;
        self
    }

    /// Set time limit
    pub fn with_timelimit(mut self, timelimit: TimeLimit) -> Self {
        self.timelimit = Some(timelimit);
        self
    }

    /// Set maximum result count (None or zero = unbounded)
    pub fn with_max_results(mut self, max_results: impl Into<Option<usize>>) -> Self {
        self.max_results = max_results.into().filter(|&n| n > 0);
        self
    }

    /// Set page number
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    /// Set requested backends
    pub fn with_backend(mut self, backend: impl Into<BackendSpec>) -> Self {
        self.backend = backend.into();
        self
    }

    /// Add a backend-specific option
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// The effective query after resolving the deprecated alias
    pub fn resolved_query(&self) -> Option<&str> {
        self.keywords
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .or(Some(self.query.as_str()))
            .filter(|q| !q.trim().is_empty())
    }

    /// Target count for early termination, if any
    pub fn target(&self) -> Option<usize> {
        self.max_results.filter(|&n| n > 0)
    }

    /// Parameters handed to every backend
    pub fn params(&self, query: &str) -> SearchParams {
        SearchParams {
            query: query.to_string(),
            region: self.region.clone(),
            safesearch: self.safesearch,
            timelimit: self.timelimit,
            page: self.page.max(1),
            extra: self.extra.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_spec_parsing() {
        let spec = BackendSpec::from(" bing , brave");
        assert_eq!(spec.keys(), ["bing", "brave"]);
        assert!(!spec.is_auto());
        assert!(BackendSpec::from("wikipedia,all").is_auto());
        assert!(BackendSpec::default().is_auto());
    }

    #[test]
    fn test_backend_spec_legacy_list() {
        let spec = BackendSpec::from(vec!["google", "mojeek"]);
        assert_eq!(spec, BackendSpec::from("google,mojeek"));
        assert_eq!(spec.to_string(), "google,mojeek");
    }

    #[test]
    fn test_resolved_query() {
        assert_eq!(SearchRequest::new("rust").resolved_query(), Some("rust"));
        assert_eq!(SearchRequest::new("").resolved_query(), None);
        assert_eq!(SearchRequest::new("   ").resolved_query(), None);
        assert_eq!(
            SearchRequest::new("").with_keywords("tokio").resolved_query(),
            Some("tokio")
        );
        assert_eq!(
            SearchRequest::new("rust").with_keywords("").resolved_query(),
            Some("rust")
        );
    }

    #[test]
    fn test_max_results() {
        assert_eq!(SearchRequest::new("q").target(), Some(10));
        assert_eq!(SearchRequest::new("q").with_max_results(None).target(), None);
        assert_eq!(SearchRequest::new("q").with_max_results(0).target(), None);
        assert_eq!(SearchRequest::new("q").with_max_results(3).target(), Some(3));
    }

    #[test]
    fn test_from_defaults() {
        let defaults = SearchDefaults {
            region: "de-de".to_string(),
            safesearch: "off".to_string(),
            max_results: Some(25),
            backend: "bing,brave".to_string(),
        };
        let request = SearchRequest::from_defaults("q", &defaults);
        assert_eq!(request.region, "de-de");
        assert_eq!(request.safesearch, SafeSearch::Off);
        assert_eq!(request.max_results, Some(25));
        assert_eq!(request.backend.keys(), ["bing", "brave"]);
    }
}
