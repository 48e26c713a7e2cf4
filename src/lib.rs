//! Seekify: a metasearch library aggregating results from diverse web search services
//!
//! A [`Search`] session fans a query out to several backends of one category,
//! merges their results without duplicates, ranks them and returns a bounded
//! number of records.
//!
//! ```no_run
//! # async fn demo() -> seekify::error::Result<()> {
//! use seekify::{Search, SearchRequest, Settings};
//!
//! let search = Search::new(&Settings::default());
//! let results = search.text(SearchRequest::new("rust async").with_max_results(5)).await?;
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod cache;
pub mod config;
pub mod error;
pub mod network;
pub mod results;
pub mod search;

pub use backends::{Backend, Category, Registry};
pub use config::Settings;
pub use error::{BackendError, SearchError};
pub use results::ResultRecord;
pub use search::{BackendSpec, Search, SearchRequest};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default timeout for backend requests in seconds
pub const DEFAULT_TIMEOUT: u64 = 5;
