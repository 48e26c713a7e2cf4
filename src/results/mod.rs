//! Result records, aggregation and ranking
//!
//! Records returned by backends are merged by `ResultsAggregator` and
//! reordered by `SimpleFilterRanker` before being handed back to callers.

mod aggregator;
mod ranker;
mod types;

pub use aggregator::{ResultsAggregator, DEFAULT_IDENTITY_FIELDS};
pub use ranker::SimpleFilterRanker;
pub use types::*;
