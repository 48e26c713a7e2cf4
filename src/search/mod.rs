//! Search orchestration module
//!
//! Selects backends for a request, dispatches them concurrently,
//! merges and ranks their results.

mod dispatcher;
mod executor;
mod models;
mod selector;

pub use dispatcher::{DispatchPlan, Dispatcher};
pub use executor::Search;
pub use models::*;
pub use selector::Selector;
