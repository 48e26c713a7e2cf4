//! Concurrent dispatch of one call across the selected backends

use crate::backends::{Backend, SearchParams};
use crate::error::BackendError;
use crate::results::{ResultRecord, ResultsAggregator};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Backends to query for one call, with the derived concurrency bound
pub struct DispatchPlan {
    backends: Vec<Arc<dyn Backend>>,
    target: Option<usize>,
    max_workers: usize,
    timeout: Duration,
}

impl DispatchPlan {
    /// Build a plan for `backends` in the order they should be tried
    ///
    /// With a target count only `ceil(target / 10) + 1` providers are queried
    /// at once, never more than there are distinct providers.
    pub fn new(backends: Vec<Arc<dyn Backend>>, target: Option<usize>, timeout: Duration) -> Self {
        let target = target.filter(|&t| t > 0);
        let unique = backends
            .iter()
            .map(|b| b.descriptor().provider)
            .collect::<HashSet<_>>()
            .len();
        let max_workers = match target {
            Some(t) => unique.min(t.div_ceil(10) + 1),
            None => unique,
        };

        Self {
            backends,
            target,
            max_workers,
            timeout,
        }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    pub fn target(&self) -> Option<usize> {
        self.target
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

/// Message sent by a backend task when it finishes
struct Outcome {
    slot: usize,
    name: &'static str,
    provider: &'static str,
    result: Result<Vec<ResultRecord>, BackendError>,
}

/// Why a batch wait returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BatchEnd {
    Drained,
    Failed,
    Enough,
    TimedOut,
}

/// Mutable state of one dispatch
struct CallState {
    aggregator: ResultsAggregator,
    /// Providers that produced results in this call
    served: HashSet<&'static str>,
    /// Slot -> provider of every task not yet reported
    in_flight: HashMap<usize, &'static str>,
    last_error: Option<BackendError>,
    target: Option<usize>,
}

impl CallState {
    fn enough(&self) -> bool {
        self.target.is_some_and(|t| self.aggregator.len() >= t)
    }

    fn is_busy(&self, provider: &str) -> bool {
        self.served.contains(provider) || self.in_flight.values().any(|p| *p == provider)
    }

    fn record(&mut self, outcome: Outcome) -> bool {
        self.in_flight.remove(&outcome.slot);
        match outcome.result {
            Ok(records) => {
                let received = records.len();
                if received > 0 {
                    self.served.insert(outcome.provider);
                }
                let accepted = self.aggregator.extend(records);
                debug!(
                    "backend {} returned {} results ({} new)",
                    outcome.name, received, accepted
                );
                true
            }
            Err(e) => {
                info!("Error in backend {}: {}", outcome.name, e);
                self.last_error = Some(e);
                false
            }
        }
    }
}

/// Runs dispatch plans on a worker pool shared by every call of a session
#[derive(Clone)]
pub struct Dispatcher {
    pool: Arc<Semaphore>,
}

impl Dispatcher {
    /// Create a dispatcher with `workers` permits
    pub fn new(workers: usize) -> Self {
        Self {
            pool: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    /// Permits not currently held by a backend task
    pub fn available_workers(&self) -> usize {
        self.pool.available_permits()
    }

    /// Query the planned backends, returning merged records and the last error
    ///
    /// Backends whose provider already produced results, or is still being
    /// queried, are skipped. Tasks left running when this returns are
    /// cancelled at their next await point.
    pub async fn run(
        &self,
        plan: &DispatchPlan,
        params: SearchParams,
    ) -> (ResultsAggregator, Option<BackendError>) {
        let token = CancellationToken::new();
        let _guard = token.clone().drop_guard();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let params = Arc::new(params);

        let mut state = CallState {
            aggregator: ResultsAggregator::default(),
            served: HashSet::new(),
            in_flight: HashMap::new(),
            last_error: None,
            target: plan.target,
        };

        debug!(
            "dispatching to {} backends with {} workers",
            plan.len(),
            plan.max_workers
        );

        // Deadline and outcome of the most recent batch wait
        let mut last_batch = None;

        for (slot, backend) in plan.backends.iter().enumerate() {
            let provider = backend.descriptor().provider;
            if state.is_busy(provider) {
                debug!("skipping {}: provider {} already queried", backend.name(), provider);
            } else {
                state.in_flight.insert(slot, provider);
                self.spawn(slot, backend.clone(), params.clone(), tx.clone(), token.clone());
            }

            if state.in_flight.len() >= plan.max_workers || slot + 1 >= plan.max_workers {
                let deadline = Instant::now() + plan.timeout;
                let end = self.wait_batch(&mut rx, &mut state, deadline).await;
                last_batch = Some((deadline, end));
            }

            if state.enough() {
                break;
            }
        }

        // Stragglers of the last batch share its deadline
        let deadline = match last_batch {
            Some((_, BatchEnd::TimedOut)) => None,
            Some((deadline, _)) => Some(deadline),
            None => Some(Instant::now() + plan.timeout),
        };
        if let Some(deadline) = deadline {
            while !state.in_flight.is_empty() && !state.enough() {
                if self.wait_batch(&mut rx, &mut state, deadline).await == BatchEnd::TimedOut {
                    break;
                }
            }
        }
        if !state.in_flight.is_empty() && !state.enough() {
            debug!("giving up on {} pending backends", state.in_flight.len());
        }

        (state.aggregator, state.last_error)
    }

    fn spawn(
        &self,
        slot: usize,
        backend: Arc<dyn Backend>,
        params: Arc<SearchParams>,
        tx: mpsc::UnboundedSender<Outcome>,
        token: CancellationToken,
    ) {
        let pool = self.pool.clone();
        tokio::spawn(async move {
            let descriptor = *backend.descriptor();
            let result = tokio::select! {
                _ = token.cancelled() => return,
                permit = pool.acquire_owned() => match permit {
                    Ok(_permit) => tokio::select! {
                        _ = token.cancelled() => return,
                        result = backend.search(&params) => result,
                    },
                    Err(_) => Err(BackendError::Cancelled),
                },
            };

            // The receiver is gone once the call has returned
            let _ = tx.send(Outcome {
                slot,
                name: descriptor.name,
                provider: descriptor.provider,
                result,
            });
        });
    }

    /// Wait until the batch drains, a task fails, the target is reached, or `deadline` passes
    async fn wait_batch(
        &self,
        rx: &mut mpsc::UnboundedReceiver<Outcome>,
        state: &mut CallState,
        deadline: Instant,
    ) -> BatchEnd {
        let expired = sleep_until(deadline);
        tokio::pin!(expired);

        loop {
            if state.in_flight.is_empty() {
                return BatchEnd::Drained;
            }

            tokio::select! {
                _ = &mut expired => {
                    debug!("batch timed out with {} backends pending", state.in_flight.len());
                    return BatchEnd::TimedOut;
                }
                Some(outcome) = rx.recv() => {
                    if !state.record(outcome) {
                        return BatchEnd::Failed;
                    }
                    if state.enough() {
                        return BatchEnd::Enough;
                    }
                }
            }
        }
    }
}
