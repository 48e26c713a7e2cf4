//! End-to-end behaviour of the search facade with in-process fake backends

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use seekify::backends::{BackendDescriptor, BackendFactory, SearchParams};
use seekify::cache::BackendCache;
use seekify::search::Selector;
use seekify::{Backend, BackendError, BackendSpec, Category, Registry, ResultRecord, Search, SearchError, SearchRequest, Settings};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_test::{assert_err, assert_ok};

#[derive(Clone)]
struct Fake {
    descriptor: BackendDescriptor,
    delay: Duration,
    records: Vec<ResultRecord>,
    fail: Option<fn() -> BackendError>,
    calls: Arc<AtomicUsize>,
}

impl Fake {
    fn new(name: &'static str, provider: &'static str) -> Self {
        Self {
            descriptor: BackendDescriptor {
                name,
                provider,
                priority: 1,
                category: Category::Text,
            },
            delay: Duration::from_millis(5),
            records: Vec::new(),
            fail: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn priority(mut self, priority: i32) -> Self {
        self.descriptor.priority = priority;
        self
    }

    fn delay(mut self, millis: u64) -> Self {
        self.delay = Duration::from_millis(millis);
        self
    }

    fn returns(mut self, records: &[(&str, &str)]) -> Self {
        self.records = records
            .iter()
            .map(|(title, href)| ResultRecord::new().with("title", *title).with("href", *href))
            .collect();
        self
    }

    fn fails(mut self, err: fn() -> BackendError) -> Self {
        self.fail = Some(err);
        self
    }

    fn factory(&self) -> BackendFactory {
        let fake = self.clone();
        BackendFactory::new(self.descriptor, move |_| Ok(fake.clone()))
    }
}

#[async_trait]
impl Backend for Fake {
    fn descriptor(&self) -> &BackendDescriptor {
        &self.descriptor
    }

    async fn search(&self, _params: &SearchParams) -> Result<Vec<ResultRecord>, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        match self.fail {
            Some(err) => Err(err()),
            None => Ok(self.records.clone()),
        }
    }
}

fn session(fakes: &[&Fake]) -> Search {
    let mut registry = Registry::new();
    for fake in fakes {
        registry.register(fake.descriptor.name, fake.factory());
    }
    Search::with_registry(&Settings::default(), registry)
}

#[tokio::test]
async fn empty_query_is_rejected_for_every_category() {
    let fake = Fake::new("one", "one").returns(&[("x", "https://x.example/")]);
    let search = session(&[&fake]);

    for category in Category::ALL {
        let err = assert_err!(search.search(category, SearchRequest::new("")).await);
        match err {
            SearchError::Search { message, source } => {
                assert_eq!(message, "query is mandatory.");
                assert!(source.is_none());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
    assert_eq!(fake.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn auto_selection_pins_priority_keys_for_any_seed() {
    let keys = ["alpha", "beta", "gamma", "delta", "wikipedia", "grokipedia"];
    let mut registry = Registry::new();
    for key in keys {
        registry.register(key, Fake::new(key, key).factory());
    }
    registry.set_priority_keys(Category::Text, ["wikipedia", "grokipedia"]);
    let cache = BackendCache::default();
    let selector = Selector::new(&registry, &cache);

    for seed in 0..32 {
        let mut rng = StdRng::seed_from_u64(seed);
        let resolved = assert_ok!(selector.resolve(Category::Text, &BackendSpec::from("auto"), &mut rng));
        let names: Vec<_> = resolved.iter().map(|f| f.descriptor().name).collect();
        assert_eq!(&names[..2], ["wikipedia", "grokipedia"], "seed {seed}");
        assert_eq!(names.len(), keys.len());
    }
}

#[tokio::test]
async fn unknown_backend_falls_back_to_auto() {
    let fake = Fake::new("real", "real").returns(&[("Rust", "https://rust.example/")]);
    let search = session(&[&fake]);

    let results = assert_ok!(
        search
            .text(SearchRequest::new("rust").with_backend("does-not-exist"))
            .await
    );
    assert_eq!(results.len(), 1);
    assert_eq!(fake.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn shared_provider_is_queried_once() {
    let first = Fake::new("first", "shared").returns(&[("a", "https://a.example/")]);
    let second = Fake::new("second", "shared").returns(&[("b", "https://b.example/")]);
    let search = session(&[&first, &second]);

    let results = assert_ok!(
        search
            .text(SearchRequest::new("q").with_backend("first,second").with_max_results(None))
            .await
    );
    assert_eq!(results.len(), 1);
    let calls = first.calls.load(Ordering::SeqCst) + second.calls.load(Ordering::SeqCst);
    assert_eq!(calls, 1);
}

#[tokio::test]
async fn results_are_truncated_after_ranking() {
    let one = Fake::new("one", "p1").returns(&[
        ("unrelated", "https://1.example/"),
        ("about rust", "https://2.example/"),
    ]);
    let two = Fake::new("two", "p2").returns(&[
        ("rust book", "https://3.example/"),
        ("nothing", "https://4.example/"),
        ("other", "https://5.example/"),
    ]);
    let search = session(&[&one, &two]);

    let results = assert_ok!(search.text(SearchRequest::new("rust").with_max_results(2)).await);
    assert_eq!(results.len(), 2);
    let top = results[0].get_str("title").unwrap_or_default();
    assert!(top.contains("rust"), "top result {top:?} should mention the query");
}

#[tokio::test]
async fn duplicates_across_backends_are_dropped() {
    let one = Fake::new("one", "p1").returns(&[("first", "https://same.example/")]);
    let two = Fake::new("two", "p2").delay(30).returns(&[
        ("second", "https://same.example/"),
        ("third", "https://other.example/"),
    ]);
    let search = session(&[&one, &two]);

    let results = assert_ok!(search.text(SearchRequest::new("q").with_max_results(None)).await);
    let hrefs: Vec<_> = results.iter().filter_map(|r| r.get_str("href")).collect();
    assert_eq!(hrefs, ["https://same.example/", "https://other.example/"]);
    assert_eq!(results[0].get_str("title"), Some("first"));
}

#[tokio::test]
async fn fast_result_does_not_wait_for_slow_failure() {
    let fast = Fake::new("fast", "fast").delay(10).returns(&[("a", "a")]);
    let slow = Fake::new("slow", "slow")
        .delay(4000)
        .fails(|| BackendError::Status(500));
    let search = session(&[&fast, &slow]).with_timeout(Duration::from_secs(5));

    let started = Instant::now();
    let results = assert_ok!(search.text(SearchRequest::new("q").with_max_results(1)).await);

    assert!(started.elapsed() < Duration::from_secs(1), "took {:?}", started.elapsed());
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].get_str("href"), Some("a"));
}

#[tokio::test]
async fn hanging_backend_costs_one_timeout() {
    let hanging = Fake::new("hanging", "hanging")
        .delay(30_000)
        .returns(&[("late", "https://late.example/")]);
    let search = session(&[&hanging]).with_timeout(Duration::from_millis(500));

    let started = Instant::now();
    let err = assert_err!(search.text(SearchRequest::new("q")).await);

    assert!(started.elapsed() < Duration::from_millis(750), "took {:?}", started.elapsed());
    assert_eq!(err.to_string(), "No results found.");
    assert_eq!(hanging.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn partial_failure_still_succeeds() {
    let broken = Fake::new("broken", "p1")
        .priority(2)
        .fails(|| BackendError::Parse("bad html".into()));
    let working = Fake::new("working", "p2").delay(20).returns(&[("ok", "https://ok.example/")]);
    let search = session(&[&broken, &working]);

    let results = assert_ok!(search.text(SearchRequest::new("q")).await);
    assert_eq!(results.len(), 1);
    assert_eq!(broken.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn total_failure_maps_last_error() {
    let timed_out = Fake::new("t", "t").fails(|| BackendError::Timeout("operation timed out".into()));
    let err = assert_err!(session(&[&timed_out]).text(SearchRequest::new("q")).await);
    assert!(matches!(err, SearchError::Timeout(_)), "{err:?}");

    let limited = Fake::new("r", "r").fails(|| BackendError::Ratelimit("429".into()));
    let err = assert_err!(session(&[&limited]).text(SearchRequest::new("q")).await);
    assert!(matches!(err, SearchError::Ratelimit(_)), "{err:?}");

    let broken = Fake::new("b", "b").fails(|| BackendError::Status(503));
    let err = assert_err!(session(&[&broken]).text(SearchRequest::new("q")).await);
    match err {
        SearchError::Search { source, .. } => {
            assert!(matches!(source, Some(BackendError::Status(503))));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let empty = Fake::new("e", "e");
    let err = assert_err!(session(&[&empty]).text(SearchRequest::new("q")).await);
    assert_eq!(err.to_string(), "No results found.");
}

#[tokio::test]
async fn concurrent_calls_construct_backend_once() {
    let built = Arc::new(AtomicUsize::new(0));
    let counter = built.clone();
    let fake = Fake::new("counted", "counted").returns(&[("c", "https://c.example/")]);
    let template = fake.clone();
    let registry = Registry::new().with(
        "counted",
        BackendFactory::new(fake.descriptor, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(template.clone())
        }),
    );
    let search = Search::with_registry(&Settings::default(), registry);

    let (a, b) = tokio::join!(
        search.text(SearchRequest::new("q")),
        search.text(SearchRequest::new("q"))
    );
    assert_ok!(a);
    assert_ok!(b);
    assert_eq!(built.load(Ordering::SeqCst), 1);
    assert_eq!(fake.calls.load(Ordering::SeqCst), 2);
}
