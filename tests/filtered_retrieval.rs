//! Integration tests for time-filtered retrieval
//!
//! Corpus: 180 exchanges on 2025-01-10 and 114 on 2025-03-20, laid out on
//! two arcs of the unit circle so one date is strictly nearer to any query
//! aimed at it than the other date.

use parking_lot::Mutex;

use episodic::embeddings::HashingEmbedder;
use episodic::index::{FlatIndex, Neighbor, VectorIndex};
use episodic::search::{
    Candidate, FilteredRetriever, RetrievalConfig, SearchEngine, SearchOptions, TimeFilter,
};
use episodic::storage::{ExchangeStore, MemoryExchangeStore, NewExchange};
use episodic::IndexError;

const DIM: usize = 4;
const JANUARY: &str = "2025-01-10T12:00:00.000Z";
const MARCH: &str = "2025-03-20T12:00:00.000Z";
const JANUARY_COUNT: usize = 180;
const MARCH_COUNT: usize = 114;

fn on_arc(theta: f32) -> Vec<f32> {
    vec![theta.cos(), theta.sin(), 0.0, 0.0]
}

/// January near angle 0, March near angle 1 rad
fn two_date_corpus() -> (FlatIndex, MemoryExchangeStore) {
    let index = FlatIndex::new(DIM);
    let store = MemoryExchangeStore::new();

    let groups = [(JANUARY, JANUARY_COUNT, 0.0f32), (MARCH, MARCH_COUNT, 1.0f32)];
    for (timestamp, count, base) in groups {
        for i in 0..count {
            let embedding = on_arc(base + 0.001 * i as f32);
            let key = store.insert(NewExchange {
                id: format!("{}-{}", &timestamp[..10], i),
                conversation_id: format!("conv-{}", i % 7),
                timestamp: timestamp.to_string(),
                text: format!("exchange {} on {}", i, &timestamp[..10]),
                embedding: embedding.clone(),
            });
            index.add(key, &embedding).unwrap();
        }
    }

    (index, store)
}

/// Delegates to an inner index and records every requested k
struct RecordingIndex<'a> {
    inner: &'a FlatIndex,
    requests: Mutex<Vec<usize>>,
}

impl<'a> RecordingIndex<'a> {
    fn new(inner: &'a FlatIndex) -> Self {
        Self {
            inner,
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<usize> {
        self.requests.lock().clone()
    }
}

impl VectorIndex for RecordingIndex<'_> {
    fn knn(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, IndexError> {
        self.requests.lock().push(k);
        self.inner.knn(query, k)
    }

    fn total_stored(&self) -> Result<usize, IndexError> {
        self.inner.total_stored()
    }
}

fn retrieve(
    index: &dyn VectorIndex,
    store: &dyn ExchangeStore,
    query: &[f32],
    after: Option<&str>,
    before: Option<&str>,
    limit: usize,
) -> Vec<Candidate> {
    let config = RetrievalConfig::default();
    let retriever = FilteredRetriever::new(index, store, &config);
    let filter = TimeFilter::new(
        after.map(str::to_string),
        before.map(str::to_string),
    );
    retriever.retrieve(query, &filter, limit).unwrap()
}

#[test]
fn test_after_filter_fills_limit_when_nearest_are_older() {
    let (index, store) = two_date_corpus();
    let recording = RecordingIndex::new(&index);

    // Aimed at January; only March passes the filter
    let results = retrieve(&recording, &store, &on_arc(0.0), Some("2025-03-01"), None, 10);

    assert_eq!(results.len(), 10);
    assert!(results.iter().all(|c| c.exchange.timestamp.as_str() >= "2025-03-01"));
    // 40 -> 80 -> 160 all January; 294 covers the index
    assert_eq!(recording.requests(), vec![40, 80, 160, 294]);
}

#[test]
fn test_before_filter_fills_limit_when_nearest_are_newer() {
    let (index, store) = two_date_corpus();

    // Aimed at March; only January passes the filter
    let results = retrieve(&index, &store, &on_arc(1.0), None, Some("2025-01-31"), 10);

    assert_eq!(results.len(), 10);
    assert!(results.iter().all(|c| c.exchange.timestamp.as_str() <= "2025-01-31"));

    // January exchanges nearest to angle 1 are the ones with the largest theta
    assert_eq!(results[0].exchange.id, "2025-01-10-179");
    assert!(results.windows(2).all(|w| w[0].distance <= w[1].distance));
}

#[test]
fn test_range_filter() {
    let (index, store) = two_date_corpus();

    let results = retrieve(
        &index,
        &store,
        &on_arc(1.05),
        Some("2025-01-01"),
        Some("2025-01-31"),
        10,
    );

    assert_eq!(results.len(), 10);
    assert!(results.iter().all(|c| c.exchange.timestamp.starts_with("2025-01-10")));
}

#[test]
fn test_sparse_window_is_exhausted() {
    let (index, store) = two_date_corpus();

    // Three extra exchanges on their own date, far from the query
    for i in 0..3 {
        let embedding = on_arc(2.5 + 0.01 * i as f32);
        let key = store.insert(NewExchange {
            id: format!("june-{}", i),
            conversation_id: "conv-june".to_string(),
            timestamp: "2025-06-01T09:00:00.000Z".to_string(),
            text: "june exchange".to_string(),
            embedding: embedding.clone(),
        });
        index.add(key, &embedding).unwrap();
    }

    let recording = RecordingIndex::new(&index);
    let results = retrieve(&recording, &store, &on_arc(0.0), Some("2025-06-01"), None, 10);

    assert_eq!(results.len(), 3);
    assert_eq!(recording.requests().last().copied(), Some(297));

    // Empty window: fully scanned, nothing returned
    let results = retrieve(&index, &store, &on_arc(0.0), Some("2026-01-01"), None, 10);
    assert!(results.is_empty());
}

#[test]
fn test_no_filter_fetches_exactly_limit() {
    let (index, store) = two_date_corpus();
    let recording = RecordingIndex::new(&index);

    let results = retrieve(&recording, &store, &on_arc(0.5), None, None, 5);

    assert!(!results.is_empty() && results.len() <= 5);
    assert_eq!(recording.requests(), vec![5]);
}

#[test]
fn test_growth_is_bounded_by_rounds() {
    let (index, store) = two_date_corpus();
    let recording = RecordingIndex::new(&index);

    let config = RetrievalConfig {
        oversample_factor: 1,
        growth_factor: 2,
        max_growth_rounds: 2,
        ..Default::default()
    };
    let retriever = FilteredRetriever::new(&recording, &store, &config);
    let filter = TimeFilter::new(Some("2025-03-01".to_string()), None);
    let results = retriever.retrieve(&on_arc(0.0), &filter, 10).unwrap();

    assert_eq!(results.len(), 10);
    // 10 -> 20, then the round limit jumps straight to the whole index
    assert_eq!(recording.requests(), vec![10, 20, 294]);
}

#[test]
fn test_engine_applies_filter_in_vector_mode() {
    let (index, store) = two_date_corpus();
    // The hashing embedder is only used for the query; point it anywhere
    let embedder = HashingEmbedder::new(DIM);
    let engine = SearchEngine::new(&embedder, &index, &store, RetrievalConfig::default());

    let options = SearchOptions {
        limit: 10,
        after: Some("2025-03-01".to_string()),
        ..Default::default()
    };
    let results = engine.search_conversations("any query at all", &options).unwrap();

    assert_eq!(results.len(), 10);
    assert!(results
        .iter()
        .all(|r| r.exchange.timestamp.as_str() >= "2025-03-01"));
    assert!(results.windows(2).all(|w| w[0].similarity >= w[1].similarity));
}
