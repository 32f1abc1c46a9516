//! Integration tests for the search surface with the hashing embedder

use approx::assert_relative_eq;

use episodic::embeddings::{EmbeddingProvider, HashingEmbedder};
use episodic::index::{FlatIndex, VectorIndex};
use episodic::search::{similarity_from_distance, RetrievalConfig};
use episodic::storage::{Exchange, MemoryExchangeStore, NewExchange};
use episodic::{
    ConceptSearchOptions, EmbeddingError, SearchEngine, SearchError, SearchMode, SearchOptions,
};

const DIM: usize = 384;

const CORPUS: &[(&str, &str)] = &[
    ("2025-01-05T10:00:00.000Z", "designing the Employee class with a salary method"),
    ("2025-01-06T10:00:00.000Z", "unit testing the parser with property tests"),
    ("2025-01-20T10:00:00.000Z", "refactoring Employee class inheritance"),
    ("2025-02-02T10:00:00.000Z", "writing code for the deployment script"),
    ("2025-02-03T10:00:00.000Z", "testing code paths in the deployment script"),
    ("2025-02-14T10:00:00.000Z", "quantum physics black hole thermodynamics"),
];

fn corpus() -> (HashingEmbedder, FlatIndex, MemoryExchangeStore) {
    let embedder = HashingEmbedder::new(DIM);
    let index = FlatIndex::new(DIM);
    let store = MemoryExchangeStore::new();

    for (i, (timestamp, text)) in CORPUS.iter().enumerate() {
        let embedding = embedder.embed_passage(text).unwrap();
        let key = store.insert(NewExchange {
            id: format!("ex-{}", i),
            conversation_id: format!("conv-{}", i / 2),
            timestamp: timestamp.to_string(),
            text: text.to_string(),
            embedding: embedding.clone(),
        });
        index.add(key, &embedding).unwrap();
    }

    (embedder, index, store)
}

fn top_similarity_for(engine: &SearchEngine<'_>, query: &str, id: &str) -> f32 {
    let options = SearchOptions {
        limit: CORPUS.len(),
        ..Default::default()
    };
    engine
        .search_conversations(query, &options)
        .unwrap()
        .into_iter()
        .find(|r| r.exchange.id == id)
        .map_or(0.0, |r| r.similarity)
}

#[test]
fn test_similarity_matches_index_distance() {
    let (embedder, index, store) = corpus();
    let engine = SearchEngine::new(&embedder, &index, &store, RetrievalConfig::default());

    let query = "Employee class design";
    let results = engine
        .search_conversations(query, &SearchOptions::default())
        .unwrap();
    assert!(!results.is_empty());

    let raw = index.knn(&embedder.embed_query(query).unwrap(), CORPUS.len()).unwrap();
    for result in &results {
        let neighbor = raw.iter().find(|n| n.key == result.exchange.key).unwrap();
        let expected = (1.0 - neighbor.distance * neighbor.distance / 2.0).max(0.0);
        assert_relative_eq!(result.similarity, expected, epsilon = 1e-5);
        assert!((0.0..=1.0).contains(&result.similarity));
    }
}

#[test]
fn test_scores_stay_in_unit_interval() {
    for d in [0.0f32, 0.3, 1.0, 1.414, 2.0, 3.5] {
        let s = similarity_from_distance(d);
        assert!((0.0..=1.0).contains(&s), "distance {} gave {}", d, s);
    }
    assert_relative_eq!(similarity_from_distance(0.0), 1.0);
    assert_relative_eq!(similarity_from_distance(2f32.sqrt()), 0.0, epsilon = 1e-6);
    assert_eq!(similarity_from_distance(2.0), 0.0);
}

#[test]
fn test_related_query_scores_higher_than_unrelated() {
    let (embedder, index, store) = corpus();
    let engine = SearchEngine::new(&embedder, &index, &store, RetrievalConfig::default());

    let related = top_similarity_for(&engine, "Employee class design", "ex-0");
    let unrelated = top_similarity_for(&engine, "medieval castle architecture", "ex-0");
    assert!(
        related > unrelated,
        "related {} should beat unrelated {}",
        related,
        unrelated
    );
}

#[test]
fn test_nearest_exchange_ranks_first() {
    let (embedder, index, store) = corpus();
    let engine = SearchEngine::new(&embedder, &index, &store, RetrievalConfig::default());

    let results = engine
        .search_conversations("refactoring Employee class inheritance", &SearchOptions::default())
        .unwrap();
    assert_eq!(results[0].exchange.id, "ex-2");
    assert_relative_eq!(results[0].similarity, 1.0, epsilon = 1e-5);
    assert!(results.windows(2).all(|w| w[0].similarity >= w[1].similarity));
}

#[test]
fn test_keyword_and_hybrid_modes() {
    let (embedder, index, store) = corpus();
    let engine = SearchEngine::new(&embedder, &index, &store, RetrievalConfig::default());

    let keyword = SearchOptions {
        mode: SearchMode::Keyword,
        ..Default::default()
    };
    let results = engine
        .search_conversations("deployment script", &keyword)
        .unwrap();
    let ids: Vec<&str> = results.iter().map(|r| r.exchange.id.as_str()).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&"ex-3") && ids.contains(&"ex-4"));

    let hybrid = SearchOptions {
        mode: SearchMode::Hybrid,
        limit: 3,
        ..Default::default()
    };
    let results = engine
        .search_conversations("deployment script", &hybrid)
        .unwrap();
    assert_eq!(results.len(), 3);
    assert!(results.windows(2).all(|w| w[0].similarity >= w[1].similarity));
}

#[test]
fn test_multi_concept_alignment_and_mean() {
    let (embedder, index, store) = corpus();
    let engine = SearchEngine::new(&embedder, &index, &store, RetrievalConfig::default());

    let concepts = vec!["Employee class".to_string(), "deployment script".to_string()];
    let results = engine
        .search_multiple_concepts(&concepts, &ConceptSearchOptions::default())
        .unwrap();

    assert!(!results.is_empty());
    for result in &results {
        assert_eq!(result.concept_similarities.len(), 2);
        assert!(result
            .concept_similarities
            .iter()
            .all(|s| (0.0..=1.0).contains(s)));
        let mean = result.concept_similarities.iter().sum::<f32>() / 2.0;
        assert_relative_eq!(result.average_similarity, mean, epsilon = 1e-6);
    }
    assert!(results
        .windows(2)
        .all(|w| w[0].average_similarity >= w[1].average_similarity));
}

#[test]
fn test_multi_concept_respects_time_filter() {
    let (embedder, index, store) = corpus();
    let engine = SearchEngine::new(&embedder, &index, &store, RetrievalConfig::default());

    let concepts = vec!["Employee class".to_string(), "testing".to_string()];
    let options = ConceptSearchOptions {
        limit: 10,
        after: Some("2025-02-01".to_string()),
        before: None,
    };
    let results = engine.search_multiple_concepts(&concepts, &options).unwrap();

    assert!(!results.is_empty());
    assert!(results
        .iter()
        .all(|r| r.exchange.timestamp.as_str() >= "2025-02-01"));
}

#[test]
fn test_empty_index_returns_nothing() {
    let embedder = HashingEmbedder::new(DIM);
    let index = FlatIndex::new(DIM);
    let store = MemoryExchangeStore::new();
    let engine = SearchEngine::new(&embedder, &index, &store, RetrievalConfig::default());

    let options = SearchOptions {
        after: Some("2025-01-01".to_string()),
        ..Default::default()
    };
    assert!(engine.search_conversations("anything", &options).unwrap().is_empty());

    let concepts = vec!["anything".to_string()];
    assert!(engine
        .search_multiple_concepts(&concepts, &ConceptSearchOptions::default())
        .unwrap()
        .is_empty());
}

#[test]
fn test_missing_exchange_is_consistency_fault() {
    let (embedder, index, store) = corpus();

    // Indexed but never stored
    let orphan = embedder.embed_passage("orphaned vector").unwrap();
    index.add(999, &orphan).unwrap();

    let engine = SearchEngine::new(&embedder, &index, &store, RetrievalConfig::default());
    let result = engine.search_conversations("orphaned vector", &SearchOptions::default());
    assert!(matches!(result, Err(SearchError::StoreConsistency { key: 999 })));
}

#[test]
fn test_stored_exchange_outside_index_is_not_a_fault() {
    let (embedder, index, store) = corpus();
    store.insert_with_key(Exchange {
        key: 500,
        id: "unindexed".to_string(),
        conversation_id: "conv-x".to_string(),
        timestamp: "2025-02-20T00:00:00.000Z".to_string(),
        text: "not in the vector index".to_string(),
        embedding: vec![0.0; DIM],
    });

    let engine = SearchEngine::new(&embedder, &index, &store, RetrievalConfig::default());
    let results = engine
        .search_conversations("Employee class", &SearchOptions::default())
        .unwrap();
    assert!(results.iter().all(|r| r.exchange.id != "unindexed"));
}

struct FailingEmbedder;

impl EmbeddingProvider for FailingEmbedder {
    fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Err(EmbeddingError::Provider("model offline".to_string()))
    }

    fn dimension(&self) -> usize {
        DIM
    }

    fn model_name(&self) -> &str {
        "failing"
    }
}

#[test]
fn test_embedder_failure_propagates() {
    let (_, index, store) = corpus();
    let engine = SearchEngine::new(&FailingEmbedder, &index, &store, RetrievalConfig::default());

    let result = engine.search_conversations("Employee class", &SearchOptions::default());
    assert!(matches!(
        result,
        Err(SearchError::Embedding(EmbeddingError::Provider(_)))
    ));

    let concepts = vec!["a".to_string(), "b".to_string()];
    let result = engine.search_multiple_concepts(&concepts, &ConceptSearchOptions::default());
    assert!(matches!(result, Err(SearchError::Embedding(_))));
}
