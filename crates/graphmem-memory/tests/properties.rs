use graphmem_memory::{
    AnswerResponse, Embedder, FactStore, HashEmbedder, HybridRanker, MemoryConfig, RankerConfig,
    cosine_similarity, recency,
};
use proptest::prelude::*;

fn words() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z]{1,8}", 0..8).prop_map(|w| w.join(" "))
}

proptest! {
    #[test]
    fn cosine_is_symmetric(a in words(), b in words()) {
        let e = HashEmbedder::default();
        let (va, vb) = (e.embed(&a), e.embed(&b));
        prop_assert_eq!(cosine_similarity(&va, &vb), cosine_similarity(&vb, &va));
    }

    #[test]
    fn self_similarity_is_one_unless_zero(text in words()) {
        let v = HashEmbedder::default().embed(&text);
        let s = cosine_similarity(&v, &v);
        if text.trim().is_empty() {
            prop_assert_eq!(s, 0.0);
        } else {
            prop_assert!((s - 1.0).abs() < 1e-5, "self similarity {}", s);
        }
    }

    #[test]
    fn embed_is_bit_identical(text in ".{0,120}") {
        let e = HashEmbedder::default();
        let a: Vec<u32> = e.embed(&text).iter().map(|x| x.to_bits()).collect();
        let b: Vec<u32> = e.embed(&text).iter().map(|x| x.to_bits()).collect();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn recency_is_non_increasing(ts in -1e9f64..1e9, d1 in 0f64..1e8, d2 in 0f64..1e8) {
        let (near, far) = if d1 <= d2 { (d1, d2) } else { (d2, d1) };
        prop_assert!(recency(ts, ts + near) >= recency(ts, ts + far));
        prop_assert_eq!(recency(ts, ts), 1.0);
    }

    #[test]
    fn neighbor_lists_hold_their_invariants(
        texts in prop::collection::vec(words(), 1..20),
        tau in -0.2f32..0.9,
        k in 1usize..6,
    ) {
        let config = MemoryConfig { tau, neighbor_k: k, ..MemoryConfig::default() };
        let mut store = FactStore::new(config).unwrap();
        for (i, t) in texts.iter().enumerate() {
            store.add(t, i as f64);
        }
        for (i, fact) in store.facts().iter().enumerate() {
            prop_assert!(fact.neighbors.len() <= k);
            for n in &fact.neighbors {
                prop_assert!(n.index < i);
                prop_assert!(n.similarity >= tau);
            }
            for pair in fact.neighbors.windows(2) {
                prop_assert!(pair[0].similarity >= pair[1].similarity);
            }
        }
    }

    #[test]
    fn retrieval_returns_at_most_two_k(
        texts in prop::collection::vec(words(), 0..15),
        query in words(),
        k in 0usize..5,
    ) {
        let mut store = FactStore::new(MemoryConfig::default()).unwrap();
        for t in &texts {
            store.add(t, 0.0);
        }
        let hits = store.retrieve(&query, 0.0, k);
        prop_assert!(hits.len() <= 2 * k);
        for pair in hits.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn guard_never_surfaces_zero_overlap_when_overlap_exists(
        extra in prop::collection::vec(words(), 0..8),
    ) {
        let mut store = FactStore::new(MemoryConfig::default()).unwrap();
        store.add("Q: Jak zmienić PIN?\nA: W aplikacji.", 0.0);
        for t in &extra {
            store.add(t, 0.0);
        }
        let ranker = HybridRanker::new(&store, RankerConfig::default()).unwrap();
        for c in ranker.retrieve("pin karty", 0.0, 10) {
            prop_assert!(c.lex > 0.0, "zero-overlap candidate {}", c.index);
        }
    }
}

// ── scenarios ────────────────────────────────────────────────────────────────

#[test]
fn distinct_facts_under_strict_tau_have_no_neighbors() {
    let config = MemoryConfig {
        tau: 0.99,
        neighbor_k: 5,
        ..MemoryConfig::default()
    };
    let mut store = FactStore::new(config).unwrap();
    for text in ["A: alpha", "A: beta", "A: gamma"] {
        store.add(text, 0.0);
    }
    assert!(store.facts().iter().all(|f| f.neighbors.is_empty()));

    let hits = store.retrieve("alpha", 0.0, 1);
    assert_eq!(hits[0].index, 0);
}

#[test]
fn empty_store_answers_with_no_answer_sentinel() {
    let store = FactStore::new(MemoryConfig::default()).unwrap();
    let ranker = HybridRanker::new(&store, RankerConfig::default()).unwrap();
    match ranker.answer("Jak zmienić PIN?", 0.0, 5) {
        AnswerResponse::NoAnswer { answer, candidates } => {
            assert_eq!(answer, "No answer in memory.");
            assert!(candidates.is_empty());
        }
        other => panic!("unexpected response: {other:?}"),
    }
}

#[test]
fn exact_question_wins_over_similar_question() {
    let mut store = FactStore::new(MemoryConfig::default()).unwrap();
    store.add(
        "[CATEGORY] card\nQ: Jak zmienić PIN do karty?\nA: PIN zmienisz w aplikacji.",
        0.0,
    );
    store.add(
        "[CATEGORY] card\nQ: Jak zamówić nową kartę?\nA: Nową kartę zamówisz w aplikacji.",
        0.0,
    );
    let ranker = HybridRanker::new(&store, RankerConfig::default()).unwrap();
    let response = ranker.answer("  jak zmienić pin do karty?  ", 0.0, 5);
    assert!(response.is_confident());
    assert_eq!(response.answer(), "PIN zmienisz w aplikacji.");
}

#[test]
fn k_zero_is_empty_not_an_error() {
    let mut store = FactStore::new(MemoryConfig::default()).unwrap();
    store.add("A: something", 0.0);
    assert!(store.retrieve("something", 0.0, 0).is_empty());
    let ranker = HybridRanker::new(&store, RankerConfig::default()).unwrap();
    assert!(ranker.retrieve("something", 0.0, 0).is_empty());
}
