//! End-to-end tests for the triple store.
//!
//! Each test goes through the public `Graph` API only: add, filter, delete.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rdf_trie::{Graph, GraphConfig, HdtGraph, Term, Triple};

const EX: &str = "http://example.org/";
const FOAF: &str = "http://xmlns.com/foaf/0.1/";

fn ex(local: &str) -> Term {
    Term::resource(format!("{EX}{local}"))
}

fn foaf(local: &str) -> Term {
    Term::resource(format!("{FOAF}{local}"))
}

async fn objects(graph: &HdtGraph, s: &Term, p: &Term) -> HashSet<Term> {
    graph
        .filter(s, p, &Term::var("x"))
        .await
        .try_collect()
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.object)
        .collect()
}

// ============================================================================
// 1. alice knows bob and carol; forget bob
// ============================================================================

#[tokio::test]
async fn test_alice_bob_carol() {
    let graph = HdtGraph::new();
    graph.add(Triple::new(ex("alice"), foaf("knows"), ex("bob"))).await.unwrap();
    graph.add(Triple::new(ex("alice"), foaf("knows"), ex("carol"))).await.unwrap();

    assert_eq!(
        objects(&graph, &ex("alice"), &foaf("knows")).await,
        HashSet::from([ex("bob"), ex("carol")])
    );

    let removed = graph.delete(&ex("alice"), &foaf("knows"), &ex("bob")).await.unwrap();
    assert_eq!(removed, 1);

    assert_eq!(
        objects(&graph, &ex("alice"), &foaf("knows")).await,
        HashSet::from([ex("carol")])
    );
}

// ============================================================================
// 2. Delete completeness
// ============================================================================

#[tokio::test]
async fn test_delete_leaves_unrelated_triples() {
    let graph = HdtGraph::new();
    let kept = [
        Triple::new(ex("alice"), foaf("knows"), ex("carol")),
        Triple::new(ex("bob"), foaf("knows"), ex("bob")),
        Triple::new(ex("alice"), foaf("name"), Term::literal("Alice")),
    ];
    let gone = Triple::new(ex("alice"), foaf("knows"), ex("bob"));
    graph.add_all(kept.to_vec()).await.unwrap();
    graph.add(gone.clone()).await.unwrap();

    graph.delete(&gone.subject, &gone.predicate, &gone.object).await.unwrap();

    let [s, p, o] = gone.terms();
    assert!(graph.filter(s, p, o).await.try_collect().await.unwrap().is_empty());
    for triple in &kept {
        let [s, p, o] = triple.terms();
        assert_eq!(graph.filter(s, p, o).await.try_collect().await.unwrap(), vec![triple.clone()]);
    }
}

// ============================================================================
// 3. Blank-node delete breadth
// ============================================================================

#[tokio::test]
async fn test_blank_node_delete_removes_whole_prefix() {
    let graph = HdtGraph::new();
    for o in ["bob", "carol", "dave"] {
        graph.add(Triple::new(ex("alice"), foaf("knows"), ex(o))).await.unwrap();
    }
    graph.add(Triple::new(ex("alice"), foaf("name"), Term::literal("Alice"))).await.unwrap();
    graph.add(Triple::new(ex("bob"), foaf("knows"), ex("carol"))).await.unwrap();

    // Object position: everything under (alice, knows).
    let removed = graph.delete(&ex("alice"), &foaf("knows"), &Term::blank("any")).await.unwrap();
    assert_eq!(removed, 3);
    assert!(objects(&graph, &ex("alice"), &foaf("knows")).await.is_empty());
    assert_eq!(graph.len().await, 2);

    // Predicate position: whatever follows is ignored.
    let removed = graph.delete(&ex("bob"), &Term::blank("p"), &ex("nobody")).await.unwrap();
    assert_eq!(removed, 1);

    let left = graph.triples().await.try_collect().await.unwrap();
    assert_eq!(left, vec![Triple::new(ex("alice"), foaf("name"), Term::literal("Alice"))]);
}

// ============================================================================
// 4. Variable fan-out completeness
// ============================================================================

fn arb_triple() -> impl Strategy<Value = (u8, u8, u8)> {
    (0u8..6, 0u8..4, 0u8..8)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_filter_all_returns_live_set(
        adds in prop::collection::vec(arb_triple(), 0..60),
        deletes in prop::collection::vec(arb_triple(), 0..20),
    ) {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(4)
            .enable_all()
            .build()
            .unwrap();

        let to_triple = |(s, p, o): (u8, u8, u8)| {
            Triple::new(ex(&format!("s{s}")), ex(&format!("p{p}")), ex(&format!("o{o}")))
        };

        let (got, expected) = runtime.block_on(async {
            let graph = HdtGraph::with_config(GraphConfig::new().with_buffer_size(2)).unwrap();
            let mut expected: HashSet<Triple> = HashSet::new();
            for t in adds.iter().copied().map(to_triple) {
                graph.add(t.clone()).await.unwrap();
                expected.insert(t);
            }
            for t in deletes.iter().copied().map(to_triple) {
                graph.delete(&t.subject, &t.predicate, &t.object).await.unwrap();
                expected.remove(&t);
            }
            let got = graph.triples().await.try_collect().await.unwrap();
            (got, expected)
        });

        let unique: HashSet<Triple> = got.iter().cloned().collect();
        prop_assert_eq!(unique.len(), got.len(), "duplicates in traversal");
        prop_assert_eq!(unique, expected);
    }
}

// ============================================================================
// 5. Liveness: every drained or dropped stream finishes
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_streams_close_under_pruning() {
    let graph = Arc::new(HdtGraph::with_config(GraphConfig::new().with_buffer_size(1)).unwrap());
    for s in 0..20 {
        for p in 0..3 {
            graph
                .add(Triple::new(ex(&format!("s{s}")), ex(&format!("p{p}")), ex(&format!("o{}", s % 4))))
                .await
                .unwrap();
        }
    }

    let patterns = [
        (Term::var("s"), Term::var("p"), Term::var("o")),
        (Term::var("s"), ex("p1"), Term::var("o")),
        (Term::var("s"), ex("p9"), Term::var("o")),
        (Term::var("s"), Term::var("p"), ex("o2")),
        (ex("s3"), Term::blank("b"), Term::var("o")),
    ];
    let expected = [60, 20, 0, 15, 3];

    let drained = async {
        for ((s, p, o), want) in patterns.iter().zip(expected) {
            let got = graph.filter(s, p, o).await.try_collect().await.unwrap();
            assert_eq!(got.len(), want, "pattern {s} {p} {o}");
        }
    };
    tokio::time::timeout(Duration::from_secs(10), drained).await.unwrap();

    // An abandoned stream must not keep writers out.
    let mut partial = graph.triples().await;
    assert!(partial.next().await.is_some());
    drop(partial);
    let write = graph.add(Triple::new(ex("late"), ex("p0"), ex("o0")));
    tokio::time::timeout(Duration::from_secs(10), write).await.unwrap().unwrap();
    assert_eq!(graph.len().await, 61);
}

// ============================================================================
// 6. Reinsertion after delete
// ============================================================================

#[tokio::test]
async fn test_reinsert_after_delete() {
    let graph = HdtGraph::new();
    let t = Triple::new(ex("alice"), foaf("knows"), ex("bob"));
    graph.add(t.clone()).await.unwrap();
    graph.delete(&t.subject, &t.predicate, &t.object).await.unwrap();
    assert!(graph.is_empty().await);

    graph.add(t.clone()).await.unwrap();
    assert_eq!(graph.triples().await.try_collect().await.unwrap(), vec![t]);
}
