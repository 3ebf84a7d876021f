//! Contract Test: Idempotent Reconciliation
//!
//! Constraints verified:
//! - Diffing the same snapshots twice yields identical changesets
//! - Input order does not affect grouping, diffing or planning
//! - After a successful apply, re-planning yields no corrections
//! - Re-running a reconciliation that is already in sync never mutates the zone

mod common;

use common::*;
use zonesync_core::{Capabilities, Reconciler, Record, RecordData, compute_corrections, diff, group};

fn records() -> Vec<Record> {
    vec![
        Record::new(
            "example.com",
            "www.example.com",
            300,
            RecordData::A {
                address: [1, 2, 3, 4].into(),
            },
        ),
        Record::new(
            "example.com",
            "www.example.com",
            300,
            RecordData::A {
                address: [5, 6, 7, 8].into(),
            },
        ),
        Record::new(
            "example.com",
            "example.com",
            300,
            RecordData::Txt {
                strings: vec!["v=spf1 -all".to_string()],
            },
        ),
    ]
}

#[test]
fn diff_is_deterministic() {
    let desired = group(records());
    let mut reversed = records();
    reversed.reverse();

    let observed = group(vec![records()[0].clone()]);

    let first = diff(&desired, &observed);
    let second = diff(&group(reversed), &observed);
    assert_eq!(first, second);

    let messages: Vec<String> = first.iter().map(|(_, c)| c.message()).collect();
    let again: Vec<String> = diff(&desired, &observed)
        .iter()
        .map(|(_, c)| c.message())
        .collect();
    assert_eq!(messages, again);
}

#[test]
fn equal_snapshots_plan_nothing() {
    let mut shuffled = records();
    shuffled.rotate_left(1);

    let corrections =
        compute_corrections("example.com", records(), shuffled, &Capabilities::default()).unwrap();
    assert!(corrections.is_empty());
}

#[tokio::test]
async fn apply_then_replan_is_empty() {
    let provider = RecordingProvider::new();
    seed_cname(provider.memory(), "www.example.com.", "old.example.com", 300).await;
    seed_mx(provider.memory(), "example.com.", 20, "mx1.example.com", 300).await;
    seed_a(provider.memory(), "stale.example.com.", "9.9.9.9", 300).await;

    let (reconciler, _events) = Reconciler::new(
        Box::new(RecordingProvider::sharing_counters_with(&provider)),
        engine_config(),
    )
    .unwrap();

    let domain = example_com(vec![
        a("www", [1, 2, 3, 4]),
        a("www", [5, 6, 7, 8]),
        mx("@", 10, "mx1.example.com."),
        mx("@", 20, "mx2.example.com."),
        cname("docs", "www.example.com."),
    ]);

    let report = reconciler.reconcile(&domain).await.unwrap();
    assert!(report.is_success(), "failures: {:?}", report.failures);
    let mutations = provider.mutation_count();

    assert!(reconciler.plan(&domain).await.unwrap().is_empty());

    let second = reconciler.reconcile(&domain).await.unwrap();
    assert_eq!(second.planned, 0);
    assert_eq!(provider.mutation_count(), mutations);
}
