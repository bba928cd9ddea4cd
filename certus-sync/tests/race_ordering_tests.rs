//! Ordering tests for dual reads driven through the entity sync policy.
//!
//! Time is paused, so every scripted delay is exact and each test pins one
//! interleaving of the query and update paths.

use std::sync::Arc;

use certus_core::{Account, LedgerId, TrustLevel, TrustTagged};
use certus_sync::{Delivery, EntitySync, ReconcilingStore};
use certus_test_utils::{RecordingNotifier, Script, ScriptedFetcher, StaticIdentity};

struct Harness {
    fetcher: Arc<ScriptedFetcher<LedgerId, u64>>,
    notifier: Arc<RecordingNotifier>,
    sync: EntitySync<LedgerId, u64>,
}

fn harness() -> Harness {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let sync = EntitySync::new(
        "balance",
        fetcher.clone(),
        Arc::new(StaticIdentity::signed_in("alice")),
        ReconcilingStore::new("balances"),
        notifier.clone(),
    );
    Harness {
        fetcher,
        notifier,
        sync,
    }
}

fn icp() -> LedgerId {
    LedgerId::from("icp")
}

// ============================================================================
// AUTHORITY WINS: both orders x both outcomes
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum Outcome {
    Ok,
    Err,
}

fn script(outcome: Outcome, delay_ms: u64, value: u64) -> Script<u64> {
    match outcome {
        Outcome::Ok => Script::ok(delay_ms, value),
        Outcome::Err => Script::fail(delay_ms, "replica unavailable"),
    }
}

async fn run_combination(query: Outcome, query_ms: u64, update_ms: u64) {
    let h = harness();
    h.fetcher.respond(
        icp(),
        script(query, query_ms, 10),
        script(Outcome::Ok, update_ms, 12),
    );

    h.sync.load(&icp()).await.unwrap().settled().await;

    let entry = h.sync.store().get(&icp()).unwrap();
    assert_eq!(entry.trust, TrustLevel::Certified, "query {query:?} at {query_ms}ms");
    assert_eq!(entry.data, 12);
    assert!(h.notifier.errors().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_certified_success_wins_every_ordering() {
    for query in [Outcome::Ok, Outcome::Err] {
        // query settles first
        run_combination(query, 1, 50).await;
        // update settles first
        run_combination(query, 50, 1).await;
    }
}

#[tokio::test(start_paused = true)]
async fn test_certified_success_wins_over_pending_query() {
    let h = harness();
    h.fetcher
        .respond(icp(), Script::ok(10_000, 10), Script::ok(5, 12));

    let handle = h.sync.load(&icp()).await.unwrap();
    // The update answered while the query is still in flight.
    assert_eq!(h.sync.store().value(&icp()), Some(12));
    assert_eq!(h.sync.store().trust(&icp()), Some(TrustLevel::Certified));

    handle.settled().await;
    assert_eq!(h.sync.store().value(&icp()), Some(12));
}

// ============================================================================
// SCENARIOS
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_query_then_update_loads_twice() {
    let h = harness();
    h.fetcher.respond(icp(), Script::ok(1, 10), Script::ok(50, 12));

    let handle = h.sync.load(&icp()).await.unwrap();
    assert_eq!(h.sync.store().value(&icp()), Some(10));
    assert_eq!(h.sync.store().trust(&icp()), Some(TrustLevel::Uncertified));

    let settlement = handle.settled().await;
    assert_eq!(settlement.path(TrustLevel::Uncertified), Some(&Delivery::Loaded));
    assert_eq!(settlement.path(TrustLevel::Certified), Some(&Delivery::Loaded));
    assert_eq!(h.sync.store().value(&icp()), Some(12));
    assert_eq!(h.sync.store().trust(&icp()), Some(TrustLevel::Certified));
}

#[tokio::test(start_paused = true)]
async fn test_update_then_late_query_loads_once() {
    let h = harness();
    h.fetcher.respond(icp(), Script::ok(50, 10), Script::ok(5, 12));

    let mut changes = h.sync.store().subscribe();
    let settlement = h.sync.load(&icp()).await.unwrap().settled().await;

    assert_eq!(settlement.path(TrustLevel::Uncertified), Some(&Delivery::Suppressed));
    assert_eq!(h.sync.store().value(&icp()), Some(12));

    // Exactly one mutation reached subscribers.
    assert!(changes.has_changed().unwrap());
    changes.borrow_and_update();
    assert!(!changes.has_changed().unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_update_failure_then_late_query_leaves_no_entry() {
    let h = harness();
    h.fetcher
        .respond(icp(), Script::ok(50, 10), Script::fail(5, "certificate rejected"));

    let settlement = h.sync.load(&icp()).await.unwrap().settled().await;

    assert!(matches!(
        settlement.path(TrustLevel::Certified),
        Some(Delivery::Failed { reason }) if reason.contains("certificate rejected")
    ));
    assert_eq!(settlement.path(TrustLevel::Uncertified), Some(&Delivery::Suppressed));
    assert!(!h.sync.store().contains(&icp()));
    assert_eq!(h.notifier.errors().len(), 1);
}

// ============================================================================
// SUPPRESSION AND PURGE
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_late_query_error_raises_nothing() {
    let h = harness();
    h.fetcher
        .respond(icp(), Script::fail(50, "timeout"), Script::ok(5, 12));

    let settlement = h.sync.load(&icp()).await.unwrap().settled().await;

    assert_eq!(settlement.path(TrustLevel::Uncertified), Some(&Delivery::Suppressed));
    assert!(h.notifier.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_certified_failure_purges_previously_certified_entry() {
    let h = harness();
    h.fetcher.respond(icp(), Script::ok(1, 10), Script::ok(2, 12));
    h.sync.load(&icp()).await.unwrap().settled().await;
    assert_eq!(h.sync.store().trust(&icp()), Some(TrustLevel::Certified));

    h.fetcher
        .respond(icp(), Script::fail(50, "timeout"), Script::fail(5, "rejected"));
    h.sync.load(&icp()).await.unwrap().settled().await;

    assert!(!h.sync.store().contains(&icp()));
}

#[tokio::test(start_paused = true)]
async fn test_uncertified_failure_keeps_stored_data() {
    let h = harness();
    h.sync
        .store()
        .upsert(icp(), TrustTagged::certified(7));
    h.fetcher
        .respond(icp(), Script::fail(1, "replica down"), Script::ok(50, 8));

    let handle = h.sync.load(&icp()).await.unwrap();
    assert_eq!(h.sync.store().value(&icp()), Some(7));
    assert!(h.notifier.is_empty());

    handle.settled().await;
    assert_eq!(h.sync.store().value(&icp()), Some(8));
}

#[tokio::test(start_paused = true)]
async fn test_signed_out_session_issues_no_reads() {
    let h = harness();
    let sync = EntitySync::new(
        "balance",
        h.fetcher.clone(),
        Arc::new(StaticIdentity::signed_out()),
        ReconcilingStore::<LedgerId, u64>::new("balances"),
        h.notifier.clone(),
    );

    assert!(sync.load(&icp()).await.is_err());
    assert_eq!(h.fetcher.call_count(), 0);
    assert!(sync.store().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_both_paths_receive_resolved_identity() {
    let h = harness();
    h.fetcher.respond(icp(), Script::ok(1, 10), Script::ok(2, 12));

    h.sync.load(&icp()).await.unwrap().settled().await;

    let calls = h.fetcher.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls
        .iter()
        .all(|call| call.identity.principal.as_str() == "alice"));
}

#[tokio::test(start_paused = true)]
async fn test_list_read_is_order_independent() {
    async fn run(query_ms: u64, update_ms: u64) -> Option<Vec<Account>> {
        let fetcher: Arc<ScriptedFetcher<LedgerId, Vec<Account>>> =
            Arc::new(ScriptedFetcher::new());
        let sync: EntitySync<LedgerId, Vec<Account>> = EntitySync::new(
            "accounts",
            fetcher.clone(),
            Arc::new(StaticIdentity::signed_in("alice")),
            ReconcilingStore::new("accounts"),
            Arc::new(RecordingNotifier::new()),
        );
        sync.store().upsert(
            icp(),
            TrustTagged::certified(vec![Account::main("a", 1), Account::main("b", 2)]),
        );
        fetcher.respond(
            icp(),
            Script::ok(query_ms, vec![Account::main("a", 5)]),
            Script::ok(update_ms, vec![Account::main("a", 6)]),
        );

        sync.load(&icp()).await.unwrap().settled().await;
        assert_eq!(sync.store().trust(&icp()), Some(TrustLevel::Certified));
        sync.store().value(&icp())
    }

    let expected = Some(vec![Account::main("a", 6), Account::main("b", 2)]);
    assert_eq!(run(1, 50).await, expected);
    assert_eq!(run(50, 1).await, expected);
}
