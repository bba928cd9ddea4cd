//! End-to-end wallet session tests against a scripted ledger.

use std::collections::HashSet;
use std::io::Write;
use std::sync::Arc;

use certus_client::{ClientConfig, Toasts, WalletSession};
use certus_core::{
    Account, AccountKey, LedgerId, Neuron, NeuronState, Principal, ProjectId, SyncConfig,
    TransactionPage, TrustLevel,
};
use certus_sync::NoticeLevel;
use certus_test_utils::{transaction, Script, ScriptedLedger, StaticIdentity};

fn session(ledger: Arc<ScriptedLedger>) -> WalletSession {
    WalletSession::new(
        ledger,
        Arc::new(StaticIdentity::signed_in("alice")),
        Arc::new(Toasts::new(10)),
        SyncConfig::default(),
    )
}

fn key(account: &str) -> AccountKey {
    AccountKey::new("icp", account)
}

#[tokio::test(start_paused = true)]
async fn test_accounts_merge_optimistic_then_certified() {
    let ledger = Arc::new(ScriptedLedger::new());
    let icp = LedgerId::from("icp");
    ledger.accounts.respond(
        icp.clone(),
        Script::ok(1, vec![Account::main("a", 1), Account::subaccount("b", "Savings", 2)]),
        Script::ok(40, vec![Account::main("a", 5), Account::subaccount("b", "Savings", 2)]),
    );
    let session = session(ledger);

    let handle = session.sync_accounts(&icp).await.unwrap();
    let optimistic = session.stores().accounts.get(&icp).unwrap();
    assert_eq!(optimistic.trust, TrustLevel::Uncertified);

    handle.settled().await;
    let entry = session.stores().accounts.get(&icp).unwrap();
    assert_eq!(entry.trust, TrustLevel::Certified);
    assert_eq!(entry.data[0], Account::main("a", 5));
    assert_eq!(entry.data.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_balance_fan_out_reports_once() {
    let ledger = Arc::new(ScriptedLedger::new());
    ledger
        .balances
        .respond(key("main"), Script::ok(1, 10), Script::ok(5, 12));
    ledger
        .balances
        .respond(key("savings"), Script::ok(1, 20), Script::fail(5, "rejected"));
    ledger
        .balances
        .respond(key("spare"), Script::ok(1, 30), Script::ok(5, 33));
    let session = session(ledger);

    let keys = vec![key("main"), key("savings"), key("spare")];
    let report = session.sync_balances(&keys, &HashSet::new()).await.unwrap();

    assert_eq!(report.succeeded, vec![key("main"), key("spare")]);
    assert_eq!(session.stores().balances.value(&key("main")), Some(12));
    assert_eq!(session.stores().balances.value(&key("spare")), Some(33));
    assert!(!session.stores().balances.contains(&key("savings")));

    let toasts = session.toasts().visible();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].level, NoticeLevel::Error);
}

#[tokio::test(start_paused = true)]
async fn test_fee_fan_out_skips_excluded_projects() {
    let ledger = Arc::new(ScriptedLedger::new());
    for project in ["p1", "p2", "p3"] {
        ledger
            .fees
            .respond(ProjectId::from(project), Script::ok(1, 10_000), Script::ok(2, 10_000));
    }
    let session = session(ledger.clone());

    let projects: Vec<ProjectId> = ["p1", "p2", "p3"].into_iter().map(ProjectId::from).collect();
    let excluded: HashSet<ProjectId> = [ProjectId::from("p1")].into_iter().collect();
    let report = session.sync_fees(&projects, &excluded).await.unwrap();

    assert!(report.is_clean());
    assert_eq!(report.skipped, vec![ProjectId::from("p1")]);
    assert_eq!(session.stores().fees.len(), 2);
    assert!(session.toasts().is_empty());
    assert!(ledger.fees.calls().iter().all(|call| call.identity.anonymous));
}

#[tokio::test(start_paused = true)]
async fn test_transactions_and_neurons_load() {
    let ledger = Arc::new(ScriptedLedger::new());
    let page = TransactionPage::new(vec![transaction(3), transaction(7)], false);
    ledger
        .transactions
        .respond(key("main"), Script::ok(1, page.clone()), Script::ok(2, page));
    let alice = Principal::from("alice");
    let neuron = Neuron {
        neuron_id: 1,
        stake_e8s: 100_000_000,
        dissolve_delay_seconds: 15_778_800,
        state: NeuronState::Locked,
    };
    ledger.neurons.respond(
        alice.clone(),
        Script::ok(1, vec![neuron.clone()]),
        Script::ok(2, vec![neuron.clone()]),
    );
    let session = session(ledger);

    session.sync_transactions(&key("main")).await.unwrap().settled().await;
    session.sync_neurons(&alice).await.unwrap().settled().await;

    let stored = session.stores().transactions.value(&key("main")).unwrap();
    assert_eq!(stored.next_cursor(), Some(3));
    assert_eq!(session.stores().neurons.value(&alice), Some(vec![neuron]));
}

#[tokio::test(start_paused = true)]
async fn test_sign_out_clears_everything() {
    let ledger = Arc::new(ScriptedLedger::new());
    ledger
        .balances
        .respond(key("main"), Script::ok(1, 10), Script::fail(2, "rejected"));
    let session = session(ledger);

    session
        .sync_balances(&[key("main")], &HashSet::new())
        .await
        .unwrap();
    session.stores().balances.upsert(key("other"), certus_core::TrustTagged::certified(1));
    assert!(!session.toasts().is_empty());

    session.sign_out();
    assert!(session.stores().is_empty());
    assert!(session.toasts().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_session_from_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[sync]\nforce_strategy = \"query\"\n\n[telemetry]\nfilter = \"info\"\njson = true\n\n[notifications]\nmax_retained = 3"
    )
    .unwrap();
    let config = ClientConfig::from_path(file.path()).unwrap();

    let ledger = Arc::new(ScriptedLedger::new());
    let icp = LedgerId::from("icp");
    ledger
        .accounts
        .respond(icp.clone(), Script::ok(1, vec![Account::main("a", 1)]), Script::ok(2, vec![]));
    let session = WalletSession::from_config(
        &config,
        ledger.clone(),
        Arc::new(StaticIdentity::signed_in("alice")),
    );

    session.sync_accounts(&icp).await.unwrap().settled().await;

    // Forced query strategy: no certified read was issued.
    assert_eq!(ledger.accounts.call_count(), 1);
    assert_eq!(session.stores().accounts.trust(&icp), Some(TrustLevel::Uncertified));
}
