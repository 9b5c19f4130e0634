use ledger::{CreditOutcome, EntryKind, Ledger, LedgerError};
use migration::MigratorTrait;
use sea_orm::Database;
use uuid::Uuid;

async fn ledger_with_db() -> Ledger {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Ledger::builder().database(db).build()
}

async fn ledger_with_file_db() -> (Ledger, String, std::path::PathBuf) {
    let root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_dbs");
    std::fs::create_dir_all(&root).unwrap();

    let path = root.join(format!("ledger_{}.db", Uuid::new_v4()));
    let url = format!("sqlite:{}?mode=rwc", path.display());

    let db = Database::connect(&url).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();

    (Ledger::builder().database(db).build(), url, path)
}

#[tokio::test]
async fn transfer_conserves_total() {
    let ledger = ledger_with_db().await;
    ledger.admin_credit("alice", 1000, "admin").await.unwrap();

    ledger.transfer("alice", "bob", 300).await.unwrap();

    assert_eq!(ledger.balance("alice").await.unwrap(), 700);
    assert_eq!(ledger.balance("bob").await.unwrap(), 300);
    assert_eq!(ledger.total_liabilities().await.unwrap(), 1000);
}

#[tokio::test]
async fn transfer_with_insufficient_funds_changes_nothing() {
    let ledger = ledger_with_db().await;
    ledger.admin_credit("alice", 100, "admin").await.unwrap();

    let err = ledger.transfer("alice", "bob", 200).await.unwrap_err();
    assert_eq!(err, LedgerError::InsufficientFunds("alice".to_string()));

    assert_eq!(ledger.balance("alice").await.unwrap(), 100);
    assert_eq!(ledger.balance("bob").await.unwrap(), 0);
}

#[tokio::test]
async fn self_transfer_is_rejected() {
    let ledger = ledger_with_db().await;
    ledger.admin_credit("alice", 100, "admin").await.unwrap();

    let err = ledger.transfer("alice", "alice", 10).await.unwrap_err();
    assert_eq!(err, LedgerError::SelfTransfer("alice".to_string()));
    assert_eq!(ledger.balance("alice").await.unwrap(), 100);
}

#[tokio::test]
async fn transfer_rejects_non_positive_amounts() {
    let ledger = ledger_with_db().await;

    for amount in [0, -5] {
        let err = ledger.transfer("alice", "bob", amount).await.unwrap_err();
        assert_eq!(
            err,
            LedgerError::InvalidAmount("amount_sats must be > 0".to_string())
        );
    }
}

#[tokio::test]
async fn unknown_account_reads_zero() {
    let ledger = ledger_with_db().await;
    assert_eq!(ledger.balance("nobody").await.unwrap(), 0);
}

#[tokio::test]
async fn deposit_credit_is_idempotent_per_reference() {
    let ledger = ledger_with_db().await;

    let first = ledger
        .credit_from_deposit("carol", 500, "hash-1")
        .await
        .unwrap();
    assert!(matches!(first, CreditOutcome::Applied(_)));

    let second = ledger
        .credit_from_deposit("carol", 500, "hash-1")
        .await
        .unwrap();
    assert_eq!(second, CreditOutcome::AlreadyApplied);

    assert_eq!(ledger.balance("carol").await.unwrap(), 500);
    assert!(ledger.is_reference_consumed("hash-1").await.unwrap());
}

#[tokio::test]
async fn withdrawal_debit_consumes_reference_once() {
    let ledger = ledger_with_db().await;
    ledger.admin_credit("dave", 1000, "admin").await.unwrap();

    let entry_id = ledger
        .debit_for_withdrawal("dave", 400, "payout-1")
        .await
        .unwrap();
    assert_eq!(ledger.balance("dave").await.unwrap(), 600);
    assert!(ledger.is_reference_consumed("payout-1").await.unwrap());

    // Replaying the same reference returns the recorded entry untouched.
    let replayed = ledger
        .debit_for_withdrawal("dave", 400, "payout-1")
        .await
        .unwrap();
    assert_eq!(replayed, entry_id);
    assert_eq!(ledger.balance("dave").await.unwrap(), 600);
}

#[tokio::test]
async fn failed_withdrawal_debit_does_not_consume_reference() {
    let ledger = ledger_with_db().await;
    ledger.admin_credit("dave", 100, "admin").await.unwrap();

    let err = ledger
        .debit_for_withdrawal("dave", 200, "payout-2")
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::InsufficientFunds("dave".to_string()));

    assert_eq!(ledger.balance("dave").await.unwrap(), 100);
    assert!(!ledger.is_reference_consumed("payout-2").await.unwrap());
}

#[tokio::test]
async fn deposit_intent_roundtrips() {
    let ledger = ledger_with_db().await;

    ledger
        .record_deposit_intent("hash-9", "erin", 2500)
        .await
        .unwrap();

    let intent = ledger.deposit_intent("hash-9").await.unwrap().unwrap();
    assert_eq!(intent.account_id, "erin");
    assert_eq!(intent.amount_sats, 2500);

    assert!(ledger.deposit_intent("hash-unknown").await.unwrap().is_none());
}

#[tokio::test]
async fn recent_entries_include_both_sides() {
    let ledger = ledger_with_db().await;
    ledger.admin_credit("alice", 1000, "admin").await.unwrap();
    ledger.transfer("alice", "bob", 250).await.unwrap();
    ledger.admin_credit("bob", 50, "admin").await.unwrap();

    let entries = ledger.recent_entries("bob", 10).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().any(|e| e.kind == EntryKind::Transfer));
    assert!(entries.iter().any(|e| e.kind == EntryKind::AdminCredit));

    let entries = ledger.recent_entries("alice", 10).await.unwrap();
    assert_eq!(entries.len(), 2);
}

#[tokio::test]
async fn concurrent_transfers_never_overdraft() {
    let (ledger, _url, path) = ledger_with_file_db().await;
    ledger.admin_credit("alice", 50, "admin").await.unwrap();

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..100 {
        let ledger = ledger.clone();
        tasks.spawn(async move { ledger.transfer("alice", "bob", 1).await });
    }

    let mut succeeded = 0;
    let mut insufficient = 0;
    while let Some(result) = tasks.join_next().await {
        match result.unwrap() {
            Ok(_) => succeeded += 1,
            Err(LedgerError::InsufficientFunds(_)) => insufficient += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(succeeded, 50);
    assert_eq!(insufficient, 50);
    assert_eq!(ledger.balance("alice").await.unwrap(), 0);
    assert_eq!(ledger.balance("bob").await.unwrap(), 50);

    drop(ledger);
    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn restart_reads_same_balances() {
    let (ledger, url, path) = ledger_with_file_db().await;
    ledger.admin_credit("alice", 1000, "admin").await.unwrap();
    ledger
        .credit_from_deposit("alice", 200, "hash-r1")
        .await
        .unwrap();
    drop(ledger);

    let db = Database::connect(&url).await.unwrap();
    let ledger = Ledger::builder().database(db).build();

    assert_eq!(ledger.balance("alice").await.unwrap(), 1200);
    assert!(ledger.is_reference_consumed("hash-r1").await.unwrap());

    drop(ledger);
    let _ = std::fs::remove_file(path);
}
