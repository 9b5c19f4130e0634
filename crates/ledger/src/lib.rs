//! Off-chain sats ledger.
//!
//! Balances live in SQLite and every mutation goes through one of four
//! operations: [`transfer`], [`admin_credit`], [`credit_from_deposit`] and
//! [`debit_for_withdrawal`]. The settlement operations are idempotent per
//! external payment reference, so the reconciler can safely retry them.
//!
//! [`transfer`]: Ledger::transfer
//! [`admin_credit`]: Ledger::admin_credit
//! [`credit_from_deposit`]: Ledger::credit_from_deposit
//! [`debit_for_withdrawal`]: Ledger::debit_for_withdrawal

use sea_orm::{
    Condition, ConnectionTrait, DbErr, QueryFilter, QueryOrder, QuerySelect, Statement,
    TransactionTrait, prelude::*,
};
use uuid::Uuid;

pub use deposits::DepositIntent;
pub use entries::{EntryKind, LedgerEntry};
pub use error::LedgerError;

pub mod accounts;
pub mod deposits;
pub mod entries;
mod error;
mod store;

type ResultLedger<T> = Result<T, LedgerError>;

/// Outcome of an idempotent settlement mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreditOutcome {
    /// The reference was fresh and the balance changed.
    Applied(Uuid),
    /// The reference was already consumed; nothing changed.
    AlreadyApplied,
}

#[derive(Clone, Debug)]
pub struct Ledger {
    database: DatabaseConnection,
}

impl Ledger {
    /// Returns a builder for `Ledger`.
    pub fn builder() -> LedgerBuilder {
        LedgerBuilder::default()
    }

    /// Current balance in sats; 0 for accounts never referenced before.
    pub async fn balance(&self, account_id: &str) -> ResultLedger<i64> {
        Ok(store::balance(&self.database, account_id).await?)
    }

    /// Moves `amount_sats` from one account to another.
    ///
    /// Both halves commit in a single database transaction: no reader can
    /// observe the debit without the credit. Racing transfers from the same
    /// account cannot overdraft it; the loser sees `InsufficientFunds`.
    pub async fn transfer(
        &self,
        from_id: &str,
        to_id: &str,
        amount_sats: i64,
    ) -> ResultLedger<Uuid> {
        if amount_sats <= 0 {
            return Err(LedgerError::InvalidAmount(
                "amount_sats must be > 0".to_string(),
            ));
        }
        if from_id == to_id {
            return Err(LedgerError::SelfTransfer(from_id.to_string()));
        }

        let txn = self.database.begin().await?;
        store::ensure(&txn, from_id).await?;
        store::ensure(&txn, to_id).await?;

        if !store::try_adjust(&txn, from_id, -amount_sats).await? {
            return Err(LedgerError::InsufficientFunds(from_id.to_string()));
        }
        // A positive delta cannot trip the non-negativity guard.
        store::try_adjust(&txn, to_id, amount_sats).await?;

        let entry = LedgerEntry::new(
            EntryKind::Transfer,
            amount_sats,
            from_id.to_string(),
            Some(to_id.to_string()),
            None,
        )?;
        entries::ActiveModel::from(&entry).insert(&txn).await?;
        txn.commit().await?;
        Ok(entry.id)
    }

    /// Credits an account unconditionally.
    ///
    /// The ledger does not check who `actor` is; authorizing the
    /// administrator is the calling layer's responsibility.
    pub async fn admin_credit(
        &self,
        to_id: &str,
        amount_sats: i64,
        actor: &str,
    ) -> ResultLedger<Uuid> {
        if amount_sats <= 0 {
            return Err(LedgerError::InvalidAmount(
                "amount_sats must be > 0".to_string(),
            ));
        }

        let txn = self.database.begin().await?;
        store::ensure(&txn, to_id).await?;
        store::try_adjust(&txn, to_id, amount_sats).await?;

        let entry = LedgerEntry::new(
            EntryKind::AdminCredit,
            amount_sats,
            to_id.to_string(),
            Some(actor.to_string()),
            None,
        )?;
        entries::ActiveModel::from(&entry).insert(&txn).await?;
        txn.commit().await?;
        Ok(entry.id)
    }

    /// Credits an account for a settled incoming payment, at most once per
    /// `reference`. Replaying a consumed reference is a successful no-op, so
    /// the reconciler can retry freely.
    pub async fn credit_from_deposit(
        &self,
        to_id: &str,
        amount_sats: i64,
        reference: &str,
    ) -> ResultLedger<CreditOutcome> {
        if amount_sats <= 0 {
            return Err(LedgerError::InvalidAmount(
                "amount_sats must be > 0".to_string(),
            ));
        }

        let txn = self.database.begin().await?;
        if entry_for_reference(&txn, reference).await?.is_some() {
            return Ok(CreditOutcome::AlreadyApplied);
        }

        store::ensure(&txn, to_id).await?;
        store::try_adjust(&txn, to_id, amount_sats).await?;

        let entry = LedgerEntry::new(
            EntryKind::DepositCredit,
            amount_sats,
            to_id.to_string(),
            None,
            Some(reference.to_string()),
        )?;
        entries::ActiveModel::from(&entry).insert(&txn).await?;
        txn.commit().await?;
        Ok(CreditOutcome::Applied(entry.id))
    }

    /// Debits an account for a confirmed outgoing payout.
    ///
    /// Must only be called after the external payout has been confirmed
    /// successful. A replayed `reference` returns the already-recorded entry
    /// without touching the balance.
    pub async fn debit_for_withdrawal(
        &self,
        from_id: &str,
        amount_sats: i64,
        reference: &str,
    ) -> ResultLedger<Uuid> {
        if amount_sats <= 0 {
            return Err(LedgerError::InvalidAmount(
                "amount_sats must be > 0".to_string(),
            ));
        }

        let txn = self.database.begin().await?;
        if let Some(existing) = entry_for_reference(&txn, reference).await? {
            let entry = LedgerEntry::try_from(existing)?;
            return Ok(entry.id);
        }

        store::ensure(&txn, from_id).await?;
        if !store::try_adjust(&txn, from_id, -amount_sats).await? {
            return Err(LedgerError::InsufficientFunds(from_id.to_string()));
        }

        let entry = LedgerEntry::new(
            EntryKind::WithdrawalDebit,
            amount_sats,
            from_id.to_string(),
            None,
            Some(reference.to_string()),
        )?;
        entries::ActiveModel::from(&entry).insert(&txn).await?;
        txn.commit().await?;
        Ok(entry.id)
    }

    /// Records which account an invoice belongs to, keyed by the processor's
    /// payment reference. Called in the same flow that created the invoice.
    pub async fn record_deposit_intent(
        &self,
        reference: &str,
        account_id: &str,
        amount_sats: i64,
    ) -> ResultLedger<()> {
        if amount_sats <= 0 {
            return Err(LedgerError::InvalidAmount(
                "amount_sats must be > 0".to_string(),
            ));
        }
        let intent = DepositIntent::new(reference, account_id, amount_sats);
        deposits::ActiveModel::from(&intent).insert(&self.database).await?;
        Ok(())
    }

    /// Looks up the destination mapping for an incoming payment reference.
    pub async fn deposit_intent(&self, reference: &str) -> ResultLedger<Option<DepositIntent>> {
        let model = deposits::Entity::find_by_id(reference)
            .one(&self.database)
            .await?;
        Ok(model.map(DepositIntent::from))
    }

    /// Whether a settlement reference has already been applied to the ledger.
    pub async fn is_reference_consumed(&self, reference: &str) -> ResultLedger<bool> {
        Ok(entry_for_reference(&self.database, reference)
            .await?
            .is_some())
    }

    /// Lists the most recent entries touching an account, either side.
    pub async fn recent_entries(
        &self,
        account_id: &str,
        limit: u64,
    ) -> ResultLedger<Vec<LedgerEntry>> {
        let models = entries::Entity::find()
            .filter(
                Condition::any()
                    .add(entries::Column::AccountId.eq(account_id))
                    .add(entries::Column::Counterparty.eq(account_id)),
            )
            .order_by_desc(entries::Column::CreatedAt)
            .limit(limit)
            .all(&self.database)
            .await?;

        models.into_iter().map(LedgerEntry::try_from).collect()
    }

    /// Sum of all account balances, in sats.
    ///
    /// This is what the external wallet must cover; the reconciler compares
    /// it against the processor balance.
    pub async fn total_liabilities(&self) -> ResultLedger<i64> {
        let stmt = Statement::from_string(
            self.database.get_database_backend(),
            "SELECT COALESCE(SUM(balance), 0) AS sum FROM accounts".to_string(),
        );
        let row = self.database.query_one(stmt).await?;
        Ok(row.and_then(|r| r.try_get("", "sum").ok()).unwrap_or(0))
    }
}

async fn entry_for_reference<C: ConnectionTrait>(
    conn: &C,
    reference: &str,
) -> Result<Option<entries::Model>, DbErr> {
    entries::Entity::find()
        .filter(entries::Column::ExternalReference.eq(reference))
        .one(conn)
        .await
}

/// The builder for `Ledger`.
#[derive(Default)]
pub struct LedgerBuilder {
    database: DatabaseConnection,
}

impl LedgerBuilder {
    /// Sets the backing database.
    pub fn database(mut self, db: DatabaseConnection) -> LedgerBuilder {
        self.database = db;
        self
    }

    /// Builds the `Ledger`.
    pub fn build(self) -> Ledger {
        Ledger {
            database: self.database,
        }
    }
}
