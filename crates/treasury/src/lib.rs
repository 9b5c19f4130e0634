//! The treasury is what the chat command layer talks to.
//!
//! It owns the two flows that cross the ledger/processor boundary, deposits
//! (invoice out, credit on settlement) and withdrawals (payout out, debit on
//! confirmation), plus passthroughs for the purely local operations. The
//! ordering inside [`Treasury::withdraw`] is load-bearing: the ledger is
//! debited only after the external payout is confirmed, and a payout that
//! cannot be attributed either way is surfaced for manual reconciliation.

use ledger::Ledger;
use settlement::{SettlementApi, looks_like_bolt11};
use uuid::Uuid;

pub use error::TreasuryError;
pub use reconciler::{CycleReport, DEFAULT_POLL_INTERVAL, Reconciler};

mod error;
mod reconciler;

pub const DEFAULT_WITHDRAW_FEE_SATS: i64 = 4;

type ResultTreasury<T> = Result<T, TreasuryError>;

/// A created deposit invoice, ready to hand to the depositor. The reference
/// is already mapped to the destination account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DepositRequest {
    pub reference: String,
    pub payment_request: String,
}

/// A completed withdrawal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WithdrawReceipt {
    pub reference: String,
    pub amount_sats: i64,
    pub fee_sats: i64,
    pub remaining_sats: i64,
}

/// Processor balance versus what the ledger owes its users.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoverageReport {
    pub processor_sats: i64,
    pub ledger_sats: i64,
}

impl CoverageReport {
    pub fn shortfall_sats(&self) -> i64 {
        (self.ledger_sats - self.processor_sats).max(0)
    }

    pub fn is_covered(&self) -> bool {
        self.shortfall_sats() == 0
    }
}

pub struct Treasury<S> {
    ledger: Ledger,
    settlement: S,
    withdraw_fee_sats: i64,
}

impl<S: SettlementApi> Treasury<S> {
    pub fn new(ledger: Ledger, settlement: S, withdraw_fee_sats: i64) -> Self {
        Self {
            ledger,
            settlement,
            withdraw_fee_sats,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Current balance in sats.
    pub async fn balance(&self, account_id: &str) -> ResultTreasury<i64> {
        Ok(self.ledger.balance(account_id).await?)
    }

    /// Peer-to-peer transfer between two local accounts.
    pub async fn transfer(
        &self,
        from_id: &str,
        to_id: &str,
        amount_sats: i64,
    ) -> ResultTreasury<Uuid> {
        Ok(self.ledger.transfer(from_id, to_id, amount_sats).await?)
    }

    /// Administrative credit. The command layer must have authorized `actor`
    /// as an administrator before calling this.
    pub async fn admin_credit(
        &self,
        to_id: &str,
        amount_sats: i64,
        actor: &str,
    ) -> ResultTreasury<Uuid> {
        Ok(self.ledger.admin_credit(to_id, amount_sats, actor).await?)
    }

    /// Creates a deposit invoice for `account_id` and records the
    /// reference-to-account mapping before returning, so the reconciler can
    /// attribute the settlement without inspecting memo text.
    pub async fn request_deposit(
        &self,
        account_id: &str,
        amount_sats: i64,
        memo: &str,
    ) -> ResultTreasury<DepositRequest> {
        if amount_sats <= 0 {
            return Err(TreasuryError::InvalidAmount(
                "amount_sats must be > 0".to_string(),
            ));
        }

        let receipt = self.settlement.create_invoice(amount_sats, memo).await?;
        self.ledger
            .record_deposit_intent(&receipt.reference, account_id, amount_sats)
            .await?;

        tracing::info!(
            account = account_id,
            reference = %receipt.reference,
            amount_sats,
            "deposit invoice created"
        );
        Ok(DepositRequest {
            reference: receipt.reference,
            payment_request: receipt.payment_request,
        })
    }

    /// Pays out a user-supplied invoice and debits the account for the
    /// invoice amount plus the fixed withdrawal fee.
    ///
    /// No ledger mutation happens unless the payout is confirmed. The
    /// converse failure (payout settled, debit failed) is the one state this
    /// system cannot repair on its own; it is logged at error level and
    /// returned as [`TreasuryError::DebitAfterPayoutFailed`].
    pub async fn withdraw(
        &self,
        account_id: &str,
        payment_request: &str,
    ) -> ResultTreasury<WithdrawReceipt> {
        if !looks_like_bolt11(payment_request) {
            return Err(TreasuryError::InvalidInvoiceFormat);
        }

        let decoded = self.settlement.decode_invoice(payment_request).await?;
        let amount_sats = decoded
            .amount_sats
            .ok_or(TreasuryError::AmountUnavailable)?;
        let required_sats = amount_sats + self.withdraw_fee_sats;

        let available_sats = self.ledger.balance(account_id).await?;
        if available_sats < required_sats {
            return Err(TreasuryError::InsufficientFunds {
                required_sats,
                available_sats,
            });
        }

        // No ledger lock is held across the payout; the debit below
        // re-checks funds atomically.
        let payout = self.settlement.pay_invoice(payment_request).await?;

        match self
            .ledger
            .debit_for_withdrawal(account_id, required_sats, &payout.reference)
            .await
        {
            Ok(_) => {}
            Err(err) => {
                tracing::error!(
                    account = account_id,
                    reference = %payout.reference,
                    required_sats,
                    error = %err,
                    "payout settled but ledger debit failed; manual reconciliation required"
                );
                return Err(TreasuryError::DebitAfterPayoutFailed {
                    reference: payout.reference,
                    source: err,
                });
            }
        }

        let remaining_sats = self.ledger.balance(account_id).await?;
        tracing::info!(
            account = account_id,
            reference = %payout.reference,
            amount_sats,
            fee_sats = self.withdraw_fee_sats,
            "withdrawal settled"
        );
        Ok(WithdrawReceipt {
            reference: payout.reference,
            amount_sats,
            fee_sats: self.withdraw_fee_sats,
            remaining_sats,
        })
    }

    /// Compares the processor wallet balance against total ledger
    /// liabilities.
    pub async fn coverage(&self) -> ResultTreasury<CoverageReport> {
        let processor_sats = self.settlement.processor_balance().await?;
        let ledger_sats = self.ledger.total_liabilities().await?;
        Ok(CoverageReport {
            processor_sats,
            ledger_sats,
        })
    }
}
