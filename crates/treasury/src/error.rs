//! Errors for the withdrawal coordinator and the deposit reconciler.
//!
//! Propagation policy: the validation variants are returned to the caller and
//! never retried; `Processor` from read paths is retried on the next
//! reconciler cycle; `Processor`/`Ambiguous` from a payout and
//! `DebitAfterPayoutFailed` are never auto-retried and require an operator.

use ledger::LedgerError;
use settlement::SettlementError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TreasuryError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("not a recognizable payment request")]
    InvalidInvoiceFormat,
    #[error("invoice does not specify an amount")]
    AmountUnavailable,
    #[error("insufficient funds: need {required_sats} sats, have {available_sats}")]
    InsufficientFunds {
        required_sats: i64,
        available_sats: i64,
    },
    #[error("processor error: {0}")]
    Processor(String),
    #[error("payout outcome unknown, manual reconciliation required: {0}")]
    Ambiguous(String),
    /// Money left the external wallet but the local debit did not commit.
    /// Alerting condition: must be reconciled by hand, never retried
    /// automatically (a retry could pay the invoice twice).
    #[error("payout {reference} settled but the ledger debit failed: {source}")]
    DebitAfterPayoutFailed {
        reference: String,
        #[source]
        source: LedgerError,
    },
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl From<SettlementError> for TreasuryError {
    fn from(err: SettlementError) -> Self {
        match err {
            SettlementError::InvalidInvoiceFormat => Self::InvalidInvoiceFormat,
            SettlementError::Ambiguous(detail) => Self::Ambiguous(detail),
            other => Self::Processor(other.to_string()),
        }
    }
}
