//! The module contains the errors the ledger can throw.
//!
//! Validation errors ([`InvalidAmount`], [`SelfTransfer`],
//! [`InsufficientFunds`]) are returned synchronously to the caller and are
//! never retried. [`Storage`] means the durable backing failed mid-operation;
//! callers must not assume the mutation committed.
//!
//! [`InvalidAmount`]: LedgerError::InvalidAmount
//! [`SelfTransfer`]: LedgerError::SelfTransfer
//! [`InsufficientFunds`]: LedgerError::InsufficientFunds
//! [`Storage`]: LedgerError::Storage
use sea_orm::DbErr;
use thiserror::Error;

/// Ledger custom errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Cannot transfer from \"{0}\" to itself")]
    SelfTransfer(String),
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("storage unavailable: {0}")]
    Storage(#[from] DbErr),
}

impl PartialEq for LedgerError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::SelfTransfer(a), Self::SelfTransfer(b)) => a == b,
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::Storage(a), Self::Storage(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
