//! Ledger entry primitives.
//!
//! A `LedgerEntry` is the durable record of one balance mutation. Settlement
//! entries (deposit credits, withdrawal debits) carry the processor's payment
//! reference; the unique index on that column is the idempotence record that
//! keeps a reference from being applied twice.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, DbErr, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LedgerError, ResultLedger};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Transfer,
    AdminCredit,
    DepositCredit,
    WithdrawalDebit,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transfer => "transfer",
            Self::AdminCredit => "admin_credit",
            Self::DepositCredit => "deposit_credit",
            Self::WithdrawalDebit => "withdrawal_debit",
        }
    }
}

impl TryFrom<&str> for EntryKind {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "transfer" => Ok(Self::Transfer),
            "admin_credit" => Ok(Self::AdminCredit),
            "deposit_credit" => Ok(Self::DepositCredit),
            "withdrawal_debit" => Ok(Self::WithdrawalDebit),
            other => Err(LedgerError::InvalidAmount(format!(
                "invalid entry kind: {other}"
            ))),
        }
    }
}

/// One balance mutation.
///
/// `account_id` is the account the operation is about (sender for transfers,
/// beneficiary for credits, payer for withdrawal debits). `counterparty` is
/// the transfer recipient or the acting administrator, when there is one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub kind: EntryKind,
    pub amount_sats: i64,
    pub account_id: String,
    pub counterparty: Option<String>,
    pub external_reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn new(
        kind: EntryKind,
        amount_sats: i64,
        account_id: String,
        counterparty: Option<String>,
        external_reference: Option<String>,
    ) -> ResultLedger<Self> {
        if amount_sats <= 0 {
            return Err(LedgerError::InvalidAmount(
                "amount_sats must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            kind,
            amount_sats,
            account_id,
            counterparty,
            external_reference,
            created_at: Utc::now(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub kind: String,
    pub amount_sats: i64,
    pub account_id: String,
    pub counterparty: Option<String>,
    pub external_reference: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&LedgerEntry> for ActiveModel {
    fn from(entry: &LedgerEntry) -> Self {
        Self {
            id: ActiveValue::Set(entry.id.to_string()),
            kind: ActiveValue::Set(entry.kind.as_str().to_string()),
            amount_sats: ActiveValue::Set(entry.amount_sats),
            account_id: ActiveValue::Set(entry.account_id.clone()),
            counterparty: ActiveValue::Set(entry.counterparty.clone()),
            external_reference: ActiveValue::Set(entry.external_reference.clone()),
            created_at: ActiveValue::Set(entry.created_at),
        }
    }
}

impl TryFrom<Model> for LedgerEntry {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| LedgerError::Storage(DbErr::Custom("malformed entry id".to_string())))?,
            kind: EntryKind::try_from(model.kind.as_str())?,
            amount_sats: model.amount_sats,
            account_id: model.account_id,
            counterparty: model.counterparty,
            external_reference: model.external_reference,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_roundtrips_through_str() {
        for kind in [
            EntryKind::Transfer,
            EntryKind::AdminCredit,
            EntryKind::DepositCredit,
            EntryKind::WithdrawalDebit,
        ] {
            assert_eq!(EntryKind::try_from(kind.as_str()).unwrap(), kind);
        }
        assert!(EntryKind::try_from("refund").is_err());
    }

    #[test]
    fn new_rejects_non_positive_amounts() {
        for amount in [0, -1] {
            let err = LedgerEntry::new(
                EntryKind::Transfer,
                amount,
                "alice".to_string(),
                Some("bob".to_string()),
                None,
            )
            .unwrap_err();
            assert_eq!(
                err,
                LedgerError::InvalidAmount("amount_sats must be > 0".to_string())
            );
        }
    }
}
