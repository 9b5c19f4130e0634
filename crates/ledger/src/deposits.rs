//! Deposit intents.
//!
//! When an invoice is created for a user, the processor's payment reference is
//! recorded here together with the destination account, in the same call that
//! produced the invoice. The reconciler resolves incoming settlements through
//! this mapping instead of parsing memo text.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};

/// Maps an invoice's external reference to the account to credit on
/// settlement. `amount_sats` is the requested amount; the credited amount is
/// always taken from the settled payment itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DepositIntent {
    pub reference: String,
    pub account_id: String,
    pub amount_sats: i64,
    pub created_at: DateTime<Utc>,
}

impl DepositIntent {
    pub fn new(reference: &str, account_id: &str, amount_sats: i64) -> Self {
        Self {
            reference: reference.to_string(),
            account_id: account_id.to_string(),
            amount_sats,
            created_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "deposit_intents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub reference: String,
    pub account_id: String,
    pub amount_sats: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&DepositIntent> for ActiveModel {
    fn from(intent: &DepositIntent) -> Self {
        Self {
            reference: ActiveValue::Set(intent.reference.clone()),
            account_id: ActiveValue::Set(intent.account_id.clone()),
            amount_sats: ActiveValue::Set(intent.amount_sats),
            created_at: ActiveValue::Set(intent.created_at),
        }
    }
}

impl From<Model> for DepositIntent {
    fn from(model: Model) -> Self {
        Self {
            reference: model.reference,
            account_id: model.account_id,
            amount_sats: model.amount_sats,
            created_at: model.created_at,
        }
    }
}
