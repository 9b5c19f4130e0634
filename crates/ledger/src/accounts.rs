//! Account rows.
//!
//! An account maps one external user identity (the chat platform's user id,
//! kept opaque here) to a sats balance. Accounts are created lazily with a
//! zero balance the first time an operation references them; nothing in this
//! crate ever deletes one.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Balance in satoshis. Every mutation path keeps this `>= 0`.
    pub balance: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
