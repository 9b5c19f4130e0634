//! Atomic balance primitives.
//!
//! Every balance mutation in the crate funnels through [`try_adjust`]: one
//! conditional `UPDATE` whose predicate enforces the non-negativity invariant
//! in the same statement that applies the delta. SQLite runs a single writer
//! at a time, so per-account read-modify-write is linearizable; callers that
//! need multi-account atomicity (transfers) run both adjustments inside one
//! database transaction.
//!
//! These run on the caller's connection or transaction. Nothing here is
//! in-memory state: a mutation is durable once the enclosing transaction
//! commits, or it did not happen.

use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveValue, ConnectionTrait, DbErr, EntityTrait, Statement};

use crate::accounts;

/// Current balance in sats, 0 for accounts that were never referenced.
pub(crate) async fn balance<C: ConnectionTrait>(conn: &C, account_id: &str) -> Result<i64, DbErr> {
    let model = accounts::Entity::find_by_id(account_id).one(conn).await?;
    Ok(model.map(|account| account.balance).unwrap_or(0))
}

/// Lazily creates the account row with a zero balance.
pub(crate) async fn ensure<C: ConnectionTrait>(conn: &C, account_id: &str) -> Result<(), DbErr> {
    let account = accounts::ActiveModel {
        id: ActiveValue::Set(account_id.to_string()),
        balance: ActiveValue::Set(0),
        created_at: ActiveValue::Set(Utc::now()),
    };
    accounts::Entity::insert(account)
        .on_conflict(
            OnConflict::column(accounts::Column::Id)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

/// Applies `delta_sats` to the account balance if and only if the result
/// stays non-negative. Returns `false` when the guard rejected the change
/// (the balance is untouched). The row must already exist; see [`ensure`].
pub(crate) async fn try_adjust<C: ConnectionTrait>(
    conn: &C,
    account_id: &str,
    delta_sats: i64,
) -> Result<bool, DbErr> {
    let stmt = Statement::from_sql_and_values(
        conn.get_database_backend(),
        "UPDATE accounts SET balance = balance + ? WHERE id = ? AND balance + ? >= 0",
        [delta_sats.into(), account_id.into(), delta_sats.into()],
    );
    let result = conn.execute(stmt).await?;
    Ok(result.rows_affected() == 1)
}
