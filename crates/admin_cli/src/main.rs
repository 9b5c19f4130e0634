use std::error::Error;

use clap::{Args, Parser, Subcommand};
use ledger::Ledger;
use migration::MigratorTrait;
use sea_orm::Database;

#[derive(Parser, Debug)]
#[command(name = "saldo_admin")]
#[command(about = "Admin utilities for Saldo (balances, credits, manual reconciliation)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./saldo.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print an account balance in sats.
    Balance(BalanceArgs),
    /// Credit an account. Make sure you are authorized to do this; the
    /// ledger does not check.
    Credit(CreditArgs),
    /// List the most recent ledger entries touching an account.
    Entries(EntriesArgs),
    /// Print the sum of all balances (what the processor wallet must cover).
    Liabilities,
}

#[derive(Args, Debug)]
struct BalanceArgs {
    #[arg(long)]
    account: String,
}

#[derive(Args, Debug)]
struct CreditArgs {
    #[arg(long)]
    account: String,
    #[arg(long)]
    amount_sats: i64,
    #[arg(long, default_value = "admin")]
    actor: String,
}

#[derive(Args, Debug)]
struct EntriesArgs {
    #[arg(long)]
    account: String,
    #[arg(long, default_value_t = 20)]
    limit: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = Database::connect(&cli.database_url).await?;
    migration::Migrator::up(&db, None).await?;
    let ledger = Ledger::builder().database(db).build();

    match cli.command {
        Command::Balance(args) => {
            let balance = ledger.balance(&args.account).await?;
            println!("{}: {} sats", args.account, balance);
        }
        Command::Credit(args) => {
            let entry_id = ledger
                .admin_credit(&args.account, args.amount_sats, &args.actor)
                .await?;
            let balance = ledger.balance(&args.account).await?;
            println!(
                "credited {} sats to {} (entry {entry_id}), new balance {} sats",
                args.amount_sats, args.account, balance
            );
        }
        Command::Entries(args) => {
            let entries = ledger.recent_entries(&args.account, args.limit).await?;
            if entries.is_empty() {
                println!("no entries for {}", args.account);
            }
            for entry in entries {
                let counterparty = entry.counterparty.as_deref().unwrap_or("-");
                let reference = entry.external_reference.as_deref().unwrap_or("-");
                println!(
                    "{} {} {} sats account={} counterparty={} reference={}",
                    entry.created_at.format("%Y-%m-%d %H:%M:%S"),
                    entry.kind.as_str(),
                    entry.amount_sats,
                    entry.account_id,
                    counterparty,
                    reference
                );
            }
        }
        Command::Liabilities => {
            let total = ledger.total_liabilities().await?;
            println!("total liabilities: {total} sats");
        }
    }

    Ok(())
}
