//! Deposit reconciler.
//!
//! Polls the processor for settled incoming payments and credits each one to
//! its mapped account exactly once. All dedupe state lives in the ledger's
//! consumed-reference record, so the loop survives restarts and handles any
//! number of simultaneous deposits in one cycle.

use std::time::Duration;

use ledger::{CreditOutcome, Ledger};
use settlement::SettlementApi;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::TreasuryError;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// What one polling cycle did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub credited: usize,
    /// Settled deposits with no recorded destination; left unconsumed for
    /// manual reconciliation.
    pub unmatched: usize,
}

pub struct Reconciler<S> {
    ledger: Ledger,
    settlement: S,
    poll_interval: Duration,
}

impl<S: SettlementApi> Reconciler<S> {
    pub fn new(ledger: Ledger, settlement: S, poll_interval: Duration) -> Self {
        Self {
            ledger,
            settlement,
            poll_interval,
        }
    }

    /// Polls until shutdown is signalled. A failed cycle is logged and
    /// retried on the next tick; credits within a cycle complete before the
    /// next poll starts.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            interval_secs = self.poll_interval.as_secs(),
            "starting deposit reconciler"
        );
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    match self.run_cycle().await {
                        Ok(report) if report.credited > 0 || report.unmatched > 0 => {
                            tracing::info!(
                                credited = report.credited,
                                unmatched = report.unmatched,
                                "deposit cycle finished"
                            );
                        }
                        Ok(_) => {}
                        // Transient; the next tick retries from scratch.
                        Err(err) => tracing::warn!("deposit poll failed: {err}"),
                    }
                    self.check_coverage().await;
                }
            }
        }

        tracing::info!("deposit reconciler stopped");
    }

    /// One poll: list recent payments and credit every settled incoming one
    /// whose reference has not been consumed yet.
    pub async fn run_cycle(&self) -> Result<CycleReport, TreasuryError> {
        let payments = self.settlement.list_recent_payments().await?;

        let mut report = CycleReport::default();
        for payment in payments.iter().filter(|p| p.is_settled_incoming()) {
            if self.ledger.is_reference_consumed(&payment.reference).await? {
                continue;
            }

            let Some(intent) = self.ledger.deposit_intent(&payment.reference).await? else {
                tracing::warn!(
                    reference = %payment.reference,
                    amount_sats = payment.amount_sats,
                    "settled deposit has no recorded destination; leaving for manual reconciliation"
                );
                report.unmatched += 1;
                continue;
            };

            // Credit the settled amount, not the requested one; the payment
            // is the source of truth.
            match self
                .ledger
                .credit_from_deposit(&intent.account_id, payment.amount_sats, &payment.reference)
                .await?
            {
                CreditOutcome::Applied(_) => {
                    tracing::info!(
                        account = %intent.account_id,
                        reference = %payment.reference,
                        amount_sats = payment.amount_sats,
                        "deposit credited"
                    );
                    report.credited += 1;
                }
                CreditOutcome::AlreadyApplied => {}
            }
        }

        Ok(report)
    }

    async fn check_coverage(&self) {
        let processor_sats = match self.settlement.processor_balance().await {
            Ok(balance) => balance,
            Err(err) => {
                tracing::debug!("coverage check skipped: {err}");
                return;
            }
        };
        let ledger_sats = match self.ledger.total_liabilities().await {
            Ok(total) => total,
            Err(err) => {
                tracing::debug!("coverage check skipped: {err}");
                return;
            }
        };
        if ledger_sats > processor_sats {
            tracing::warn!(
                ledger_sats,
                processor_sats,
                "ledger liabilities exceed processor balance"
            );
        }
    }
}
