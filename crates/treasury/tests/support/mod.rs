//! Test doubles shared by the treasury integration tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ledger::Ledger;
use migration::MigratorTrait;
use sea_orm::Database;
use settlement::{
    DecodedInvoice, InvoiceReceipt, PaymentDirection, PayoutReceipt, ProcessorPayment,
    SettlementApi, SettlementError, SettlementResult,
};

/// A syntactically plausible payment request that passes the local BOLT11
/// pre-check.
pub const FAKE_INVOICE: &str =
    "lnbc6000n1pjluvz5pp5qqqsqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqq";

pub async fn ledger_with_db() -> Ledger {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Ledger::builder().database(db).build()
}

pub fn settled_incoming(reference: &str, amount_sats: i64) -> ProcessorPayment {
    ProcessorPayment {
        reference: reference.to_string(),
        amount_sats,
        direction: PaymentDirection::Incoming,
        pending: false,
        memo: String::new(),
    }
}

#[derive(Clone)]
pub enum PayBehavior {
    Settle,
    Reject(String),
    Ambiguous(String),
}

/// Scripted settlement client. Responses are configured up front; every call
/// is recorded so tests can audit sequencing (most importantly that the
/// ledger debit can only ever follow a recorded `pay_invoice`).
#[derive(Clone)]
pub struct FakeSettlement {
    calls: Arc<Mutex<Vec<&'static str>>>,
    pub invoice_amount_sats: Option<i64>,
    pub pay: PayBehavior,
    pub payments: Vec<ProcessorPayment>,
    pub balance_sats: i64,
    pub listing_fails: bool,
}

impl FakeSettlement {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            invoice_amount_sats: Some(600),
            pay: PayBehavior::Settle,
            payments: Vec::new(),
            balance_sats: 0,
            listing_fails: false,
        }
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, name: &'static str) {
        self.calls.lock().unwrap().push(name);
    }

    fn processor_error(detail: &str) -> SettlementError {
        SettlementError::Processor {
            status: reqwest::StatusCode::BAD_GATEWAY,
            detail: detail.to_string(),
        }
    }
}

#[async_trait]
impl SettlementApi for FakeSettlement {
    async fn create_invoice(
        &self,
        amount_sats: i64,
        _memo: &str,
    ) -> SettlementResult<InvoiceReceipt> {
        self.record("create_invoice");
        Ok(InvoiceReceipt {
            reference: format!("inv-{amount_sats}"),
            payment_request: FAKE_INVOICE.to_string(),
        })
    }

    async fn decode_invoice(&self, _payment_request: &str) -> SettlementResult<DecodedInvoice> {
        self.record("decode_invoice");
        Ok(DecodedInvoice {
            reference: "decoded-hash".to_string(),
            amount_sats: self.invoice_amount_sats,
            description: None,
        })
    }

    async fn pay_invoice(&self, _payment_request: &str) -> SettlementResult<PayoutReceipt> {
        self.record("pay_invoice");
        match &self.pay {
            PayBehavior::Settle => Ok(PayoutReceipt {
                reference: "payout-hash".to_string(),
                amount_sats: self.invoice_amount_sats.unwrap_or(0),
            }),
            PayBehavior::Reject(detail) => Err(Self::processor_error(detail)),
            PayBehavior::Ambiguous(detail) => Err(SettlementError::Ambiguous(detail.clone())),
        }
    }

    async fn list_recent_payments(&self) -> SettlementResult<Vec<ProcessorPayment>> {
        self.record("list_recent_payments");
        if self.listing_fails {
            return Err(Self::processor_error("listing unavailable"));
        }
        Ok(self.payments.clone())
    }

    async fn processor_balance(&self) -> SettlementResult<i64> {
        self.record("processor_balance");
        Ok(self.balance_sats)
    }
}
