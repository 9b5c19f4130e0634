//! Thin interface to the external Lightning payment processor.
//!
//! This crate performs network I/O and nothing else: it creates and decodes
//! invoices, pays them out, and reads payment state. It never mutates the
//! ledger. Callers must treat a failed read as "no new information", not as
//! "no payments".

pub use client::{DEFAULT_TIMEOUT, ProcessorClient};
pub use error::SettlementError;
pub use invoice::looks_like_bolt11;
pub use payment::{
    DecodedInvoice, InvoiceReceipt, PaymentDirection, PayoutReceipt, ProcessorPayment,
};

mod client;
mod error;
mod invoice;
mod payment;

pub type SettlementResult<T> = Result<T, SettlementError>;

/// Operations the payment processor exposes to the rest of the system.
///
/// `create_invoice`, `decode_invoice`, `list_recent_payments` and
/// `processor_balance` are invoice-key (read/receive) operations;
/// `pay_invoice` is the only admin-key (spend) operation.
#[async_trait::async_trait]
pub trait SettlementApi: Send + Sync {
    /// Requests an invoice for `amount_sats`; the returned reference is the
    /// processor's id for the eventual payment.
    async fn create_invoice(&self, amount_sats: i64, memo: &str) -> SettlementResult<InvoiceReceipt>;

    /// Decodes a payment request without paying it.
    async fn decode_invoice(&self, payment_request: &str) -> SettlementResult<DecodedInvoice>;

    /// Pays a payment request from the processor wallet. A transport timeout
    /// surfaces as [`SettlementError::Ambiguous`], never as a failure.
    async fn pay_invoice(&self, payment_request: &str) -> SettlementResult<PayoutReceipt>;

    /// Recent payments, newest first. Includes pending and outgoing ones;
    /// callers filter.
    async fn list_recent_payments(&self) -> SettlementResult<Vec<ProcessorPayment>>;

    /// Spendable processor wallet balance, in sats.
    async fn processor_balance(&self) -> SettlementResult<i64>;
}
