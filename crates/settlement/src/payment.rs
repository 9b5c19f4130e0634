//! Read-only views of processor state.
//!
//! Everything here is foreign data owned by the payment processor; the core
//! never writes it back. Amounts are satoshis: the client converts from the
//! processor's millisatoshi wire format before these types are built.

/// A freshly created invoice: the processor's payment reference plus the
/// payable string to hand to the depositor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvoiceReceipt {
    pub reference: String,
    pub payment_request: String,
}

/// Decoded fields of a payment request. `amount_sats` is `None` for
/// amountless invoices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedInvoice {
    pub reference: String,
    pub amount_sats: Option<i64>,
    pub description: Option<String>,
}

/// A confirmed outgoing payout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PayoutReceipt {
    pub reference: String,
    pub amount_sats: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaymentDirection {
    Incoming,
    Outgoing,
}

/// One payment as reported by the processor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessorPayment {
    pub reference: String,
    pub amount_sats: i64,
    pub direction: PaymentDirection,
    pub pending: bool,
    pub memo: String,
}

impl ProcessorPayment {
    /// A deposit the ledger may credit: incoming and no longer pending.
    pub fn is_settled_incoming(&self) -> bool {
        self.direction == PaymentDirection::Incoming && !self.pending
    }
}
