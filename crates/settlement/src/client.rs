//! HTTP client for the external payment processor.
//!
//! The processor exposes an LNbits-style wallet API authenticated by two
//! capability keys: the invoice key can create and read payments, the admin
//! key can pay them out. The two are never interchanged. Every request is
//! bounded by a client-wide timeout so a hung processor cannot wedge callers.
//!
//! The processor reports amounts in millisatoshis; this module converts to
//! satoshis at the boundary and nothing above it sees msat again.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::SettlementError;
use crate::invoice::looks_like_bolt11;
use crate::payment::{
    DecodedInvoice, InvoiceReceipt, PaymentDirection, PayoutReceipt, ProcessorPayment,
};
use crate::{SettlementApi, SettlementResult};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const API_KEY_HEADER: &str = "X-Api-Key";

#[derive(Clone, Debug)]
pub struct ProcessorClient {
    client: Client,
    base_url: String,
    invoice_key: String,
    admin_key: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

#[derive(serde::Serialize)]
struct CreateInvoiceBody<'a> {
    out: bool,
    amount: i64,
    memo: &'a str,
}

#[derive(Debug, Deserialize)]
struct InvoiceCreated {
    payment_hash: String,
    payment_request: String,
}

#[derive(serde::Serialize)]
struct DecodeBody<'a> {
    data: &'a str,
}

#[derive(Debug, Deserialize)]
struct InvoiceDecoded {
    payment_hash: String,
    amount_msat: i64,
    #[serde(default)]
    description: Option<String>,
}

#[derive(serde::Serialize)]
struct PayBody<'a> {
    out: bool,
    bolt11: &'a str,
}

#[derive(Debug, Deserialize)]
struct PayoutCreated {
    payment_hash: String,
}

#[derive(Debug, Deserialize)]
struct WalletDetails {
    balance: i64,
}

/// One payment row as the processor serializes it: `amount` is signed
/// millisatoshis, negative for outgoing payments.
#[derive(Debug, Deserialize)]
struct PaymentRow {
    payment_hash: String,
    amount: i64,
    pending: bool,
    #[serde(default)]
    memo: String,
}

impl From<PaymentRow> for ProcessorPayment {
    fn from(row: PaymentRow) -> Self {
        let direction = if row.amount < 0 {
            PaymentDirection::Outgoing
        } else {
            PaymentDirection::Incoming
        };
        Self {
            reference: row.payment_hash,
            amount_sats: row.amount.abs() / 1000,
            direction,
            pending: row.pending,
            memo: row.memo,
        }
    }
}

impl ProcessorClient {
    pub fn new(
        base_url: &str,
        invoice_key: &str,
        admin_key: &str,
        timeout: Duration,
    ) -> SettlementResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
            invoice_key: invoice_key.to_string(),
            admin_key: admin_key.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> SettlementResult<T> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json::<T>().await?);
        }
        let detail = match resp.json::<ErrorBody>().await {
            Ok(body) => body.detail,
            Err(_) => "processor error".to_string(),
        };
        Err(SettlementError::Processor { status, detail })
    }
}

#[async_trait::async_trait]
impl SettlementApi for ProcessorClient {
    async fn create_invoice(&self, amount_sats: i64, memo: &str) -> SettlementResult<InvoiceReceipt> {
        let resp = self
            .client
            .post(self.url("/api/v1/payments"))
            .header(API_KEY_HEADER, &self.invoice_key)
            .json(&CreateInvoiceBody {
                out: false,
                amount: amount_sats,
                memo,
            })
            .send()
            .await?;

        let created: InvoiceCreated = Self::read_json(resp).await?;
        Ok(InvoiceReceipt {
            reference: created.payment_hash,
            payment_request: created.payment_request,
        })
    }

    async fn decode_invoice(&self, payment_request: &str) -> SettlementResult<DecodedInvoice> {
        if !looks_like_bolt11(payment_request) {
            return Err(SettlementError::InvalidInvoiceFormat);
        }

        let resp = self
            .client
            .post(self.url("/api/v1/payments/decode"))
            .header(API_KEY_HEADER, &self.invoice_key)
            .json(&DecodeBody {
                data: payment_request.trim(),
            })
            .send()
            .await?;

        let decoded: InvoiceDecoded = Self::read_json(resp).await?;
        let amount_sats = match decoded.amount_msat {
            0 => None,
            msat => Some(msat / 1000),
        };
        Ok(DecodedInvoice {
            reference: decoded.payment_hash,
            amount_sats,
            description: decoded.description,
        })
    }

    async fn pay_invoice(&self, payment_request: &str) -> SettlementResult<PayoutReceipt> {
        if !looks_like_bolt11(payment_request) {
            return Err(SettlementError::InvalidInvoiceFormat);
        }

        // Amountless invoices cannot be paid through this API.
        let decoded = self.decode_invoice(payment_request).await?;
        let amount_sats = decoded
            .amount_sats
            .ok_or(SettlementError::InvalidInvoiceFormat)?;

        let resp = self
            .client
            .post(self.url("/api/v1/payments"))
            .header(API_KEY_HEADER, &self.admin_key)
            .json(&PayBody {
                out: true,
                bolt11: payment_request.trim(),
            })
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    SettlementError::Ambiguous(
                        "payout request timed out; the payment may still settle".to_string(),
                    )
                } else {
                    SettlementError::Network(err)
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let detail = match resp.json::<ErrorBody>().await {
                Ok(body) => body.detail,
                Err(_) => "processor error".to_string(),
            };
            return Err(SettlementError::Processor { status, detail });
        }

        // The processor accepted the payout; losing the response body now
        // does not mean the payment failed.
        let created: PayoutCreated = resp.json().await.map_err(|err| {
            SettlementError::Ambiguous(format!("payout accepted but response unreadable: {err}"))
        })?;

        Ok(PayoutReceipt {
            reference: created.payment_hash,
            amount_sats,
        })
    }

    async fn list_recent_payments(&self) -> SettlementResult<Vec<ProcessorPayment>> {
        let resp = self
            .client
            .get(self.url("/api/v1/payments"))
            .header(API_KEY_HEADER, &self.invoice_key)
            .send()
            .await?;

        let rows: Vec<PaymentRow> = Self::read_json(resp).await?;
        Ok(rows.into_iter().map(ProcessorPayment::from).collect())
    }

    async fn processor_balance(&self) -> SettlementResult<i64> {
        let resp = self
            .client
            .get(self.url("/api/v1/wallet"))
            .header(API_KEY_HEADER, &self.invoice_key)
            .send()
            .await?;

        let details: WalletDetails = Self::read_json(resp).await?;
        Ok(details.balance / 1000)
    }
}
