use reqwest::StatusCode;
use thiserror::Error;

/// Failures talking to the payment processor.
///
/// `Ambiguous` exists because a payout that times out may still settle: it is
/// neither a success nor a failure, and callers must hand it to an operator
/// instead of retrying (retrying risks a double payment) or treating it as
/// failed (which would under-debit the user).
#[derive(Debug, Error)]
pub enum SettlementError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("{status}: {detail}")]
    Processor { status: StatusCode, detail: String },
    #[error("not a recognizable payment request")]
    InvalidInvoiceFormat,
    #[error("payout outcome unknown: {0}")]
    Ambiguous(String),
}
