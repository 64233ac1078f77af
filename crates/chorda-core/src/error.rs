//! ============================================================================
//! Error Types - Validation and Ledger Failure Taxonomy
//! ============================================================================
//! Three distinguishable families:
//! - ValidationError: malformed input. Never retried, surfaced verbatim.
//! - LedgerError: transient chain-state I/O failure. Callers may retry.
//! - PlanError: transfer plan assembly failure, wrapping the other two.
//!
//! Gate evaluation converts LedgerError into a negative-access GateResult
//! instead of propagating it; transfer planning always propagates.
//! ============================================================================

use thiserror::Error;

/// Malformed royalty or fee input. Deterministic for a given input, so
/// retrying never helps.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("royalty shares must sum to exactly 100% (10000 bps), got {total_bps} bps")]
    PercentageSum { total_bps: u64 },

    #[error("royalty share for {wallet} must be greater than zero")]
    NonPositiveShare { wallet: String },

    #[error("invalid wallet address: {wallet}")]
    InvalidAddress { wallet: String },

    #[error("platform fee {fee_bps} bps exceeds 100% (10000 bps)")]
    FeeOutOfRange { fee_bps: u32 },
}

/// Transient failure querying chain state. The core performs no retries of
/// its own; callers decide retry policy.
#[derive(Debug, Clone, Error)]
#[error("ledger query failed: {message}")]
pub struct LedgerError {
    pub message: String,
}

impl LedgerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Transfer plan assembly failure. Money-movement errors are never swallowed.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("payer token account for mint {mint} does not exist")]
    MissingSourceAccount { mint: String },

    #[error("instruction encoding failed: {0}")]
    Instruction(String),
}
