//! ============================================================================
//! Access Module - Token-Gated Content Control for Chorda
//! ============================================================================
//! Decides whether a wallet may play gated tracks:
//! - TokenGateEvaluator: evaluates a wallet against a gate config
//! - AccessGate: cached, bounded wrapper for request-path lookups
//! - AccessTier: balance-based listener tiers
//!
//! ## Gate kinds
//! - **None**: open content, no wallet needed
//! - **Token**: hold at least N units of a specific mint
//! - **Nft**: hold an NFT, optionally from a verified collection
//! - **Native**: hold at least N SOL
//!
//! ## Usage
//! ```rust,ignore
//! use chorda_core::access::{AccessGate, GateConfig};
//!
//! let gate = AccessGate::new(ledger);
//! let result = gate.check(&wallet, &GateConfig::token(mint, 100.0)).await;
//! ```
//! ============================================================================

mod evaluator;
mod gate;
mod types;

// Re-export public types
pub use evaluator::TokenGateEvaluator;
pub use gate::{AccessGate, DEFAULT_CACHE_DURATION_SECS};
pub use types::{
    AccessTier, AccessTierInfo, GateConfig, GateKind, GateResult, DEFAULT_REQUIRED_AMOUNT,
    TIER_HOLDER_THRESHOLD, TIER_PREMIUM_THRESHOLD, TIER_WHALE_THRESHOLD,
};
