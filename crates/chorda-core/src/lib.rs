//! ============================================================================
//! CHORDA-CORE: Royalty & Access Engine
//! ============================================================================
//! Backend core for the Chorda music platform:
//! - Royalty split validation and fee-first payout calculation
//! - Transfer plan assembly for SOL and SPL token payment rails
//! - Token-gated content access with tier resolution
//!
//! This crate is a library invoked by the platform's API layer. It builds
//! instructions for an external signer and never signs or broadcasts itself.
//! ============================================================================

pub mod access;
pub mod error;
pub mod ledger;
pub mod royalty;

// Re-export main types for convenience
pub use access::{
    AccessGate, AccessTier, AccessTierInfo, GateConfig, GateKind, GateResult, TokenGateEvaluator,
};
pub use error::{LedgerError, PlanError, ValidationError};
pub use ledger::{
    AddressValidator, LedgerReader, PubkeyAddressValidator, SolanaLedgerReader, TokenBalance,
    TokenHolding,
};
pub use royalty::{
    Currency, Distribution, DistributionCalculator, RecipientPayout, RemainderPolicy,
    RoyaltyConfig, RoyaltySplit, SplitValidator, TokenRail, TransferPlan, TransferPlanBuilder,
    TransferStep,
};
