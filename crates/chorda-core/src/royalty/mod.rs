//! ============================================================================
//! Royalty Module - Payment Splitting for Chorda
//! ============================================================================
//! Turns a sale amount plus a track's royalty configuration into an ordered
//! transfer plan:
//! - SplitValidator: share percentages and wallet addresses
//! - DistributionCalculator: fee-first, fixed-point payout amounts
//! - TransferPlanBuilder: SOL and SPL rails with conditional ATA creation
//!
//! ## Usage
//! ```rust,ignore
//! use chorda_core::royalty::{DistributionCalculator, TransferPlanBuilder};
//!
//! let builder = TransferPlanBuilder::new(&ledger);
//! let plan = builder.build_native(&payer, &fee_wallet, 1_000_000, &config)?;
//! let instructions = plan.instructions()?;
//! ```
//! ============================================================================

mod distribute;
mod plan;
mod types;
mod validate;

// Re-export public types
pub use distribute::{DistributionCalculator, RemainderPolicy};
pub use plan::{TokenRail, TransferPlan, TransferPlanBuilder, TransferStep};
pub use types::{
    Currency, Distribution, RecipientPayout, RoyaltyConfig, RoyaltySplit, BPS_DENOMINATOR,
    LAMPORTS_PER_SOL,
};
pub use validate::SplitValidator;
