//! ============================================================================
//! Royalty Types - Split Configuration and Derived Distributions
//! ============================================================================
//! Share percentages are fixed-point basis points (10000 = 100%) so payout
//! math stays in integer arithmetic end to end. These types cross the API
//! boundary as JSON and round-trip losslessly.
//! ============================================================================

use serde::{Deserialize, Serialize};

/// Basis-point denominator: 10000 bps = 100%
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Lamports per SOL
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Payment rail a distribution settles on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Currency {
    /// SOL, in lamports
    Native,
    /// An SPL token, in its smallest unit
    FungibleToken,
}

/// One collaborator's share of a track's revenue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoyaltySplit {
    /// Base58 wallet address, validated before any money math
    pub wallet: String,
    /// Share in basis points (100 = 1%). Fractional percentages are exact:
    /// 33.5% is 3350 bps.
    pub percent_bps: u32,
    /// Collaborator role, e.g. "artist", "producer", "featured"
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl RoyaltySplit {
    pub fn new(wallet: impl Into<String>, percent_bps: u32, role: impl Into<String>) -> Self {
        Self {
            wallet: wallet.into(),
            percent_bps,
            role: role.into(),
            display_name: None,
        }
    }
}

/// Stored royalty configuration for a track or release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoyaltyConfig {
    /// Track or release this split set applies to
    pub subject_id: String,
    /// Ordered splits; payout order mirrors this order
    pub splits: Vec<RoyaltySplit>,
    /// Platform fee in basis points, taken off the top before shares
    pub platform_fee_bps: u32,
}

/// A single recipient's computed payout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientPayout {
    pub wallet: String,
    /// Amount in the currency's smallest unit
    pub amount: u64,
    pub role: String,
}

/// Derived payout breakdown for one sale. Never stored; recomputed from the
/// config whenever needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    pub total_amount: u64,
    pub currency: Currency,
    pub platform_fee_amount: u64,
    /// Payouts in split order
    pub payouts: Vec<RecipientPayout>,
}

impl Distribution {
    /// Total smallest units actually allocated (fee plus payouts).
    pub fn allocated(&self) -> u64 {
        self.platform_fee_amount + self.payouts.iter().map(|p| p.amount).sum::<u64>()
    }

    /// Smallest units lost to per-recipient truncation under the dust
    /// policy. Always less than the number of splits.
    pub fn remainder(&self) -> u64 {
        self.total_amount - self.allocated()
    }
}
