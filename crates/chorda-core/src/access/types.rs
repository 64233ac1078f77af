//! ============================================================================
//! Access Types - Gate Configuration, Results, and Listener Tiers
//! ============================================================================
//! Gate configs arrive from the API layer as sparse JSON; results go back
//! the same way. Tiers are resolved from unit-adjusted balances with fixed
//! thresholds.
//! ============================================================================

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Threshold a gate falls back to when no required amount is configured
pub const DEFAULT_REQUIRED_AMOUNT: f64 = 1.0;

/// Listener tier thresholds (unit-adjusted amounts, not raw)
pub const TIER_HOLDER_THRESHOLD: f64 = 100.0;
pub const TIER_PREMIUM_THRESHOLD: f64 = 1_000.0;
pub const TIER_WHALE_THRESHOLD: f64 = 10_000.0;

/// Kind of holding a gate checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GateKind {
    /// Open content, no check at all
    #[default]
    None,
    /// Fungible-token balance threshold
    Token,
    /// NFT holding, optionally restricted to a verified collection
    Nft,
    /// Native (SOL) balance threshold
    Native,
}

/// Gate configuration for a track. Sparse JSON from the API layer; only the
/// fields the kind needs have to be present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GateConfig {
    #[serde(default)]
    pub kind: GateKind,
    /// Mint whose balance is measured (Token kind)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_mint: Option<String>,
    /// Unit-adjusted threshold; defaults to 1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_amount: Option<f64>,
    /// Verified collection the NFT must belong to (Nft kind)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_address: Option<String>,
}

impl GateConfig {
    /// Open content: everyone gets in, nothing is queried.
    pub fn open() -> Self {
        Self::default()
    }

    pub fn token(mint: impl Into<String>, required_amount: f64) -> Self {
        Self {
            kind: GateKind::Token,
            required_mint: Some(mint.into()),
            required_amount: Some(required_amount),
            collection_address: None,
        }
    }

    /// Any NFT at all satisfies the gate.
    pub fn nft() -> Self {
        Self {
            kind: GateKind::Nft,
            ..Self::default()
        }
    }

    /// Only NFTs verified into `collection` satisfy the gate.
    pub fn nft_in_collection(collection: impl Into<String>) -> Self {
        Self {
            kind: GateKind::Nft,
            collection_address: Some(collection.into()),
            ..Self::default()
        }
    }

    pub fn native(required_sol: f64) -> Self {
        Self {
            kind: GateKind::Native,
            required_amount: Some(required_sol),
            ..Self::default()
        }
    }
}

/// Outcome of one gate evaluation. Constructed fresh per call; the engine
/// never persists these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateResult {
    pub has_access: bool,
    /// Unit-adjusted balance the decision was based on (NFT kinds: count)
    pub measured_balance: f64,
    pub kind: GateKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GateResult {
    pub fn granted(kind: GateKind, measured_balance: f64) -> Self {
        Self {
            has_access: true,
            measured_balance,
            kind,
            error: None,
        }
    }

    pub fn denied(kind: GateKind, measured_balance: f64) -> Self {
        Self {
            has_access: false,
            measured_balance,
            kind,
            error: None,
        }
    }

    /// Fail closed: evaluation problems always deny access.
    pub fn failed(kind: GateKind, error: impl Into<String>) -> Self {
        Self {
            has_access: false,
            measured_balance: 0.0,
            kind,
            error: Some(error.into()),
        }
    }
}

/// Listener tiers based on gated-token holdings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccessTier {
    /// Below every threshold
    #[default]
    Free,
    /// 100+ units
    Holder,
    /// 1K+ units
    Premium,
    /// 10K+ units
    Whale,
}

impl AccessTier {
    /// Resolve a unit-adjusted balance to a tier. Monotone: more balance
    /// never yields a lower tier.
    pub fn from_balance(balance: f64) -> Self {
        match balance {
            x if x >= TIER_WHALE_THRESHOLD => AccessTier::Whale,
            x if x >= TIER_PREMIUM_THRESHOLD => AccessTier::Premium,
            x if x >= TIER_HOLDER_THRESHOLD => AccessTier::Holder,
            _ => AccessTier::Free,
        }
    }

    /// Minimum balance that reaches this tier.
    pub fn required_amount(&self) -> f64 {
        match self {
            AccessTier::Free => 0.0,
            AccessTier::Holder => TIER_HOLDER_THRESHOLD,
            AccessTier::Premium => TIER_PREMIUM_THRESHOLD,
            AccessTier::Whale => TIER_WHALE_THRESHOLD,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AccessTier::Free => "Free",
            AccessTier::Holder => "Holder",
            AccessTier::Premium => "Premium",
            AccessTier::Whale => "Whale",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            AccessTier::Free => 0,
            AccessTier::Holder => 1,
            AccessTier::Premium => 2,
            AccessTier::Whale => 3,
        }
    }
}

impl PartialOrd for AccessTier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AccessTier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

/// Tier plus progress toward the next one, for API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTierInfo {
    pub tier: AccessTier,
    pub balance: f64,
    pub next_tier: Option<AccessTier>,
    pub tokens_to_next_tier: Option<f64>,
}

impl AccessTierInfo {
    pub fn new(balance: f64) -> Self {
        let tier = AccessTier::from_balance(balance);
        let (next_tier, tokens_to_next_tier) = match tier {
            AccessTier::Free => (
                Some(AccessTier::Holder),
                Some(TIER_HOLDER_THRESHOLD - balance),
            ),
            AccessTier::Holder => (
                Some(AccessTier::Premium),
                Some(TIER_PREMIUM_THRESHOLD - balance),
            ),
            AccessTier::Premium => (
                Some(AccessTier::Whale),
                Some(TIER_WHALE_THRESHOLD - balance),
            ),
            AccessTier::Whale => (None, None),
        };

        Self {
            tier,
            balance,
            next_tier,
            tokens_to_next_tier,
        }
    }
}
