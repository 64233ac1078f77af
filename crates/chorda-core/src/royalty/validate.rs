//! ============================================================================
//! Split Validator - Royalty Share Sanity Checks
//! ============================================================================
//! Every split set is validated before any amount math or instruction
//! building. Shares must sum to exactly 10000 bps; there is no tolerance
//! band, because fractional percentages are already exact in basis points.
//! ============================================================================

use crate::error::ValidationError;
use crate::ledger::{AddressValidator, PubkeyAddressValidator};

use super::types::{RoyaltyConfig, RoyaltySplit, BPS_DENOMINATOR};

/// Validates royalty split sets. Deterministic, no side effects.
pub struct SplitValidator<V: AddressValidator = PubkeyAddressValidator> {
    addresses: V,
}

impl SplitValidator {
    pub fn new() -> Self {
        Self {
            addresses: PubkeyAddressValidator,
        }
    }
}

impl Default for SplitValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: AddressValidator> SplitValidator<V> {
    pub fn with_address_validator(addresses: V) -> Self {
        Self { addresses }
    }

    /// Validate a split set: every share positive, every wallet well-formed,
    /// shares summing to exactly 100%.
    pub fn validate(&self, splits: &[RoyaltySplit]) -> Result<(), ValidationError> {
        let mut total_bps: u64 = 0;

        for split in splits {
            if split.percent_bps == 0 {
                return Err(ValidationError::NonPositiveShare {
                    wallet: split.wallet.clone(),
                });
            }
            if !self.addresses.is_valid_address(&split.wallet) {
                return Err(ValidationError::InvalidAddress {
                    wallet: split.wallet.clone(),
                });
            }
            total_bps += split.percent_bps as u64;
        }

        if total_bps != BPS_DENOMINATOR {
            return Err(ValidationError::PercentageSum { total_bps });
        }

        Ok(())
    }

    /// Validate a full config: the split set plus the platform fee range.
    pub fn validate_config(&self, config: &RoyaltyConfig) -> Result<(), ValidationError> {
        if config.platform_fee_bps as u64 > BPS_DENOMINATOR {
            return Err(ValidationError::FeeOutOfRange {
                fee_bps: config.platform_fee_bps,
            });
        }
        self.validate(&config.splits)
    }
}
