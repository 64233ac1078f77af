//! ============================================================================
//! Distribution Calculator - Fee-First Payout Math
//! ============================================================================
//! Computes per-recipient amounts from a sale total and a validated split
//! set. The platform fee comes off the top (half-up rounding); each share is
//! then a truncating basis-point fraction of the remainder, so the allocated
//! total never exceeds the sale total and the shortfall stays below one
//! smallest unit per recipient.
//!
//! The historical payout behavior leaves that shortfall unallocated (dust).
//! RemainderPolicy::LargestRemainder is the opt-in exact-conservation mode.
//! ============================================================================

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ValidationError;
use crate::ledger::AddressValidator;

use super::types::{Currency, Distribution, RecipientPayout, RoyaltyConfig, BPS_DENOMINATOR};
use super::validate::SplitValidator;

/// What to do with smallest units lost to per-share truncation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemainderPolicy {
    /// Leave the shortfall unallocated. Matches historical payout amounts.
    #[default]
    Dust,
    /// Give one extra unit to the payouts with the largest truncated
    /// fractional parts until the distributable amount is fully allocated.
    /// Changes payout amounts versus the historical behavior.
    LargestRemainder,
}

/// Computes distributions. Deterministic: identical inputs always produce
/// identical output, in split order.
pub struct DistributionCalculator<V: AddressValidator = crate::ledger::PubkeyAddressValidator> {
    validator: SplitValidator<V>,
    remainder_policy: RemainderPolicy,
}

impl DistributionCalculator {
    pub fn new() -> Self {
        Self {
            validator: SplitValidator::new(),
            remainder_policy: RemainderPolicy::default(),
        }
    }
}

impl Default for DistributionCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: AddressValidator> DistributionCalculator<V> {
    pub fn with_validator(validator: SplitValidator<V>) -> Self {
        Self {
            validator,
            remainder_policy: RemainderPolicy::default(),
        }
    }

    pub fn remainder_policy(mut self, policy: RemainderPolicy) -> Self {
        self.remainder_policy = policy;
        self
    }

    /// Compute the payout breakdown for one sale. Re-validates the config.
    pub fn calculate(
        &self,
        total_amount: u64,
        currency: Currency,
        config: &RoyaltyConfig,
    ) -> Result<Distribution, ValidationError> {
        self.validator.validate_config(config)?;

        let platform_fee_amount = round_half_up_bps(total_amount, config.platform_fee_bps);
        let distributable = total_amount - platform_fee_amount;

        let mut payouts = Vec::with_capacity(config.splits.len());
        let mut fractions = Vec::with_capacity(config.splits.len());
        for split in &config.splits {
            let numerator = distributable as u128 * split.percent_bps as u128;
            payouts.push(RecipientPayout {
                wallet: split.wallet.clone(),
                amount: (numerator / BPS_DENOMINATOR as u128) as u64,
                role: split.role.clone(),
            });
            fractions.push(numerator % BPS_DENOMINATOR as u128);
        }

        if self.remainder_policy == RemainderPolicy::LargestRemainder {
            let allocated: u64 = payouts.iter().map(|p| p.amount).sum();
            let shortfall = distributable - allocated;
            // Largest fraction first; ties resolve to the earlier split
            let mut order: Vec<usize> = (0..payouts.len()).collect();
            order.sort_by(|a, b| fractions[*b].cmp(&fractions[*a]).then(a.cmp(b)));
            for index in order.into_iter().take(shortfall as usize) {
                payouts[index].amount += 1;
            }
        }

        let distribution = Distribution {
            total_amount,
            currency,
            platform_fee_amount,
            payouts,
        };

        debug!(
            "distribution for {}: total {} fee {} across {} payouts, {} dust",
            config.subject_id,
            total_amount,
            platform_fee_amount,
            distribution.payouts.len(),
            distribution.remainder()
        );

        Ok(distribution)
    }
}

/// Basis-point fraction with half-up rounding, in u128 intermediate math.
fn round_half_up_bps(amount: u64, bps: u32) -> u64 {
    ((amount as u128 * bps as u128 + BPS_DENOMINATOR as u128 / 2) / BPS_DENOMINATOR as u128) as u64
}
