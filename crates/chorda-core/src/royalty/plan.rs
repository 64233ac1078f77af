//! ============================================================================
//! Transfer Plan Builder - Payout Instruction Assembly
//! ============================================================================
//! Lowers a distribution into an ordered list of transfer steps and, from
//! there, into Solana instructions for an external signer. The fee step
//! always precedes recipient steps, recipients follow split order, and on
//! the SPL rail a missing destination ATA gets a creation step immediately
//! before its transfer.
//!
//! Existence checks run concurrently per destination; the plan is
//! reassembled in deterministic order afterwards, never in completion order.
//! Recent-blockhash and fee-payer metadata are attached by the signer, not
//! here.
//! ============================================================================

use futures_util::future::join_all;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::system_instruction;
use spl_associated_token_account::get_associated_token_address;
use spl_associated_token_account::instruction::create_associated_token_account;
use std::str::FromStr;
use tracing::debug;

use crate::error::{PlanError, ValidationError};
use crate::ledger::{AddressValidator, LedgerReader};

use super::distribute::DistributionCalculator;
use super::types::{Currency, Distribution, RoyaltyConfig};

/// One step of a transfer plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferStep {
    /// Create the associated token account for `owner` before first use.
    /// The payer funds the creation.
    EnsureAccountExists {
        owner: Pubkey,
        account: Pubkey,
        mint: Pubkey,
    },
    /// Move `amount` smallest units. `mint` is None on the native rail.
    Transfer {
        from: Pubkey,
        to: Pubkey,
        amount: u64,
        mint: Option<Pubkey>,
    },
}

/// Mint context for the fungible-token rail. The caller knows its payment
/// token; decimals are needed for checked transfers.
#[derive(Debug, Clone, Copy)]
pub struct TokenRail {
    pub mint: Pubkey,
    pub decimals: u8,
}

/// Ordered transfer steps for one sale, ready to lower into instructions.
#[derive(Debug, Clone)]
pub struct TransferPlan {
    pub currency: Currency,
    /// Wallet that signs and funds every step
    pub payer: Pubkey,
    pub steps: Vec<TransferStep>,
    token_decimals: Option<u8>,
}

impl TransferPlan {
    /// Lower the plan into Solana instructions, in step order.
    pub fn instructions(&self) -> Result<Vec<Instruction>, PlanError> {
        let mut instructions = Vec::with_capacity(self.steps.len());
        for step in &self.steps {
            match step {
                TransferStep::EnsureAccountExists { owner, mint, .. } => {
                    instructions.push(create_associated_token_account(
                        &self.payer,
                        owner,
                        mint,
                        &spl_token::id(),
                    ));
                }
                TransferStep::Transfer {
                    from,
                    to,
                    amount,
                    mint: None,
                } => {
                    instructions.push(system_instruction::transfer(from, to, *amount));
                }
                TransferStep::Transfer {
                    from,
                    to,
                    amount,
                    mint: Some(mint),
                } => {
                    let decimals = self
                        .token_decimals
                        .ok_or_else(|| PlanError::Instruction("missing token decimals".into()))?;
                    instructions.push(
                        spl_token::instruction::transfer_checked(
                            &spl_token::id(),
                            from,
                            mint,
                            to,
                            &self.payer,
                            &[],
                            *amount,
                            decimals,
                        )
                        .map_err(|e| PlanError::Instruction(e.to_string()))?,
                    );
                }
            }
        }
        Ok(instructions)
    }

    /// Number of account-creation steps in the plan.
    pub fn creation_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s, TransferStep::EnsureAccountExists { .. }))
            .count()
    }
}

/// Builds transfer plans from a sale and a royalty config. Re-validates the
/// split set internally; an unvalidated config cannot reach instruction
/// assembly.
pub struct TransferPlanBuilder<'a, V: AddressValidator = crate::ledger::PubkeyAddressValidator> {
    ledger: &'a dyn LedgerReader,
    calculator: DistributionCalculator<V>,
}

impl<'a> TransferPlanBuilder<'a> {
    pub fn new(ledger: &'a dyn LedgerReader) -> Self {
        Self {
            ledger,
            calculator: DistributionCalculator::new(),
        }
    }
}

impl<'a, V: AddressValidator> TransferPlanBuilder<'a, V> {
    pub fn with_calculator(ledger: &'a dyn LedgerReader, calculator: DistributionCalculator<V>) -> Self {
        Self { ledger, calculator }
    }

    /// Native rail: one transfer for the platform fee, then one per payout
    /// in split order. Native accounts need no existence checks.
    pub fn build_native(
        &self,
        payer: &Pubkey,
        fee_wallet: &Pubkey,
        total_amount: u64,
        config: &RoyaltyConfig,
    ) -> Result<TransferPlan, PlanError> {
        let distribution = self
            .calculator
            .calculate(total_amount, Currency::Native, config)?;

        let mut steps = Vec::with_capacity(distribution.payouts.len() + 1);
        for (wallet, amount) in destinations(&distribution, fee_wallet)? {
            steps.push(TransferStep::Transfer {
                from: *payer,
                to: wallet,
                amount,
                mint: None,
            });
        }

        debug!(
            "native plan for {}: {} transfer(s), {} lamports total",
            config.subject_id,
            steps.len(),
            distribution.allocated()
        );

        Ok(TransferPlan {
            currency: Currency::Native,
            payer: *payer,
            steps,
            token_decimals: None,
        })
    }

    /// Fungible-token rail: checked transfers between associated token
    /// accounts, creating missing destination accounts along the way.
    pub async fn build_token(
        &self,
        payer: &Pubkey,
        fee_wallet: &Pubkey,
        rail: &TokenRail,
        total_amount: u64,
        config: &RoyaltyConfig,
    ) -> Result<TransferPlan, PlanError> {
        let distribution =
            self.calculator
                .calculate(total_amount, Currency::FungibleToken, config)?;

        // The payer must already hold the payment token
        if !self.ledger.account_exists(payer, &rail.mint).await? {
            return Err(PlanError::MissingSourceAccount {
                mint: rail.mint.to_string(),
            });
        }
        let source = get_associated_token_address(payer, &rail.mint);

        let dests = destinations(&distribution, fee_wallet)?;

        // Issue existence checks concurrently, then reassemble in
        // destination order so the plan never depends on completion order
        let checks = dests
            .iter()
            .map(|(owner, _)| self.ledger.account_exists(owner, &rail.mint));
        let existence = join_all(checks).await;

        let mut steps = Vec::with_capacity(dests.len() * 2);
        for ((owner, amount), exists) in dests.into_iter().zip(existence) {
            let destination = get_associated_token_address(&owner, &rail.mint);
            if !exists? {
                debug!("destination ATA {} missing, adding creation step", destination);
                steps.push(TransferStep::EnsureAccountExists {
                    owner,
                    account: destination,
                    mint: rail.mint,
                });
            }
            steps.push(TransferStep::Transfer {
                from: source,
                to: destination,
                amount,
                mint: Some(rail.mint),
            });
        }

        debug!(
            "token plan for {}: {} step(s), {} account creation(s)",
            config.subject_id,
            steps.len(),
            steps
                .iter()
                .filter(|s| matches!(s, TransferStep::EnsureAccountExists { .. }))
                .count()
        );

        Ok(TransferPlan {
            currency: Currency::FungibleToken,
            payer: *payer,
            steps,
            token_decimals: Some(rail.decimals),
        })
    }
}

/// Destination wallets in payout order: platform fee first, then each
/// recipient. Zero amounts produce no step.
fn destinations(
    distribution: &Distribution,
    fee_wallet: &Pubkey,
) -> Result<Vec<(Pubkey, u64)>, PlanError> {
    let mut dests = Vec::with_capacity(distribution.payouts.len() + 1);
    if distribution.platform_fee_amount > 0 {
        dests.push((*fee_wallet, distribution.platform_fee_amount));
    }
    for payout in &distribution.payouts {
        if payout.amount == 0 {
            debug!("skipping zero-amount payout to {}", payout.wallet);
            continue;
        }
        let wallet = Pubkey::from_str(&payout.wallet).map_err(|_| {
            PlanError::Validation(ValidationError::InvalidAddress {
                wallet: payout.wallet.clone(),
            })
        })?;
        dests.push((wallet, payout.amount));
    }
    Ok(dests)
}
