//! ============================================================================
//! Ledger Module - Chain-State Collaborator Interfaces
//! ============================================================================
//! The engine never owns a network connection. Callers inject a LedgerReader
//! (usually SolanaLedgerReader) and the royalty/access components issue
//! read-only queries through it.
//! ============================================================================

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

use crate::error::LedgerError;

pub mod metadata;
mod solana;

#[cfg(test)]
pub(crate) mod mock;

pub use metadata::{derive_metadata_pda, Collection, MetadataRecord};
pub use solana::SolanaLedgerReader;

/// A single token account balance for a specific mint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TokenBalance {
    /// Raw amount in the token's smallest unit
    pub amount: u64,
    pub decimals: u8,
}

impl TokenBalance {
    /// Unit-adjusted amount (raw amount divided by the decimal scale)
    pub fn ui_amount(&self) -> f64 {
        self.amount as f64 / 10f64.powi(self.decimals as i32)
    }
}

/// A token account owned by a wallet, across any mint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenHolding {
    pub mint: Pubkey,
    pub amount: u64,
    pub decimals: u8,
}

/// Read-only view of chain state. All calls are independent and idempotent;
/// a cancelled or timed-out query surfaces as LedgerError like any other
/// transient failure.
#[async_trait]
pub trait LedgerReader: Send + Sync {
    /// All token account balances `owner` holds for `mint`.
    async fn token_balances(
        &self,
        owner: &Pubkey,
        mint: &Pubkey,
    ) -> Result<Vec<TokenBalance>, LedgerError>;

    /// Every token account `owner` holds, regardless of mint.
    async fn token_holdings(&self, owner: &Pubkey) -> Result<Vec<TokenHolding>, LedgerError>;

    /// Whether the associated token account for (owner, mint) exists.
    async fn account_exists(&self, owner: &Pubkey, mint: &Pubkey) -> Result<bool, LedgerError>;

    /// Native balance in lamports.
    async fn native_balance(&self, owner: &Pubkey) -> Result<u64, LedgerError>;

    /// Raw metadata account bytes for `mint`, or None when no metadata
    /// account exists at the derived address.
    async fn metadata_record(&self, mint: &Pubkey) -> Result<Option<Vec<u8>>, LedgerError>;
}

/// Address-format validation, injectable so the API layer can share one
/// implementation with the engine.
pub trait AddressValidator: Send + Sync {
    fn is_valid_address(&self, address: &str) -> bool;
}

/// Default validator: base58 string decoding to exactly 32 bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct PubkeyAddressValidator;

impl AddressValidator for PubkeyAddressValidator {
    fn is_valid_address(&self, address: &str) -> bool {
        bs58::decode(address)
            .into_vec()
            .map(|bytes| bytes.len() == 32)
            .unwrap_or(false)
    }
}
