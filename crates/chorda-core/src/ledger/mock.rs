//! In-memory LedgerReader for tests. Counts every chain call so the
//! zero-I/O fast paths can be asserted, and can be configured to fail
//! globally (transport outage) or per metadata record (flaky fetch).

use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{LedgerReader, TokenBalance, TokenHolding};
use crate::error::LedgerError;

#[derive(Default)]
pub(crate) struct MockLedger {
    balances: HashMap<(Pubkey, Pubkey), Vec<TokenBalance>>,
    holdings: HashMap<Pubkey, Vec<TokenHolding>>,
    existing: HashSet<(Pubkey, Pubkey)>,
    native: HashMap<Pubkey, u64>,
    metadata: HashMap<Pubkey, Vec<u8>>,
    failing_metadata: HashSet<Pubkey>,
    fail_message: Option<String>,
    calls: AtomicUsize,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// A ledger where every query fails, as during an RPC outage.
    pub fn failing(message: &str) -> Self {
        Self {
            fail_message: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn with_token_balance(mut self, owner: Pubkey, mint: Pubkey, amount: u64, decimals: u8) -> Self {
        self.balances
            .entry((owner, mint))
            .or_default()
            .push(TokenBalance { amount, decimals });
        self.holdings.entry(owner).or_default().push(TokenHolding {
            mint,
            amount,
            decimals,
        });
        self.existing.insert((owner, mint));
        self
    }

    /// A zero-decimal, amount-1 holding: what an NFT looks like on chain.
    pub fn with_nft(self, owner: Pubkey, mint: Pubkey) -> Self {
        self.with_token_balance(owner, mint, 1, 0)
    }

    /// Mark the associated token account for (owner, mint) as existing
    /// without giving it a balance.
    pub fn with_account(mut self, owner: Pubkey, mint: Pubkey) -> Self {
        self.existing.insert((owner, mint));
        self
    }

    pub fn with_native(mut self, owner: Pubkey, lamports: u64) -> Self {
        self.native.insert(owner, lamports);
        self
    }

    pub fn with_metadata(mut self, mint: Pubkey, bytes: Vec<u8>) -> Self {
        self.metadata.insert(mint, bytes);
        self
    }

    /// Metadata fetches for this mint fail while everything else succeeds.
    pub fn with_failing_metadata(mut self, mint: Pubkey) -> Self {
        self.failing_metadata.insert(mint);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) -> Result<(), LedgerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.fail_message {
            Some(message) => Err(LedgerError::new(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl LedgerReader for MockLedger {
    async fn token_balances(
        &self,
        owner: &Pubkey,
        mint: &Pubkey,
    ) -> Result<Vec<TokenBalance>, LedgerError> {
        self.record_call()?;
        Ok(self
            .balances
            .get(&(*owner, *mint))
            .cloned()
            .unwrap_or_default())
    }

    async fn token_holdings(&self, owner: &Pubkey) -> Result<Vec<TokenHolding>, LedgerError> {
        self.record_call()?;
        Ok(self.holdings.get(owner).cloned().unwrap_or_default())
    }

    async fn account_exists(&self, owner: &Pubkey, mint: &Pubkey) -> Result<bool, LedgerError> {
        self.record_call()?;
        Ok(self.existing.contains(&(*owner, *mint)))
    }

    async fn native_balance(&self, owner: &Pubkey) -> Result<u64, LedgerError> {
        self.record_call()?;
        Ok(self.native.get(owner).copied().unwrap_or(0))
    }

    async fn metadata_record(&self, mint: &Pubkey) -> Result<Option<Vec<u8>>, LedgerError> {
        self.record_call()?;
        if self.failing_metadata.contains(mint) {
            return Err(LedgerError::new(format!(
                "metadata fetch failed for {mint}"
            )));
        }
        Ok(self.metadata.get(mint).cloned())
    }
}

/// Well-formed Metaplex metadata account bytes for parser and gate tests.
pub(crate) fn metadata_account_bytes(
    update_authority: &Pubkey,
    mint: &Pubkey,
    name: &str,
    symbol: &str,
    uri: &str,
    collection: Option<(bool, Pubkey)>,
) -> Vec<u8> {
    fn write_str(buf: &mut Vec<u8>, s: &str) {
        buf.extend_from_slice(&(s.len() as u32).to_le_bytes());
        buf.extend_from_slice(s.as_bytes());
    }

    let mut data = vec![4u8]; // MetadataV1 key
    data.extend_from_slice(update_authority.as_ref());
    data.extend_from_slice(mint.as_ref());
    write_str(&mut data, name);
    write_str(&mut data, symbol);
    write_str(&mut data, uri);
    data.extend_from_slice(&500u16.to_le_bytes()); // seller fee bps
    data.push(0); // creators: None
    data.push(1); // primary_sale_happened
    data.push(1); // is_mutable
    data.push(0); // edition_nonce: None
    data.push(0); // token_standard: None
    match collection {
        Some((verified, key)) => {
            data.push(1);
            data.push(verified as u8);
            data.extend_from_slice(key.as_ref());
        }
        None => data.push(0),
    }
    data.push(0); // uses: None
    data
}
