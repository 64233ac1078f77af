//! ============================================================================
//! Token Gate Evaluator - Wallet Holdings vs Gate Configuration
//! ============================================================================
//! Evaluation is a total function: it returns a GateResult for every input
//! and never propagates an error to the caller. Chain failures fail closed
//! (no access, error string attached), unlike transfer planning, where
//! money-movement errors always propagate.
//!
//! Collection membership requires the metadata record's collection pointer
//! to be verified; an unverified pointer can be attached by anyone.
//! ============================================================================

use futures_util::future::join_all;
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::error::LedgerError;
use crate::ledger::{LedgerReader, MetadataRecord, TokenBalance, TokenHolding};
use crate::royalty::LAMPORTS_PER_SOL;

use super::types::{GateConfig, GateKind, GateResult, DEFAULT_REQUIRED_AMOUNT};

/// Evaluates wallets against gate configurations through an injected
/// ledger reader. Stateless; callers may evaluate many gates in parallel.
pub struct TokenGateEvaluator<'a> {
    ledger: &'a dyn LedgerReader,
}

impl<'a> TokenGateEvaluator<'a> {
    pub fn new(ledger: &'a dyn LedgerReader) -> Self {
        Self { ledger }
    }

    /// Evaluate `wallet` against `config`. Never returns an error; chain
    /// failures become a denied result with the message attached.
    pub async fn evaluate(&self, wallet: Option<&Pubkey>, config: &GateConfig) -> GateResult {
        // Open content is the fast path: no wallet needed, no I/O
        if config.kind == GateKind::None {
            return GateResult::granted(GateKind::None, 0.0);
        }

        let Some(wallet) = wallet else {
            debug!("gate {:?} checked without a connected wallet", config.kind);
            return GateResult::failed(config.kind, "wallet not connected");
        };

        let outcome = match config.kind {
            GateKind::None => Ok(GateResult::granted(GateKind::None, 0.0)),
            GateKind::Token => self.check_token(wallet, config).await,
            GateKind::Nft => self.check_nft(wallet, config).await,
            GateKind::Native => self.check_native(wallet, config).await,
        };

        match outcome {
            Ok(result) => result,
            Err(e) => {
                warn!("gate evaluation failed for {}: {}", wallet, e);
                GateResult::failed(config.kind, e.to_string())
            }
        }
    }

    /// Fungible-token threshold: sum unit-adjusted balances across every
    /// token account the wallet holds for the mint.
    async fn check_token(
        &self,
        wallet: &Pubkey,
        config: &GateConfig,
    ) -> Result<GateResult, LedgerError> {
        let Some(mint_str) = config.required_mint.as_deref() else {
            return Ok(GateResult::failed(
                GateKind::Token,
                "gate config missing required_mint",
            ));
        };
        let Ok(mint) = Pubkey::from_str(mint_str) else {
            return Ok(GateResult::failed(
                GateKind::Token,
                format!("invalid gate mint address: {mint_str}"),
            ));
        };

        let balances = self.ledger.token_balances(wallet, &mint).await?;
        let balance: f64 = balances.iter().map(TokenBalance::ui_amount).sum();
        let required = config.required_amount.unwrap_or(DEFAULT_REQUIRED_AMOUNT);

        debug!(
            "token gate for {}: holds {} of {}, needs {}",
            wallet, balance, mint, required
        );

        Ok(if balance >= required {
            GateResult::granted(GateKind::Token, balance)
        } else {
            GateResult::denied(GateKind::Token, balance)
        })
    }

    /// NFT holding: zero-decimal accounts with unit amount exactly 1. With
    /// a collection address, each candidate's metadata must carry a
    /// verified pointer to that collection; candidates whose metadata fails
    /// to fetch or parse are skipped, never fatal.
    async fn check_nft(
        &self,
        wallet: &Pubkey,
        config: &GateConfig,
    ) -> Result<GateResult, LedgerError> {
        let collection = match config.collection_address.as_deref() {
            Some(address) => match Pubkey::from_str(address) {
                Ok(pk) => Some(pk),
                Err(_) => {
                    return Ok(GateResult::failed(
                        GateKind::Nft,
                        format!("invalid collection address: {address}"),
                    ));
                }
            },
            None => None,
        };

        let holdings = self.ledger.token_holdings(wallet).await?;
        let candidates: Vec<&TokenHolding> = holdings
            .iter()
            .filter(|h| h.decimals == 0 && h.amount == 1)
            .collect();

        let count = match collection {
            None => candidates.len(),
            Some(collection) => {
                let fetches = candidates.iter().map(|h| self.ledger.metadata_record(&h.mint));
                let records = join_all(fetches).await;
                let mut verified = 0;
                for (holding, record) in candidates.iter().zip(records.iter()) {
                    if self.is_collection_member(holding, record, &collection) {
                        verified += 1;
                    }
                }
                verified
            }
        };

        debug!(
            "nft gate for {}: {} qualifying holding(s), collection {:?}",
            wallet, count, config.collection_address
        );

        let required = config.required_amount.unwrap_or(DEFAULT_REQUIRED_AMOUNT);
        Ok(if (count as f64) >= required {
            GateResult::granted(GateKind::Nft, count as f64)
        } else {
            GateResult::denied(GateKind::Nft, count as f64)
        })
    }

    fn is_collection_member(
        &self,
        holding: &TokenHolding,
        record: &Result<Option<Vec<u8>>, LedgerError>,
        collection: &Pubkey,
    ) -> bool {
        match record {
            Ok(Some(bytes)) => match MetadataRecord::from_account_data(bytes) {
                Ok(metadata) => metadata.is_verified_member_of(collection),
                Err(e) => {
                    debug!("skipping {}: unparseable metadata ({})", holding.mint, e);
                    false
                }
            },
            Ok(None) => false,
            Err(e) => {
                debug!("skipping {}: metadata fetch failed ({})", holding.mint, e);
                false
            }
        }
    }

    /// Native balance threshold, unit-adjusted to SOL.
    async fn check_native(
        &self,
        wallet: &Pubkey,
        config: &GateConfig,
    ) -> Result<GateResult, LedgerError> {
        let lamports = self.ledger.native_balance(wallet).await?;
        let balance = lamports as f64 / LAMPORTS_PER_SOL as f64;
        let required = config.required_amount.unwrap_or(DEFAULT_REQUIRED_AMOUNT);

        Ok(if balance >= required {
            GateResult::granted(GateKind::Native, balance)
        } else {
            GateResult::denied(GateKind::Native, balance)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::mock::{metadata_account_bytes, MockLedger};

    fn pubkey(byte: u8) -> Pubkey {
        Pubkey::new_from_array([byte; 32])
    }

    #[tokio::test]
    async fn test_open_gate_grants_without_io() {
        let ledger = MockLedger::new();
        let evaluator = TokenGateEvaluator::new(&ledger);

        let result = evaluator.evaluate(None, &GateConfig::open()).await;
        assert!(result.has_access);
        assert_eq!(result.measured_balance, 0.0);
        assert_eq!(result.error, None);

        let wallet = pubkey(1);
        let result = evaluator.evaluate(Some(&wallet), &GateConfig::open()).await;
        assert!(result.has_access);

        assert_eq!(ledger.calls(), 0);
    }

    #[tokio::test]
    async fn test_disconnected_wallet_denies_without_io() {
        let ledger = MockLedger::new();
        let evaluator = TokenGateEvaluator::new(&ledger);

        for config in [
            GateConfig::token(pubkey(9).to_string(), 1.0),
            GateConfig::nft(),
            GateConfig::native(0.5),
        ] {
            let result = evaluator.evaluate(None, &config).await;
            assert!(!result.has_access);
            assert_eq!(result.error.as_deref(), Some("wallet not connected"));
        }

        assert_eq!(ledger.calls(), 0);
    }

    #[tokio::test]
    async fn test_token_gate_sums_across_accounts() {
        let wallet = pubkey(1);
        let mint = pubkey(9);
        // 60 + 50 units across two accounts clears a threshold of 100
        let ledger = MockLedger::new()
            .with_token_balance(wallet, mint, 60_000_000, 6)
            .with_token_balance(wallet, mint, 50_000_000, 6);
        let evaluator = TokenGateEvaluator::new(&ledger);

        let result = evaluator
            .evaluate(Some(&wallet), &GateConfig::token(mint.to_string(), 100.0))
            .await;
        assert!(result.has_access);
        assert_eq!(result.measured_balance, 110.0);

        let result = evaluator
            .evaluate(Some(&wallet), &GateConfig::token(mint.to_string(), 200.0))
            .await;
        assert!(!result.has_access);
        assert_eq!(result.error, None);
    }

    #[tokio::test]
    async fn test_token_gate_defaults_to_one_unit() {
        let wallet = pubkey(1);
        let mint = pubkey(9);
        let ledger = MockLedger::new().with_token_balance(wallet, mint, 1_000_000, 6);
        let evaluator = TokenGateEvaluator::new(&ledger);

        let config = GateConfig {
            kind: GateKind::Token,
            required_mint: Some(mint.to_string()),
            required_amount: None,
            collection_address: None,
        };
        let result = evaluator.evaluate(Some(&wallet), &config).await;
        assert!(result.has_access);
        assert_eq!(result.measured_balance, 1.0);
    }

    #[tokio::test]
    async fn test_token_gate_missing_mint_config() {
        let wallet = pubkey(1);
        let ledger = MockLedger::new();
        let evaluator = TokenGateEvaluator::new(&ledger);

        let config = GateConfig {
            kind: GateKind::Token,
            ..GateConfig::default()
        };
        let result = evaluator.evaluate(Some(&wallet), &config).await;
        assert!(!result.has_access);
        assert!(result.error.unwrap().contains("required_mint"));
        assert_eq!(ledger.calls(), 0);
    }

    #[tokio::test]
    async fn test_nft_gate_counts_heuristic_holdings() {
        let wallet = pubkey(1);
        // Two NFTs plus a fungible balance that must not count
        let ledger = MockLedger::new()
            .with_nft(wallet, pubkey(10))
            .with_nft(wallet, pubkey(11))
            .with_token_balance(wallet, pubkey(12), 5_000_000, 6);
        let evaluator = TokenGateEvaluator::new(&ledger);

        let result = evaluator.evaluate(Some(&wallet), &GateConfig::nft()).await;
        assert!(result.has_access);
        assert_eq!(result.measured_balance, 2.0);
    }

    #[tokio::test]
    async fn test_nft_gate_denies_with_no_holdings() {
        let wallet = pubkey(1);
        let ledger = MockLedger::new().with_token_balance(wallet, pubkey(12), 5_000_000, 6);
        let evaluator = TokenGateEvaluator::new(&ledger);

        let result = evaluator.evaluate(Some(&wallet), &GateConfig::nft()).await;
        assert!(!result.has_access);
        assert_eq!(result.measured_balance, 0.0);
    }

    #[tokio::test]
    async fn test_collection_gate_requires_verified_pointer() {
        let wallet = pubkey(1);
        let collection = pubkey(40);
        let (member, unverified, stranger) = (pubkey(10), pubkey(11), pubkey(12));

        let ledger = MockLedger::new()
            .with_nft(wallet, member)
            .with_nft(wallet, unverified)
            .with_nft(wallet, stranger)
            .with_metadata(
                member,
                metadata_account_bytes(
                    &pubkey(2),
                    &member,
                    "Chorda Sessions #4",
                    "CHRD",
                    "https://cdn.chorda.audio/meta/4.json",
                    Some((true, collection)),
                ),
            )
            .with_metadata(
                unverified,
                metadata_account_bytes(
                    &pubkey(2),
                    &unverified,
                    "Fake Sessions",
                    "CHRD",
                    "https://cdn.chorda.audio/meta/fake.json",
                    Some((false, collection)),
                ),
            )
            .with_metadata(
                stranger,
                metadata_account_bytes(
                    &pubkey(2),
                    &stranger,
                    "Other Drop",
                    "OTHR",
                    "https://cdn.chorda.audio/meta/other.json",
                    Some((true, pubkey(41))),
                ),
            );
        let evaluator = TokenGateEvaluator::new(&ledger);

        let result = evaluator
            .evaluate(
                Some(&wallet),
                &GateConfig::nft_in_collection(collection.to_string()),
            )
            .await;
        assert!(result.has_access);
        // Only the verified member counts
        assert_eq!(result.measured_balance, 1.0);
    }

    #[tokio::test]
    async fn test_collection_gate_skips_failed_metadata() {
        let wallet = pubkey(1);
        let collection = pubkey(40);
        let (member, flaky) = (pubkey(10), pubkey(11));

        let ledger = MockLedger::new()
            .with_nft(wallet, member)
            .with_nft(wallet, flaky)
            .with_metadata(
                member,
                metadata_account_bytes(
                    &pubkey(2),
                    &member,
                    "Chorda Sessions #4",
                    "CHRD",
                    "https://cdn.chorda.audio/meta/4.json",
                    Some((true, collection)),
                ),
            )
            .with_failing_metadata(flaky);
        let evaluator = TokenGateEvaluator::new(&ledger);

        // The flaky fetch is skipped; the verified member still grants access
        let result = evaluator
            .evaluate(
                Some(&wallet),
                &GateConfig::nft_in_collection(collection.to_string()),
            )
            .await;
        assert!(result.has_access);
        assert_eq!(result.measured_balance, 1.0);
        assert_eq!(result.error, None);
    }

    #[tokio::test]
    async fn test_collection_gate_skips_unparseable_metadata() {
        let wallet = pubkey(1);
        let collection = pubkey(40);
        let garbled = pubkey(10);

        let ledger = MockLedger::new()
            .with_nft(wallet, garbled)
            .with_metadata(garbled, vec![4, 1, 2]); // truncated
        let evaluator = TokenGateEvaluator::new(&ledger);

        let result = evaluator
            .evaluate(
                Some(&wallet),
                &GateConfig::nft_in_collection(collection.to_string()),
            )
            .await;
        assert!(!result.has_access);
        assert_eq!(result.measured_balance, 0.0);
        assert_eq!(result.error, None);
    }

    #[tokio::test]
    async fn test_native_gate_thresholds() {
        let wallet = pubkey(1);
        let ledger = MockLedger::new().with_native(wallet, 2_500_000_000); // 2.5 SOL
        let evaluator = TokenGateEvaluator::new(&ledger);

        let result = evaluator
            .evaluate(Some(&wallet), &GateConfig::native(2.0))
            .await;
        assert!(result.has_access);
        assert_eq!(result.measured_balance, 2.5);

        let result = evaluator
            .evaluate(Some(&wallet), &GateConfig::native(3.0))
            .await;
        assert!(!result.has_access);
    }

    #[tokio::test]
    async fn test_ledger_failure_fails_closed() {
        let wallet = pubkey(1);
        let ledger = MockLedger::failing("connection refused");
        let evaluator = TokenGateEvaluator::new(&ledger);

        for config in [
            GateConfig::token(pubkey(9).to_string(), 1.0),
            GateConfig::nft(),
            GateConfig::native(1.0),
        ] {
            let result = evaluator.evaluate(Some(&wallet), &config).await;
            assert!(!result.has_access);
            assert_eq!(result.measured_balance, 0.0);
            assert!(result.error.as_deref().unwrap().contains("connection refused"));
        }
    }
}
