//! ============================================================================
//! Solana Ledger Reader - RPC-Backed Chain State Queries
//! ============================================================================
//! LedgerReader implementation over the nonblocking Solana RPC client.
//! Absence of an account (missing ATA, missing metadata) is reported as a
//! value, never as an error; only transport failures become LedgerError.
//! ============================================================================

use async_trait::async_trait;
use solana_account_decoder::UiAccountData;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_request::TokenAccountsFilter;
use solana_client::rpc_response::RpcKeyedAccount;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use spl_associated_token_account::get_associated_token_address;
use tracing::debug;

use super::metadata::derive_metadata_pda;
use super::{LedgerReader, TokenBalance, TokenHolding};
use crate::error::LedgerError;

/// Chain-state reader over a Solana RPC endpoint.
pub struct SolanaLedgerReader {
    rpc: RpcClient,
}

impl SolanaLedgerReader {
    /// Create a reader with confirmed commitment.
    pub fn new(rpc_url: &str) -> Self {
        Self::with_commitment(rpc_url, CommitmentConfig::confirmed())
    }

    pub fn with_commitment(rpc_url: &str, commitment: CommitmentConfig) -> Self {
        Self {
            rpc: RpcClient::new_with_commitment(rpc_url.to_string(), commitment),
        }
    }
}

#[async_trait]
impl LedgerReader for SolanaLedgerReader {
    async fn token_balances(
        &self,
        owner: &Pubkey,
        mint: &Pubkey,
    ) -> Result<Vec<TokenBalance>, LedgerError> {
        let accounts = self
            .rpc
            .get_token_accounts_by_owner(owner, TokenAccountsFilter::Mint(*mint))
            .await
            .map_err(to_ledger_error)?;

        debug!(
            "{} token account(s) for owner {} mint {}",
            accounts.len(),
            owner,
            mint
        );

        Ok(accounts
            .iter()
            .filter_map(parse_keyed_token_account)
            .map(|holding| TokenBalance {
                amount: holding.amount,
                decimals: holding.decimals,
            })
            .collect())
    }

    async fn token_holdings(&self, owner: &Pubkey) -> Result<Vec<TokenHolding>, LedgerError> {
        let accounts = self
            .rpc
            .get_token_accounts_by_owner(owner, TokenAccountsFilter::ProgramId(spl_token::id()))
            .await
            .map_err(to_ledger_error)?;

        Ok(accounts.iter().filter_map(parse_keyed_token_account).collect())
    }

    async fn account_exists(&self, owner: &Pubkey, mint: &Pubkey) -> Result<bool, LedgerError> {
        let ata = get_associated_token_address(owner, mint);
        let response = self
            .rpc
            .get_account_with_commitment(&ata, self.rpc.commitment())
            .await
            .map_err(to_ledger_error)?;
        Ok(response.value.is_some())
    }

    async fn native_balance(&self, owner: &Pubkey) -> Result<u64, LedgerError> {
        self.rpc.get_balance(owner).await.map_err(to_ledger_error)
    }

    async fn metadata_record(&self, mint: &Pubkey) -> Result<Option<Vec<u8>>, LedgerError> {
        let (pda, _) = derive_metadata_pda(mint);
        let response = self
            .rpc
            .get_account_with_commitment(&pda, self.rpc.commitment())
            .await
            .map_err(to_ledger_error)?;
        Ok(response.value.map(|account| account.data))
    }
}

fn to_ledger_error(err: impl std::fmt::Display) -> LedgerError {
    LedgerError::new(err.to_string())
}

/// Pull (mint, amount, decimals) out of a jsonParsed token account response.
/// Accounts the decoder could not parse are skipped.
fn parse_keyed_token_account(keyed: &RpcKeyedAccount) -> Option<TokenHolding> {
    let UiAccountData::Json(parsed) = &keyed.account.data else {
        return None;
    };
    let info = parsed.parsed.get("info")?;
    let mint = info.get("mint")?.as_str()?.parse::<Pubkey>().ok()?;
    let token_amount = info.get("tokenAmount")?;
    let amount = token_amount.get("amount")?.as_str()?.parse::<u64>().ok()?;
    let decimals = token_amount.get("decimals")?.as_u64()? as u8;

    Some(TokenHolding {
        mint,
        amount,
        decimals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use solana_account_decoder::parse_account_data::ParsedAccount;
    use solana_account_decoder::UiAccount;

    #[test]
    fn test_reader_creation() {
        let _reader = SolanaLedgerReader::new("https://api.devnet.solana.com");
    }

    fn keyed_account(data: UiAccountData) -> RpcKeyedAccount {
        RpcKeyedAccount {
            pubkey: Pubkey::new_unique().to_string(),
            account: UiAccount {
                lamports: 2_039_280,
                data,
                owner: spl_token::id().to_string(),
                executable: false,
                rent_epoch: 0,
                space: Some(165),
            },
        }
    }

    #[test]
    fn test_parse_keyed_token_account() {
        let mint = Pubkey::new_unique();
        let keyed = keyed_account(UiAccountData::Json(ParsedAccount {
            program: "spl-token".to_string(),
            parsed: json!({
                "type": "account",
                "info": {
                    "mint": mint.to_string(),
                    "owner": Pubkey::new_unique().to_string(),
                    "tokenAmount": {
                        "amount": "2500000",
                        "decimals": 6,
                        "uiAmount": 2.5,
                        "uiAmountString": "2.5"
                    }
                }
            }),
            space: 165,
        }));

        let holding = parse_keyed_token_account(&keyed).unwrap();
        assert_eq!(holding.mint, mint);
        assert_eq!(holding.amount, 2_500_000);
        assert_eq!(holding.decimals, 6);
    }

    #[test]
    fn test_parse_skips_unparsed_data() {
        let keyed = keyed_account(UiAccountData::LegacyBinary("AAAA".to_string()));
        assert!(parse_keyed_token_account(&keyed).is_none());

        let malformed = keyed_account(UiAccountData::Json(ParsedAccount {
            program: "spl-token".to_string(),
            parsed: json!({ "type": "account", "info": { "mint": "not-a-mint" } }),
            space: 165,
        }));
        assert!(parse_keyed_token_account(&malformed).is_none());
    }
}
