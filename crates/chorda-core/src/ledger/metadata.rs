//! ============================================================================
//! Token Metadata - Metaplex Account Parsing
//! ============================================================================
//! PDA derivation and manual deserialization of Metaplex token-metadata
//! accounts, used for NFT collection-membership checks.
//!
//! Account layout (borsh):
//!   [0]        key (4 = MetadataV1)
//!   [1..33]    update_authority (Pubkey)
//!   [33..65]   mint (Pubkey)
//!   then:      name / symbol / uri (u32 LE length-prefixed, null-padded),
//!              seller_fee_basis_points (u16 LE),
//!              creators (Option<Vec<Creator>>, Creator = 32 + 1 + 1 bytes),
//!              primary_sale_happened (u8), is_mutable (u8),
//!              edition_nonce (Option<u8>), token_standard (Option<u8>),
//!              collection (Option<{ verified: u8, key: Pubkey }>)
//!
//! Accounts written before the collection upgrade end early; the optional
//! tail fields parse as absent rather than failing.
//! ============================================================================

use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use thiserror::Error;

/// Metaplex token-metadata program ID (same on devnet and mainnet)
pub const TOKEN_METADATA_PROGRAM_ID: &str = "metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s";

/// Account key byte for MetadataV1
const METADATA_V1_KEY: u8 = 4;

/// Upper bound for length-prefixed fields; real metadata strings are padded
/// to at most 200 bytes.
const MAX_STRING_LEN: usize = 1024;

/// Creator entry size: pubkey (32) + verified (1) + share (1)
const CREATOR_LEN: usize = 34;

pub fn metadata_program_id() -> Pubkey {
    Pubkey::from_str(TOKEN_METADATA_PROGRAM_ID).expect("Invalid metadata program ID")
}

/// Derive the metadata account address for a mint.
pub fn derive_metadata_pda(mint: &Pubkey) -> (Pubkey, u8) {
    let program_id = metadata_program_id();
    Pubkey::find_program_address(
        &[b"metadata", program_id.as_ref(), mint.as_ref()],
        &program_id,
    )
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataParseError {
    #[error("metadata account truncated (wanted {wanted} bytes at offset {offset})")]
    Truncated { offset: usize, wanted: usize },

    #[error("unsupported metadata account key: {0}")]
    UnsupportedKey(u8),

    #[error("invalid option tag {tag} at offset {offset}")]
    InvalidOptionTag { tag: u8, offset: usize },

    #[error("string length {len} exceeds maximum at offset {offset}")]
    OversizedString { len: usize, offset: usize },
}

/// Collection pointer within a metadata account. Membership requires
/// `verified`; an unverified pointer can be set by anyone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collection {
    pub verified: bool,
    pub key: Pubkey,
}

/// Deserialized Metaplex metadata account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRecord {
    pub update_authority: Pubkey,
    pub mint: Pubkey,
    pub name: String,
    pub symbol: String,
    pub uri: String,
    pub seller_fee_basis_points: u16,
    pub primary_sale_happened: bool,
    pub is_mutable: bool,
    pub collection: Option<Collection>,
}

impl MetadataRecord {
    /// Deserialize from raw account data bytes.
    pub fn from_account_data(data: &[u8]) -> Result<Self, MetadataParseError> {
        let mut cursor = Cursor::new(data);

        let key = cursor.read_u8()?;
        if key != METADATA_V1_KEY {
            return Err(MetadataParseError::UnsupportedKey(key));
        }

        let update_authority = cursor.read_pubkey()?;
        let mint = cursor.read_pubkey()?;
        let name = cursor.read_string()?;
        let symbol = cursor.read_string()?;
        let uri = cursor.read_string()?;
        let seller_fee_basis_points = cursor.read_u16()?;

        // Creators vec is skipped; only collection membership matters here
        if cursor.read_u8()? == 1 {
            let count = cursor.read_u32()? as usize;
            cursor.skip(count.saturating_mul(CREATOR_LEN))?;
        }

        let primary_sale_happened = cursor.read_u8()? != 0;
        let is_mutable = cursor.read_u8()? != 0;

        // Optional tail fields: absent entirely on pre-collection accounts
        cursor.read_option(|c| c.read_u8())?; // edition_nonce
        cursor.read_option(|c| c.read_u8())?; // token_standard
        let collection = cursor.read_option(|c| {
            let verified = c.read_u8()? != 0;
            let key = c.read_pubkey()?;
            Ok(Collection { verified, key })
        })?;

        Ok(Self {
            update_authority,
            mint,
            name,
            symbol,
            uri,
            seller_fee_basis_points,
            primary_sale_happened,
            is_mutable,
            collection,
        })
    }

    /// True when this record carries a verified pointer to `collection`.
    pub fn is_verified_member_of(&self, collection: &Pubkey) -> bool {
        self.collection
            .as_ref()
            .map(|c| c.verified && c.key == *collection)
            .unwrap_or(false)
    }
}

/// Bounds-checked byte reader over account data.
struct Cursor<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    fn at_end(&self) -> bool {
        self.offset >= self.data.len()
    }

    fn take(&mut self, wanted: usize) -> Result<&'a [u8], MetadataParseError> {
        let end = self
            .offset
            .checked_add(wanted)
            .filter(|end| *end <= self.data.len())
            .ok_or(MetadataParseError::Truncated {
                offset: self.offset,
                wanted,
            })?;
        let bytes = &self.data[self.offset..end];
        self.offset = end;
        Ok(bytes)
    }

    fn skip(&mut self, wanted: usize) -> Result<(), MetadataParseError> {
        self.take(wanted).map(|_| ())
    }

    fn read_u8(&mut self) -> Result<u8, MetadataParseError> {
        Ok(self.take(1)?[0])
    }

    fn read_u16(&mut self) -> Result<u16, MetadataParseError> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn read_u32(&mut self) -> Result<u32, MetadataParseError> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_pubkey(&mut self) -> Result<Pubkey, MetadataParseError> {
        let offset = self.offset;
        let bytes = self.take(32)?;
        Pubkey::try_from(bytes).map_err(|_| MetadataParseError::Truncated { offset, wanted: 32 })
    }

    /// Length-prefixed, null-padded string.
    fn read_string(&mut self) -> Result<String, MetadataParseError> {
        let offset = self.offset;
        let len = self.read_u32()? as usize;
        if len > MAX_STRING_LEN {
            return Err(MetadataParseError::OversizedString { len, offset });
        }
        let bytes = self.take(len)?;
        Ok(String::from_utf8_lossy(bytes)
            .trim_end_matches('\0')
            .to_string())
    }

    /// Borsh Option: tag byte then payload. Running off the end of the
    /// account is treated as absent, for pre-upgrade records.
    fn read_option<T>(
        &mut self,
        read: impl FnOnce(&mut Self) -> Result<T, MetadataParseError>,
    ) -> Result<Option<T>, MetadataParseError> {
        if self.at_end() {
            return Ok(None);
        }
        let offset = self.offset;
        match self.read_u8()? {
            0 => Ok(None),
            1 => read(self).map(Some),
            tag => Err(MetadataParseError::InvalidOptionTag { tag, offset }),
        }
    }
}
