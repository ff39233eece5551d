use crate::ValidationError;
use alloy::primitives::{Bytes, FixedBytes, hex};
use std::fmt;
use std::str::FromStr;

/// Length of a BLS validator public key in bytes.
pub const PUBKEY_LENGTH: usize = 48;

/// Length of a BLS validator public key in hex characters (without `0x`).
pub const PUBKEY_HEX_LENGTH: usize = PUBKEY_LENGTH * 2;

/// 48-byte validator public key.
///
/// Parsed from 96 hex characters with an optional `0x` prefix. Displayed in
/// the normalized form: `0x`-prefixed lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValidatorPubkey(FixedBytes<PUBKEY_LENGTH>);

impl ValidatorPubkey {
    /// ABI `bytes` value of the key, as passed to the batch contract.
    pub fn to_abi_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(self.0.as_slice())
    }
}

impl From<[u8; PUBKEY_LENGTH]> for ValidatorPubkey {
    fn from(bytes: [u8; PUBKEY_LENGTH]) -> Self {
        Self(FixedBytes(bytes))
    }
}

impl FromStr for ValidatorPubkey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        if stripped.len() != PUBKEY_HEX_LENGTH {
            return Err(ValidationError::PubkeyLength {
                key: s.to_owned(),
                expected: PUBKEY_HEX_LENGTH,
                actual: stripped.len(),
            });
        }
        if !stripped.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ValidationError::PubkeyNotHex { key: s.to_owned() });
        }
        let mut bytes = [0u8; PUBKEY_LENGTH];
        hex::decode_to_slice(stripped, &mut bytes)
            .map_err(|_| ValidationError::PubkeyNotHex { key: s.to_owned() })?;
        Ok(Self::from(bytes))
    }
}

impl fmt::Display for ValidatorPubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for ValidatorPubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValidatorPubkey({self})")
    }
}

/// Canonical string form used for deduplication: prefix stripped, lowercase.
pub(crate) fn normalize(raw: &str) -> String {
    raw.strip_prefix("0x").unwrap_or(raw).to_ascii_lowercase()
}
