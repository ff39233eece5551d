use crate::ValidationError;
use alloy::primitives::Address;

/// Parses the sender address supplied in airgapped mode, where no private key
/// is available to derive it from.
///
/// The address must be `0x`-prefixed and 40 hex characters long. Mixed-case
/// input must carry a valid EIP-55 checksum.
pub fn parse_sender_address(raw: &str) -> Result<Address, ValidationError> {
    let raw = raw.trim();
    let invalid = |reason: &str| ValidationError::InvalidAddress {
        address: raw.to_owned(),
        reason: reason.to_owned(),
    };

    let Some(body) = raw.strip_prefix("0x") else {
        return Err(invalid("address must start with 0x prefix"));
    };
    if body.len() != 40 {
        return Err(invalid(&format!(
            "expected 40 hex characters (20 bytes), got {}",
            body.len()
        )));
    }
    if !body.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid("address contains non-hexadecimal characters"));
    }

    let is_mixed_case = body.bytes().any(|b| b.is_ascii_lowercase())
        && body.bytes().any(|b| b.is_ascii_uppercase());
    if is_mixed_case {
        Address::parse_checksummed(raw, None).map_err(|_| invalid("invalid EIP-55 checksum"))
    } else {
        raw.parse().map_err(|_| invalid("not a valid address"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;
    use assert_matches::assert_matches;

    #[test]
    fn accepts_checksummed_and_single_case() {
        let expected = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
        for raw in [
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266",
            "0xF39FD6E51AAD88F6F4CE6AB8827279CFFFB92266",
        ] {
            assert_eq!(parse_sender_address(raw).unwrap(), expected);
        }
    }

    #[test]
    fn rejects_malformed() {
        for raw in [
            "f39fd6e51aad88f6f4ce6ab8827279cfffb92266",
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb922",
            "0xg39fd6e51aad88f6f4ce6ab8827279cfffb92266",
            // checksum of a single character flipped
            "0xF39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
        ] {
            assert_matches!(
                parse_sender_address(raw),
                Err(ValidationError::InvalidAddress { .. }),
                "{raw}"
            );
        }
    }
}
