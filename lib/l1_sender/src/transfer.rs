//! JSON files carrying a transaction between the online machine and the
//! offline signer.
//!
//! Transactions are stored as hex of their EIP-2718 network encoding (the typed
//! envelope wrapped in an RLP string). Unsigned transactions carry zero
//! signatures in place of the transaction and authorization signatures.

use crate::error::TransferFileError;
use alloy::consensus::{SignableTransaction, Signed, TxEip7702, TxEnvelope};
use alloy::eips::eip2718::{Decodable2718, Encodable2718};
use alloy::primitives::{Signature, U256};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UnsignedTransferFile {
    pub unsigned_transaction: String,
    /// Decimal chain id.
    pub chain_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SignedTransferFile {
    pub signed_transaction: String,
}

pub fn write_unsigned(path: &Path, tx: &TxEip7702) -> Result<(), TransferFileError> {
    let placeholder = Signature::new(U256::ZERO, U256::ZERO, false);
    let envelope = TxEnvelope::Eip7702(tx.clone().into_signed(placeholder));
    write_json(
        path,
        &UnsignedTransferFile {
            unsigned_transaction: encode_envelope(&envelope),
            chain_id: tx.chain_id.to_string(),
        },
    )
}

/// Reads an unsigned transfer file.
///
/// The file must describe exactly what the airgapped pipeline writes: the
/// declared chain id matches the transaction, the single authorization is
/// bound to the same chain and to the nonce following the transaction's, and
/// neither the transaction nor the authorization carries a signature yet.
pub fn read_unsigned(path: &Path) -> Result<TxEip7702, TransferFileError> {
    let file: UnsignedTransferFile = read_json(path)?;
    let declared: u64 = file.chain_id.parse().map_err(|_| TransferFileError::Malformed {
        path: path.to_owned(),
        reason: format!("chainId {:?} is not a decimal integer", file.chain_id),
    })?;
    let (tx, signature, _) = decode_eip7702(path, &file.unsigned_transaction)?.into_parts();
    if tx.chain_id != declared {
        return Err(TransferFileError::Malformed {
            path: path.to_owned(),
            reason: format!(
                "chainId {declared} does not match transaction chain id {}",
                tx.chain_id
            ),
        });
    }
    check_single_authorization(path, &tx)?;
    check_unsigned_authorization(path, &tx)?;
    if signature.r() != U256::ZERO || signature.s() != U256::ZERO || signature.v() {
        return Err(TransferFileError::Malformed {
            path: path.to_owned(),
            reason: "transaction is already signed".to_owned(),
        });
    }
    Ok(tx)
}

pub fn write_signed(path: &Path, signed: &Signed<TxEip7702>) -> Result<(), TransferFileError> {
    let envelope = TxEnvelope::Eip7702(signed.clone());
    write_json(
        path,
        &SignedTransferFile {
            signed_transaction: encode_envelope(&envelope),
        },
    )
}

pub fn read_signed(path: &Path) -> Result<Signed<TxEip7702>, TransferFileError> {
    let file: SignedTransferFile = read_json(path)?;
    let signed = decode_eip7702(path, &file.signed_transaction)?;
    check_single_authorization(path, signed.tx())?;
    Ok(signed)
}

fn encode_envelope(envelope: &TxEnvelope) -> String {
    let mut buf = Vec::with_capacity(envelope.network_len());
    envelope.network_encode(&mut buf);
    alloy::hex::encode(buf)
}

fn decode_eip7702(path: &Path, raw: &str) -> Result<Signed<TxEip7702>, TransferFileError> {
    let raw = raw.trim();
    let bytes = alloy::hex::decode(raw.strip_prefix("0x").unwrap_or(raw)).map_err(|source| {
        TransferFileError::Hex {
            path: path.to_owned(),
            source,
        }
    })?;
    let envelope =
        TxEnvelope::network_decode(&mut bytes.as_slice()).map_err(|source| TransferFileError::Decode {
            path: path.to_owned(),
            source,
        })?;
    match envelope {
        TxEnvelope::Eip7702(signed) => Ok(signed),
        other => Err(TransferFileError::Malformed {
            path: path.to_owned(),
            reason: format!("expected an EIP-7702 transaction, got {:?}", other.tx_type()),
        }),
    }
}

fn check_single_authorization(path: &Path, tx: &TxEip7702) -> Result<(), TransferFileError> {
    match tx.authorization_list.len() {
        1 => Ok(()),
        n => Err(TransferFileError::Malformed {
            path: path.to_owned(),
            reason: format!("expected exactly one authorization, found {n}"),
        }),
    }
}

fn check_unsigned_authorization(path: &Path, tx: &TxEip7702) -> Result<(), TransferFileError> {
    let malformed = |reason: String| TransferFileError::Malformed {
        path: path.to_owned(),
        reason,
    };
    let [authorization] = tx.authorization_list.as_slice() else {
        return Err(malformed(format!(
            "expected exactly one authorization, found {}",
            tx.authorization_list.len()
        )));
    };
    // chain id 0 would make the delegation valid on every chain
    if authorization.chain_id != U256::from(tx.chain_id) {
        return Err(malformed(format!(
            "authorization chain id {} does not match transaction chain id {}",
            authorization.chain_id, tx.chain_id
        )));
    }
    if Some(authorization.nonce) != tx.nonce.checked_add(1) {
        return Err(malformed(format!(
            "authorization nonce {} must follow transaction nonce {}",
            authorization.nonce, tx.nonce
        )));
    }
    if authorization.r() != U256::ZERO
        || authorization.s() != U256::ZERO
        || authorization.y_parity() != 0
    {
        return Err(malformed("authorization is already signed".to_owned()));
    }
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, TransferFileError> {
    let raw = std::fs::read_to_string(path).map_err(|source| TransferFileError::Read {
        path: path.to_owned(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| TransferFileError::Json {
        path: path.to_owned(),
        source,
    })
}

/// Writes into a temporary file next to `path` and renames it into place, so a
/// failed write never leaves a partial file behind.
fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), TransferFileError> {
    let write_err = |source| TransferFileError::Write {
        path: path.to_owned(),
        source,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    serde_json::to_writer_pretty(&mut file, value).map_err(|err| write_err(err.into()))?;
    file.write_all(b"\n").map_err(write_err)?;
    file.as_file().sync_all().map_err(write_err)?;
    file.persist(path).map_err(|err| write_err(err.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::unsigned;
    use alloy::eips::eip7702::Authorization;
    use alloy::primitives::{Address, Bytes};
    use alloy::signers::SignerSync;
    use alloy::signers::local::PrivateKeySigner;
    use assert_matches::assert_matches;

    const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn tx() -> TxEip7702 {
        TxEip7702 {
            chain_id: 560048,
            nonce: 11,
            gas_limit: 30_000_000,
            max_fee_per_gas: 2_000_000_000,
            max_priority_fee_per_gas: 1_000_000_000,
            to: Address::repeat_byte(0x0a),
            value: U256::from(3),
            access_list: Default::default(),
            authorization_list: vec![unsigned(Authorization {
                chain_id: U256::from(560048),
                address: Address::repeat_byte(0x42),
                nonce: 12,
            })],
            input: Bytes::from_static(&[0xca, 0xfe]),
        }
    }

    #[test]
    fn unsigned_file_reproduces_transaction() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unsigned_txn.json");
        write_unsigned(&path, &tx()).unwrap();

        let file: UnsignedTransferFile =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(file.chain_id, "560048");
        assert!(!file.unsigned_transaction.starts_with("0x"));

        assert_eq!(read_unsigned(&path).unwrap(), tx());
    }

    #[test]
    fn accepts_prefixed_hex() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unsigned_txn.json");
        write_unsigned(&path, &tx()).unwrap();

        let mut file: UnsignedTransferFile = read_json(&path).unwrap();
        file.unsigned_transaction.insert_str(0, "0x");
        std::fs::write(&path, serde_json::to_string(&file).unwrap()).unwrap();
        assert_eq!(read_unsigned(&path).unwrap(), tx());
    }

    #[test]
    fn rejects_chain_id_mismatch_and_unknown_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unsigned_txn.json");
        write_unsigned(&path, &tx()).unwrap();
        let file: UnsignedTransferFile = read_json(&path).unwrap();

        let mismatched = UnsignedTransferFile {
            chain_id: "1".into(),
            ..file.clone()
        };
        std::fs::write(&path, serde_json::to_string(&mismatched).unwrap()).unwrap();
        assert_matches!(read_unsigned(&path), Err(TransferFileError::Malformed { .. }));

        let extra = serde_json::json!({
            "unsignedTransaction": file.unsigned_transaction,
            "chainId": file.chain_id,
            "note": "x",
        });
        std::fs::write(&path, extra.to_string()).unwrap();
        assert_matches!(read_unsigned(&path), Err(TransferFileError::Json { .. }));

        std::fs::write(&path, r#"{"chainId": "560048"}"#).unwrap();
        assert_matches!(read_unsigned(&path), Err(TransferFileError::Json { .. }));
    }

    #[test]
    fn rejects_garbage_payloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signed_txn.json");

        std::fs::write(&path, r#"{"signedTransaction": "zz"}"#).unwrap();
        assert_matches!(read_signed(&path), Err(TransferFileError::Hex { .. }));

        std::fs::write(&path, r#"{"signedTransaction": "c0"}"#).unwrap();
        assert_matches!(read_signed(&path), Err(TransferFileError::Decode { .. }));

        assert_matches!(
            read_signed(&dir.path().join("missing.json")),
            Err(TransferFileError::Read { .. })
        );
    }

    #[test]
    fn write_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unsigned_txn.json");
        std::fs::write(&path, "stale").unwrap();
        write_unsigned(&path, &tx()).unwrap();
        assert!(read_unsigned(&path).is_ok());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    fn write_raw_unsigned(path: &Path, envelope: &TxEnvelope, chain_id: u64) {
        let file = UnsignedTransferFile {
            unsigned_transaction: encode_envelope(envelope),
            chain_id: chain_id.to_string(),
        };
        std::fs::write(path, serde_json::to_string(&file).unwrap()).unwrap();
    }

    #[test]
    fn rejects_authorization_for_another_chain_or_nonce() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unsigned_txn.json");
        let with_authorization = |chain_id: u64, nonce: u64| TxEip7702 {
            authorization_list: vec![unsigned(Authorization {
                chain_id: U256::from(chain_id),
                address: Address::repeat_byte(0x66),
                nonce,
            })],
            ..tx()
        };

        for (chain_id, nonce) in [(1, 12), (0, 12), (560048, 500), (560048, 11)] {
            write_unsigned(&path, &with_authorization(chain_id, nonce)).unwrap();
            assert_matches!(
                read_unsigned(&path),
                Err(TransferFileError::Malformed { .. }),
                "chain {chain_id}, nonce {nonce}"
            );
        }
    }

    #[test]
    fn rejects_signatures_in_unsigned_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unsigned_txn.json");
        let signer: PrivateKeySigner = KEY.parse().unwrap();
        let own = TxEip7702 {
            to: signer.address(),
            ..tx()
        };

        let fully_signed = crate::signer::sign_transaction(&signer, own.clone()).unwrap();
        write_unsigned(&path, fully_signed.tx()).unwrap();
        assert_matches!(
            read_unsigned(&path),
            Err(TransferFileError::Malformed { reason, .. }) if reason.contains("authorization")
        );

        let signature = signer.sign_hash_sync(&own.signature_hash()).unwrap();
        write_raw_unsigned(&path, &TxEnvelope::Eip7702(own.clone().into_signed(signature)), 560048);
        assert_matches!(
            read_unsigned(&path),
            Err(TransferFileError::Malformed { reason, .. }) if reason.contains("already signed")
        );
    }
}
