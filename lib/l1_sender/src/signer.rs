use crate::error::SendError;
use crate::transfer;
use alloy::consensus::{SignableTransaction, Signed, TxEip7702};
use alloy::primitives::Address;
use alloy::signers::SignerSync;
use alloy::signers::local::PrivateKeySigner;
use secrecy::{ExposeSecret, SecretString};
use std::path::{Path, PathBuf};

/// How the batch transaction gets signed. Fixed for one invocation.
#[derive(Debug, Clone)]
pub enum SigningMode {
    /// Sign with a local key and broadcast right away.
    Online(PrivateKeySigner),
    /// Write the unsigned transaction to `path` for the offline signer.
    Airgapped { sender: Address, path: PathBuf },
}

impl SigningMode {
    pub fn online(private_key: &SecretString) -> Result<Self, SendError> {
        parse_private_key(private_key).map(Self::Online)
    }

    /// Account that sends the transaction and gets delegated.
    pub fn sender(&self) -> Address {
        match self {
            Self::Online(signer) => signer.address(),
            Self::Airgapped { sender, .. } => *sender,
        }
    }
}

/// Parses a hex private key, with or without the `0x` prefix.
pub fn parse_private_key(private_key: &SecretString) -> Result<PrivateKeySigner, SendError> {
    let raw = private_key.expose_secret().trim();
    raw.strip_prefix("0x")
        .unwrap_or(raw)
        .parse()
        .map_err(|err| SendError::signing("failed to parse private key", err))
}

/// Signs the single authorization and then the transaction with the same key.
///
/// The transaction must be addressed to the signer: the authorization is
/// only useful for the account that sends it.
pub fn sign_transaction(
    signer: &PrivateKeySigner,
    mut tx: TxEip7702,
) -> Result<Signed<TxEip7702>, SendError> {
    if tx.to != signer.address() {
        return Err(SendError::signing(
            "signing key does not belong to the sender",
            format!("key address {} differs from sender {}", signer.address(), tx.to),
        ));
    }
    let [authorization] = std::mem::take(&mut tx.authorization_list)
        .try_into()
        .map_err(|list: Vec<_>| {
            SendError::signing(
                "transaction must carry exactly one authorization",
                format!("found {} authorizations", list.len()),
            )
        })?;

    let authorization = authorization.strip_signature();
    let signature = signer
        .sign_hash_sync(&authorization.signature_hash())
        .map_err(|err| SendError::signing("failed to sign authorization", err))?;
    tx.authorization_list = vec![authorization.into_signed(signature)];

    let signature = signer
        .sign_hash_sync(&tx.signature_hash())
        .map_err(|err| SendError::signing("failed to sign transaction", err))?;
    Ok(tx.into_signed(signature))
}

/// Signs an unsigned transfer file and writes the signed one.
///
/// Runs entirely offline: nothing here needs or accepts a provider.
pub fn sign_transfer_file(
    signer: &PrivateKeySigner,
    input: &Path,
    output: &Path,
) -> Result<Signed<TxEip7702>, SendError> {
    let tx = transfer::read_unsigned(input)?;
    tracing::info!(
        chain_id = tx.chain_id,
        nonce = tx.nonce,
        sender = %tx.to,
        "loaded unsigned transaction"
    );
    let signed = sign_transaction(signer, tx)?;
    transfer::write_signed(output, &signed)?;
    tracing::info!(
        tx_hash = %signed.hash(),
        path = %output.display(),
        "wrote signed transaction"
    );
    Ok(signed)
}
