use crate::config::SenderConfig;
use crate::error::SendError;
use crate::networks::{explorer_base, network_name, tx_link};
use crate::{read_chain_id, rpc_read, transfer};
use alloy::consensus::{Signed, TxEip7702, TxEnvelope};
use alloy::eips::eip2718::Encodable2718;
use alloy::network::ReceiptResponse;
use alloy::primitives::{Address, TxHash};
use alloy::providers::{DynProvider, PendingTransactionError, Provider, WatchTxError};
use pectra_batch_contract_interface::delegated_to;
use pectra_batch_types::ValidationError;
use std::path::Path;
use std::time::Duration;

/// Mined and successful batch transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    pub explorer_link: Option<String>,
}

/// Submits `signed` and waits until it is mined or `confirmation_timeout`
/// elapses. At most one submission is made.
pub async fn send_and_confirm(
    provider: &DynProvider,
    signed: &Signed<TxEip7702>,
    explorer: Option<&str>,
    config: &SenderConfig,
) -> Result<Confirmation, SendError> {
    let encoded = TxEnvelope::Eip7702(signed.clone()).encoded_2718();
    let pending = tokio::time::timeout(
        config.broadcast_timeout,
        provider.send_raw_transaction(&encoded),
    )
    .await
    .map_err(|elapsed| SendError::network("transaction submission timed out", elapsed))?
    .map_err(|err| SendError::network("failed to submit transaction", err))?;

    let tx_hash = *pending.tx_hash();
    let explorer_link = explorer.map(|base| tx_link(base, &tx_hash));
    tracing::info!(
        %tx_hash,
        explorer = explorer_link.as_deref().unwrap_or("n/a"),
        "transaction submitted, waiting for confirmation"
    );

    let receipt = pending
        .with_required_confirmations(config.required_confirmations)
        .with_timeout(Some(config.confirmation_timeout))
        .get_receipt()
        .await
        .map_err(|err| match err {
            PendingTransactionError::TxWatcher(WatchTxError::Timeout) => {
                SendError::ConfirmationTimeout {
                    tx_hash,
                    timeout: config.confirmation_timeout,
                }
            }
            other => SendError::ConfirmationUnknown {
                tx_hash,
                source: other.into(),
            },
        })?;

    let mut confirmation = receipt_outcome(&receipt)?;
    confirmation.explorer_link = explorer_link;
    tracing::info!(
        %tx_hash,
        block_number = ?confirmation.block_number,
        gas_used = confirmation.gas_used,
        "transaction confirmed"
    );

    let tx = signed.tx();
    if let Some(authorization) = tx.authorization_list.first() {
        check_delegation(provider, tx.to, authorization.address, config.rpc_timeout).await;
    }
    Ok(confirmation)
}

/// Broadcasts a transaction produced by the offline signer.
///
/// The connected endpoint must serve the chain the transaction was signed for.
pub async fn broadcast_transfer_file(
    provider: &DynProvider,
    path: &Path,
    configured_explorer: Option<&str>,
    config: &SenderConfig,
) -> Result<Confirmation, SendError> {
    let signed = transfer::read_signed(path)?;
    let tx_chain_id = signed.tx().chain_id;
    let endpoint_chain_id = read_chain_id(provider, config.rpc_timeout).await?;
    if endpoint_chain_id != tx_chain_id {
        return Err(ValidationError::ChainIdMismatch {
            transaction: tx_chain_id,
            endpoint: endpoint_chain_id,
        }
        .into());
    }
    tracing::info!(
        chain_id = tx_chain_id,
        network = network_name(tx_chain_id),
        tx_hash = %signed.hash(),
        path = %path.display(),
        "broadcasting signed transaction"
    );

    let explorer = explorer_base(tx_chain_id, configured_explorer);
    // submission is bounded by a fixed ceiling regardless of configuration
    let config = SenderConfig {
        broadcast_timeout: BROADCAST_SUBMISSION_TIMEOUT,
        ..config.clone()
    };
    send_and_confirm(provider, &signed, explorer.as_deref(), &config).await
}

const BROADCAST_SUBMISSION_TIMEOUT: Duration = Duration::from_secs(30);

/// Maps a receipt to the pipeline outcome: a failed status means the
/// transaction was mined but reverted.
pub fn receipt_outcome<R: ReceiptResponse>(receipt: &R) -> Result<Confirmation, SendError> {
    let tx_hash = receipt.transaction_hash();
    if !receipt.status() {
        return Err(SendError::TransactionReverted { tx_hash });
    }
    Ok(Confirmation {
        tx_hash,
        block_number: receipt.block_number(),
        gas_used: receipt.gas_used(),
        explorer_link: None,
    })
}

/// Logs whether the sender's account ended up delegated as requested.
/// Best effort: failures to read the code are only logged.
async fn check_delegation(
    provider: &DynProvider,
    account: Address,
    expected: Address,
    rpc_timeout: Duration,
) {
    let code = match rpc_read(
        "failed to read account code",
        rpc_timeout,
        provider.get_code_at(account),
    )
    .await
    {
        Ok(code) => code,
        Err(err) => {
            tracing::warn!(%account, %err, "could not verify delegation");
            return;
        }
    };
    let actual = delegated_to(&code);
    let as_expected = match actual {
        Some(delegate) => delegate == expected,
        None => expected.is_zero() && code.is_empty(),
    };
    if as_expected {
        tracing::info!(%account, delegate = %expected, "account delegation verified");
    } else {
        tracing::warn!(
            %account,
            expected = %expected,
            actual = ?actual,
            "account code does not reflect the requested delegation"
        );
    }
}
