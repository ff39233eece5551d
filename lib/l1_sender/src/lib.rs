//! Turns a validated [`Operation`] into an EIP-7702 batch transaction and
//! either broadcasts it or hands it to the offline signer.

pub mod assembler;
pub mod authorization;
pub mod broadcast;
pub mod config;
pub mod error;
pub mod fee;
pub mod networks;
pub mod payload;
pub mod signer;
pub mod transfer;

use alloy::primitives::Address;
use alloy::providers::{DynProvider, Provider};
use pectra_batch_contract_interface::BatchContract;
use pectra_batch_types::Operation;
use std::future::IntoFuture;
use std::path::PathBuf;
use std::time::Duration;

pub use broadcast::{Confirmation, broadcast_transfer_file};
pub use config::SenderConfig;
pub use error::{EncodingError, SendError, TransferFileError};
pub use signer::{SigningMode, sign_transfer_file};

/// Result of a successful pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Signed online, broadcast and mined.
    Confirmed(Confirmation),
    /// Written for the offline signer, nothing was broadcast.
    UnsignedWritten { path: PathBuf, chain_id: u64 },
}

/// Runs the whole pipeline for `operation`: fee lookup, encoding,
/// authorization, assembly, then signing and broadcasting or writing the
/// unsigned transaction, depending on `mode`.
///
/// RPC calls are made one after another, in this order: chain id, fee, pending
/// nonce, gas price, priority fee.
pub async fn execute_operation(
    provider: &DynProvider,
    batch_contract: Address,
    operation: &Operation,
    mode: &SigningMode,
    explorer_url: Option<&str>,
    config: &SenderConfig,
) -> Result<Outcome, SendError> {
    let sender = mode.sender();
    let chain_id = read_chain_id(provider, config.rpc_timeout).await?;
    tracing::info!(
        operation = operation.name(),
        validators = operation.validator_count(),
        %sender,
        chain_id,
        network = networks::network_name(chain_id),
        "preparing batch transaction"
    );

    let contract = BatchContract::new(batch_contract, provider.clone());
    let fee = fee::fee_per_validator(&contract, operation, config.rpc_timeout).await?;
    let payload = payload::encode(operation, batch_contract, fee)?;
    tracing::info!(%fee, value = %payload.value, "encoded {operation}");

    let plan = authorization::build_authorization(
        provider,
        chain_id,
        sender,
        payload.delegate,
        config.rpc_timeout,
    )
    .await?;
    let fees = assembler::suggest_fees(provider, config.rpc_timeout).await?;
    let tx = assembler::assemble(chain_id, sender, plan, payload, fees, config.gas_limit);

    match mode {
        SigningMode::Online(signer) => {
            let signed = signer::sign_transaction(signer, tx)?;
            let explorer = networks::explorer_base(chain_id, explorer_url);
            let confirmation =
                broadcast::send_and_confirm(provider, &signed, explorer.as_deref(), config).await?;
            Ok(Outcome::Confirmed(confirmation))
        }
        SigningMode::Airgapped { path, .. } => {
            transfer::write_unsigned(path, &tx)?;
            tracing::info!(
                path = %path.display(),
                chain_id,
                nonce = tx.nonce,
                "wrote unsigned transaction, sign it offline and broadcast the result"
            );
            Ok(Outcome::UnsignedWritten {
                path: path.clone(),
                chain_id,
            })
        }
    }
}

pub(crate) async fn read_chain_id(provider: &DynProvider, rpc_timeout: Duration) -> Result<u64, SendError> {
    rpc_read("failed to fetch chain id", rpc_timeout, provider.get_chain_id()).await
}

/// Bounds a read-only RPC call by `timeout`; both a timeout and an RPC failure
/// become [`SendError::Network`] carrying `context`.
pub(crate) async fn rpc_read<F, T, E>(
    context: &'static str,
    timeout: Duration,
    call: F,
) -> Result<T, SendError>
where
    F: IntoFuture<Output = Result<T, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result.map_err(|err| SendError::network(context, err)),
        Err(elapsed) => Err(SendError::network(context, elapsed)),
    }
}
