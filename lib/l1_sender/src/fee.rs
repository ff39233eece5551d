use crate::error::SendError;
use crate::rpc_read;
use alloy::primitives::U256;
use alloy::providers::Provider;
use pectra_batch_contract_interface::{BatchContract, FeeKind};
use pectra_batch_types::Operation;
use std::time::Duration;

/// Fee the batch contract charges per validator for `operation`, or `None`
/// when the operation pays no fee.
pub const fn fee_kind(operation: &Operation) -> Option<FeeKind> {
    match operation {
        Operation::Switch { .. } | Operation::Consolidate { .. } => Some(FeeKind::Consolidation),
        Operation::Exit { .. } => Some(FeeKind::Exit),
        Operation::UnsetCode => None,
    }
}

/// Reads the per-validator fee for `operation` from the batch contract.
///
/// A fee of zero is replaced with 1 wei: the system contracts never charge less.
pub async fn fee_per_validator<P: Provider>(
    contract: &BatchContract<P>,
    operation: &Operation,
    rpc_timeout: Duration,
) -> Result<U256, SendError> {
    let Some(kind) = fee_kind(operation) else {
        return Ok(U256::ZERO);
    };
    let fee = rpc_read(
        "failed to read fee from batch contract",
        rpc_timeout,
        contract.fee(kind),
    )
    .await?;

    if fee.is_zero() {
        tracing::warn!(
            getter = kind.getter_name(),
            contract = %contract.address(),
            "batch contract reported zero fee, defaulting to 1 wei per validator"
        );
        return Ok(U256::from(1));
    }
    Ok(fee)
}
