use crate::authorization::AuthorizationPlan;
use crate::error::SendError;
use crate::payload::BatchPayload;
use crate::rpc_read;
use alloy::consensus::TxEip7702;
use alloy::eips::eip7702::SignedAuthorization;
use alloy::primitives::{Address, U256};
use alloy::providers::{DynProvider, Provider};
use std::time::Duration;

/// Fee caps of the batch transaction, in wei.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeCaps {
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
}

impl FeeCaps {
    /// Keeps the envelope valid: the fee cap is raised to the tip if the
    /// network suggests a tip above it.
    pub fn new(max_fee_per_gas: u128, max_priority_fee_per_gas: u128) -> Self {
        if max_priority_fee_per_gas > max_fee_per_gas {
            tracing::warn!(
                max_fee_per_gas,
                max_priority_fee_per_gas,
                "suggested priority fee exceeds suggested gas price, raising maxFeePerGas"
            );
        }
        Self {
            max_fee_per_gas: max_fee_per_gas.max(max_priority_fee_per_gas),
            max_priority_fee_per_gas,
        }
    }
}

/// Reads the suggested fee cap (`eth_gasPrice`) and tip (`eth_maxPriorityFeePerGas`).
pub async fn suggest_fees(provider: &DynProvider, rpc_timeout: Duration) -> Result<FeeCaps, SendError> {
    let gas_price = rpc_read("failed to fetch gas price", rpc_timeout, provider.get_gas_price()).await?;
    let tip = rpc_read(
        "failed to fetch max priority fee",
        rpc_timeout,
        provider.get_max_priority_fee_per_gas(),
    )
    .await?;
    tracing::debug!(gas_price, tip, "fetched fee suggestions");
    Ok(FeeCaps::new(gas_price, tip))
}

/// Combines the pieces into an EIP-7702 transaction.
///
/// The transaction is addressed to the sender itself: once the authorization
/// is applied the sender's account runs the delegate's code. The authorization
/// is embedded with a zero signature and signed later.
pub fn assemble(
    chain_id: u64,
    sender: Address,
    plan: AuthorizationPlan,
    payload: BatchPayload,
    fees: FeeCaps,
    gas_limit: u64,
) -> TxEip7702 {
    TxEip7702 {
        chain_id,
        nonce: plan.tx_nonce,
        gas_limit,
        max_fee_per_gas: fees.max_fee_per_gas,
        max_priority_fee_per_gas: fees.max_priority_fee_per_gas,
        to: sender,
        value: payload.value,
        access_list: Default::default(),
        authorization_list: vec![unsigned(plan.authorization)],
        input: payload.call_data,
    }
}

pub(crate) fn unsigned(authorization: alloy::eips::eip7702::Authorization) -> SignedAuthorization {
    SignedAuthorization::new_unchecked(authorization, 0, U256::ZERO, U256::ZERO)
}
