use crate::error::SendError;
use crate::rpc_read;
use alloy::eips::eip7702::Authorization;
use alloy::primitives::{Address, U256};
use alloy::providers::{DynProvider, Provider};
use std::time::Duration;

/// Unsigned delegation for the batch transaction, together with the nonce the
/// transaction itself uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationPlan {
    pub authorization: Authorization,
    pub tx_nonce: u64,
}

/// Reads the sender's pending nonce and builds the authorization delegating
/// the sender's account to `delegate`.
///
/// The sender is also the transaction's signer, so its nonce is bumped by the
/// transaction before the authorization list is processed: the authorization
/// has to carry `pending + 1`.
pub async fn build_authorization(
    provider: &DynProvider,
    chain_id: u64,
    sender: Address,
    delegate: Address,
    rpc_timeout: Duration,
) -> Result<AuthorizationPlan, SendError> {
    let pending = rpc_read(
        "failed to fetch pending nonce of the sender",
        rpc_timeout,
        provider.get_transaction_count(sender).pending(),
    )
    .await?;
    let authorization_nonce = pending.checked_add(1).ok_or_else(|| {
        SendError::network(
            "RPC endpoint reported an invalid nonce",
            format!("pending nonce {pending} of {sender} cannot be incremented"),
        )
    })?;
    tracing::debug!(%sender, %delegate, pending, "built authorization");

    Ok(AuthorizationPlan {
        authorization: Authorization {
            chain_id: U256::from(chain_id),
            address: delegate,
            nonce: authorization_nonce,
        },
        tx_nonce: pending,
    })
}
