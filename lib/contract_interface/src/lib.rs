use alloy::primitives::{Address, U256};
use alloy::providers::Provider;

alloy::sol! {
    /// Batch contract executing validator requests for many validators in one call.
    /// Invoked on the sender's own account through an EIP-7702 delegation.
    #[sol(rpc)]
    interface IPectraBatch {
        function batchSwitch(bytes[] calldata pubkeys) external payable;
        function batchConsolidation(bytes[] calldata sourcePubkeys, bytes calldata targetPubkey) external payable;
        function batchELExit(bytes[3][] calldata data) external payable;
        function getConsolidationFee() external view returns (uint256);
        function getExitFee() external view returns (uint256);
    }
}

/// Prefix of the account code installed by an EIP-7702 delegation.
pub const DELEGATION_PREFIX: [u8; 3] = [0xef, 0x01, 0x00];

/// Returns the delegate of an account given its code, if the code is a
/// delegation designator.
pub fn delegated_to(code: &[u8]) -> Option<Address> {
    (code.len() == 23 && code.starts_with(&DELEGATION_PREFIX))
        .then(|| Address::from_slice(&code[3..]))
}

/// Per-validator fee charged by the system contracts behind the batch contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeKind {
    /// Fee of the consolidation request contract, also charged for switches.
    Consolidation,
    /// Fee of the withdrawal request contract.
    Exit,
}

impl FeeKind {
    pub const fn getter_name(self) -> &'static str {
        match self {
            Self::Consolidation => "getConsolidationFee",
            Self::Exit => "getExitFee",
        }
    }
}

/// Read-only view of a deployed batch contract.
#[derive(Debug, Clone)]
pub struct BatchContract<P> {
    instance: IPectraBatch::IPectraBatchInstance<P>,
}

impl<P: Provider> BatchContract<P> {
    pub fn new(address: Address, provider: P) -> Self {
        Self {
            instance: IPectraBatch::new(address, provider),
        }
    }

    pub fn address(&self) -> &Address {
        self.instance.address()
    }

    /// Current fee per validator, as quoted by the contract.
    pub async fn fee(&self, kind: FeeKind) -> alloy::contract::Result<U256> {
        let fee = match kind {
            FeeKind::Consolidation => self.instance.getConsolidationFee().call().await?,
            FeeKind::Exit => self.instance.getExitFee().call().await?,
        };
        tracing::debug!(getter = kind.getter_name(), %fee, "fetched fee from batch contract");
        Ok(fee)
    }
}
