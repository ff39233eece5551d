use crate::error::EncodingError;
use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;
use pectra_batch_contract_interface::IPectraBatch;
use pectra_batch_types::{ExitRequest, Operation, ValidatorPubkey};

/// Call data, value and delegation target of a batch transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPayload {
    pub call_data: Bytes,
    pub value: U256,
    /// Address the sender's account is delegated to by the authorization.
    /// Zero address clears an existing delegation.
    pub delegate: Address,
}

/// Encodes `operation` as a call to the batch contract at `contract`.
///
/// `fee_per_validator` is ignored for [`Operation::UnsetCode`], which carries no
/// call data and no value.
pub fn encode(
    operation: &Operation,
    contract: Address,
    fee_per_validator: U256,
) -> Result<BatchPayload, EncodingError> {
    let call_data = match operation {
        Operation::Switch { validators } => IPectraBatch::batchSwitchCall {
            pubkeys: validators.iter().map(ValidatorPubkey::to_abi_bytes).collect(),
        }
        .abi_encode(),
        Operation::Consolidate { sources, target } => IPectraBatch::batchConsolidationCall {
            sourcePubkeys: sources.iter().map(ValidatorPubkey::to_abi_bytes).collect(),
            targetPubkey: target.to_abi_bytes(),
        }
        .abi_encode(),
        Operation::Exit { entries } => IPectraBatch::batchELExitCall {
            data: entries
                .iter()
                .map(|(key, request)| exit_entry(key, request))
                .collect(),
        }
        .abi_encode(),
        Operation::UnsetCode => {
            return Ok(BatchPayload {
                call_data: Bytes::new(),
                value: U256::ZERO,
                delegate: Address::ZERO,
            });
        }
    };

    let count = operation.validator_count();
    let value = fee_per_validator
        .checked_mul(U256::from(count))
        .ok_or(EncodingError::ValueOverflow {
            count,
            fee_per_validator,
        })?;

    Ok(BatchPayload {
        call_data: call_data.into(),
        value,
        delegate: contract,
    })
}

/// `[pubkey, amount (8 bytes, big-endian), flag (0x01 full exit, 0x00 partial)]`
fn exit_entry(key: &ValidatorPubkey, request: &ExitRequest) -> [Bytes; 3] {
    [
        key.to_abi_bytes(),
        Bytes::copy_from_slice(&request.amount_gwei.to_be_bytes()),
        Bytes::from(vec![u8::from(request.is_full_exit())]),
    ]
}

/// Narrows an exit amount read from user input to the 8-byte amount field.
/// Fractional, negative and oversized amounts are rejected, never truncated.
pub fn exit_amount(key: &str, amount: &serde_json::Number) -> Result<u64, EncodingError> {
    amount
        .as_u64()
        .ok_or_else(|| EncodingError::AmountOutOfRange {
            key: key.to_owned(),
            amount: amount.to_string(),
        })
}
