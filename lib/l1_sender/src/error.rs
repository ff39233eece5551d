use alloy::primitives::TxHash;
use pectra_batch_types::ValidationError;
use std::path::PathBuf;
use std::time::Duration;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure to turn a validated operation into call data and value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    #[error(
        "exit amount {amount} for validator {key} does not fit into the 8-byte amount field"
    )]
    AmountOutOfRange { key: String, amount: String },
    #[error("total value overflows: {count} validators at {fee_per_validator} wei each")]
    ValueOverflow {
        count: usize,
        fee_per_validator: alloy::primitives::U256,
    },
}

/// Failure to read, parse or write a transfer file.
#[derive(Debug, thiserror::Error)]
pub enum TransferFileError {
    #[error("failed to read transfer file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write transfer file {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse transfer file {path}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("transfer file {path} does not contain valid hex")]
    Hex {
        path: PathBuf,
        #[source]
        source: alloy::hex::FromHexError,
    },
    #[error("transfer file {path} does not contain a valid transaction")]
    Decode {
        path: PathBuf,
        #[source]
        source: alloy::eips::eip2718::Eip2718Error,
    },
    #[error("transfer file {path} is malformed: {reason}")]
    Malformed { path: PathBuf, reason: String },
}

/// Error of the transaction pipeline.
///
/// Submission success and execution success are reported separately:
/// [`SendError::ConfirmationTimeout`] and [`SendError::ConfirmationUnknown`]
/// are raised after submission and mean the outcome is unknown, while
/// [`SendError::TransactionReverted`] is a known on-chain failure.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error("{context}")]
    Network {
        context: &'static str,
        #[source]
        source: BoxError,
    },
    #[error("{context}")]
    Signing {
        context: &'static str,
        #[source]
        source: BoxError,
    },
    #[error("transaction {tx_hash} was mined but reverted")]
    TransactionReverted { tx_hash: TxHash },
    #[error(
        "transaction {tx_hash} was submitted but not mined within {timeout:?}; \
         outcome unknown, check the block explorer"
    )]
    ConfirmationTimeout { tx_hash: TxHash, timeout: Duration },
    #[error(
        "transaction {tx_hash} was submitted but its receipt could not be fetched; \
         outcome unknown, check the block explorer before resubmitting"
    )]
    ConfirmationUnknown {
        tx_hash: TxHash,
        #[source]
        source: BoxError,
    },
    #[error(transparent)]
    FileIo(#[from] TransferFileError),
}

impl SendError {
    pub(crate) fn network(context: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Network {
            context,
            source: source.into(),
        }
    }

    pub(crate) fn signing(context: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Signing {
            context,
            source: source.into(),
        }
    }
}
