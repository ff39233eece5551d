/// Input rejected before it can reach the network.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid public key length for {key}: expected {expected} hex characters, got {actual}")]
    PubkeyLength {
        key: String,
        expected: usize,
        actual: usize,
    },
    #[error("public key {key} contains non-hexadecimal characters")]
    PubkeyNotHex { key: String },
    #[error("no validators specified for {operation} operation")]
    Empty { operation: &'static str },
    #[error("a maximum of {limit} validators can be processed by {operation} at a time, got {actual}")]
    TooManyValidators {
        operation: &'static str,
        limit: usize,
        actual: usize,
    },
    #[error("target validator ({target}) cannot be in the list of source validators")]
    TargetAmongSources { target: String },
    #[error(
        "validator {key} has zero amount but confirmFullExit is not set; \
         set confirmFullExit to true to request a full exit"
    )]
    ZeroAmountWithoutConfirmation { key: String },
    #[error(
        "validator {key} requests {amount_gwei} gwei but confirmFullExit is set; \
         full exits must use amount 0"
    )]
    ConfirmationWithNonZeroAmount { key: String, amount_gwei: u64 },
    #[error("conflicting exit requests for validator {key}")]
    ConflictingExitRequests { key: String },
    #[error("invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },
    #[error("signed transaction targets chain {transaction} but the RPC endpoint serves chain {endpoint}")]
    ChainIdMismatch { transaction: u64, endpoint: u64 },
}
