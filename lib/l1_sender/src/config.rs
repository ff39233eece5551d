use std::time::Duration;

use smart_config::{DescribeConfig, DeserializeConfig};

/// Configuration of the transaction pipeline.
#[derive(Clone, Debug, DescribeConfig, DeserializeConfig)]
#[config(derive(Default))]
pub struct SenderConfig {
    /// Gas limit of the batch transaction.
    #[config(default_t = 30_000_000)]
    pub gas_limit: u64,
    /// Upper bound for every read-only RPC lookup (chain id, nonce, fees).
    #[config(default_t = Duration::from_secs(30))]
    pub rpc_timeout: Duration,
    /// Upper bound for submitting a signed transaction.
    #[config(default_t = Duration::from_secs(30))]
    pub broadcast_timeout: Duration,
    /// How long to wait for the transaction to be mined after submission.
    #[config(default_t = Duration::from_secs(600))]
    pub confirmation_timeout: Duration,
    /// Confirmations to wait for once the transaction is included in a block.
    #[config(default_t = 1)]
    pub required_confirmations: u64,
    /// Where airgapped mode writes the unsigned transaction.
    #[config(default_t = "unsigned_txn.json".into())]
    pub unsigned_tx_path: String,
    /// Where the offline signer writes the signed transaction.
    #[config(default_t = "signed_txn.json".into())]
    pub signed_tx_path: String,
}
