//! Helpers shared by the end-to-end tests.

use alloy::primitives::{Bytes, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::mock::Asserter;
use std::path::{Path, PathBuf};

/// First anvil development key.
pub const SENDER_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

pub fn sender() -> anyhow::Result<PrivateKeySigner> {
    Ok(SENDER_KEY.parse()?)
}

/// Provider answering from `asserter`'s queue, without any fillers.
pub fn mocked_provider(asserter: &Asserter) -> DynProvider {
    ProviderBuilder::new()
        .disable_recommended_fillers()
        .connect_mocked_client(asserter.clone())
        .erased()
}

/// Queues the responses of one pipeline run for an operation that pays a fee,
/// in call order: chain id, fee, pending nonce, gas price, priority fee.
pub fn queue_pipeline_responses(asserter: &Asserter, chain_id: u64, fee: u64, nonce: u64) {
    asserter.push_success(&format!("{chain_id:#x}"));
    asserter.push_success(&Bytes::from(U256::from(fee).to_be_bytes::<32>().to_vec()));
    asserter.push_success(&format!("{nonce:#x}"));
    asserter.push_success(&"0x77359400");
    asserter.push_success(&"0x3b9aca00");
}

/// Distinct, well-formed validator keys.
pub fn validator_keys(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("0x{:096x}", i + 1)).collect()
}

/// Writes an operations file with the given sections into `dir`.
pub fn write_operations_file(dir: &Path, sections: serde_json::Value) -> anyhow::Result<PathBuf> {
    let mut config = serde_json::json!({
        "rpcUrl": "http://localhost:8545",
        "pectraBatchContract": "0x0000000000000000000000000000000000000042",
    });
    if let (Some(config), Some(sections)) = (config.as_object_mut(), sections.as_object()) {
        config.extend(sections.clone());
    }
    let path = dir.join("config.json");
    std::fs::write(&path, serde_json::to_string_pretty(&config)?)?;
    Ok(path)
}
