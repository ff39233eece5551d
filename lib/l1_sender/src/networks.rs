use alloy::primitives::TxHash;

/// Chain with a known block explorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownNetwork {
    pub chain_id: u64,
    pub name: &'static str,
    pub explorer_url: &'static str,
}

pub const KNOWN_NETWORKS: &[KnownNetwork] = &[
    KnownNetwork {
        chain_id: 1,
        name: "mainnet",
        explorer_url: "https://etherscan.io",
    },
    KnownNetwork {
        chain_id: 17000,
        name: "holesky",
        explorer_url: "https://holesky.etherscan.io",
    },
    KnownNetwork {
        chain_id: 11155111,
        name: "sepolia",
        explorer_url: "https://sepolia.etherscan.io",
    },
    KnownNetwork {
        chain_id: 560048,
        name: "hoodi",
        explorer_url: "https://hoodi.etherscan.io",
    },
];

pub fn known_network(chain_id: u64) -> Option<&'static KnownNetwork> {
    KNOWN_NETWORKS.iter().find(|network| network.chain_id == chain_id)
}

pub fn network_name(chain_id: u64) -> &'static str {
    known_network(chain_id).map_or("unknown", |network| network.name)
}

/// Explorer base URL: the configured one if any, else the built-in one for
/// the chain.
pub fn explorer_base(chain_id: u64, configured: Option<&str>) -> Option<String> {
    configured
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(|url| url.trim_end_matches('/').to_owned())
        .or_else(|| known_network(chain_id).map(|network| network.explorer_url.to_owned()))
}

pub fn tx_link(explorer_base: &str, tx_hash: &TxHash) -> String {
    format!("{explorer_base}/tx/{tx_hash}")
}
