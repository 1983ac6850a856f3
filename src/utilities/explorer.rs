use crate::models::session::Network;

pub fn explorer_base(network: &Network) -> &'static str {
    match network {
        Network::OptimismMainnet => "https://optimistic.etherscan.io",
        Network::OptimismSepolia => "https://sepolia-optimism.etherscan.io",
    }
}

/// User-facing inspection link for a transaction hash.
pub fn transaction_url(network: &Network, tx_hash: &str) -> String {
    format!("{}/tx/{}", explorer_base(network), tx_hash)
}
