//! Display names for well-known chains.

use serde_json::Value;

/// Name shown for chains missing from [`NETWORKS`].
pub const UNKNOWN_NETWORK: &str = "Unknown Network";

/// A chain id and its display name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NetworkEntry {
    pub chain_id: u64,
    pub name: &'static str,
}

const fn entry(chain_id: u64, name: &'static str) -> NetworkEntry {
    NetworkEntry { chain_id, name }
}

pub const NETWORKS: &[NetworkEntry] = &[
    entry(1, "Ethereum Mainnet"),
    entry(5, "Goerli Testnet"),
    entry(11155111, "Sepolia Testnet"),
    entry(137, "Polygon Mainnet"),
    entry(80001, "Mumbai Testnet"),
    entry(56, "BSC Mainnet"),
    entry(97, "BSC Testnet"),
    entry(42161, "Arbitrum One"),
    entry(10, "Optimism"),
    entry(43114, "Avalanche C-Chain"),
    entry(66, "OKX Chain Mainnet"),
    entry(65, "OKX Chain Testnet"),
];

/// Returns the display name of `chain_id`, or [`UNKNOWN_NETWORK`].
pub fn network_name(chain_id: u64) -> &'static str {
    NETWORKS
        .iter()
        .find(|network| network.chain_id == chain_id)
        .map(|network| network.name)
        .unwrap_or(UNKNOWN_NETWORK)
}

/// Parses a chain id as reported by a wallet.
///
/// `eth_chainId` and `chainChanged` use `0x`-prefixed hex strings, but some wallets report
/// decimal strings or plain numbers.
pub fn parse_chain_id(value: &Value) -> Option<u64> {
    match value {
        Value::String(s) => parse_chain_id_str(s),
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

/// String flavor of [`parse_chain_id`].
pub fn parse_chain_id_str(s: &str) -> Option<u64> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()
    } else {
        s.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn known_networks() {
        for network in NETWORKS {
            assert_eq!(network_name(network.chain_id), network.name);
        }
        assert_eq!(network_name(137), "Polygon Mainnet");
    }

    #[test]
    fn unknown_network() {
        assert_eq!(network_name(31337), "Unknown Network");
        assert_eq!(network_name(0), UNKNOWN_NETWORK);
    }

    #[test]
    fn parses_chain_ids() {
        assert_eq!(parse_chain_id(&json!("0x1")), Some(1));
        assert_eq!(parse_chain_id(&json!("0x89")), Some(137));
        assert_eq!(parse_chain_id(&json!("137")), Some(137));
        assert_eq!(parse_chain_id(&json!(42161)), Some(42161));
        assert_eq!(parse_chain_id(&json!("0xzz")), None);
        assert_eq!(parse_chain_id(&json!(null)), None);
    }
}
