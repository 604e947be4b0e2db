use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Code hashes (base64) of the recognized standard wallet contract
/// revisions. Addresses whose most recent state carries any other hash are
/// treated as contracts, relays or bots and do not count as users.
const STANDARD_WALLET_CODE_HASHES: [&str; 10] = [
    "/rX/aCDi/w2Ug+fg1iyBfYRniftK5YDIeIZtlZ2r1cA=", // wallet v4 r2
    "hNr6RJ+Ypph3ibojI1gHK8D3bcRSQAKl0JGLmnXS1Zk=", // wallet v3 r2
    "thBBpYp5gLlG6PueGY48kE0keZ/6NldOpCUcQaVm9YE=", // wallet v3 r1
    "ZN1UgFUixb6KnbWc6gEFzPDQh4bKeb64y3nogKjXMi0=", // wallet v4 r1
    "MZrVLsmoWWIPil2Ww2CJ5nw29OOTAdBQ224VCXAZzpE=", // wallet v5 beta
    "WHzHie/xyE9G7DeX5F/ICaFP9a4k8eDHpqmcydyQYf8=", // wallet v1 r3
    "XJpeaMEI4YchoHxC+ZVr+zmtd+xtYktgxXbsiO7mUyk=", // wallet v2 r1
    "/pUw0yQ4Uwg+8u8LTCkIwKv2+hwx6iQ6rKpb+MfXU/E=", // wallet v2 r2
    "oM/CxIruFqJx8s/AtzgtgXVs7LEBfQd/qqs7tgL2how=", // wallet v1 r1
    "1JAvzJ+tdGmPqONTIgpo2g3PcuMryy657gQhfBfTBiw=", // wallet v1 r2
];

/// Anti-fraud filter inputs, loaded as data so the composer stays
/// ecosystem-agnostic and the filters are testable with fakes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Addresses excluded from all aggregation.
    pub banned_addresses: BTreeSet<String>,
    /// Allowlist for the wallet-type filter.
    pub wallet_code_hashes: BTreeSet<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            banned_addresses: BTreeSet::new(),
            wallet_code_hashes: STANDARD_WALLET_CODE_HASHES
                .iter()
                .map(|hash| hash.to_string())
                .collect(),
        }
    }
}

impl FilterConfig {
    pub fn load_from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }
}
