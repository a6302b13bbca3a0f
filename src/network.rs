use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::SdkError;

/// Chain ids understood by the simulation platform.
///
/// Ids without a named variant are kept as [`Network::Other`] so that mapping
/// remote records never fails on a chain this crate does not know yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u64", into = "u64")]
pub enum Network {
    Mainnet,
    Ropsten,
    Rinkeby,
    Goerli,
    Optimism,
    Cronos,
    Bsc,
    Gnosis,
    Polygon,
    Fantom,
    Moonbeam,
    Base,
    Arbitrum,
    Avalanche,
    Linea,
    PolygonAmoy,
    BaseSepolia,
    ArbitrumSepolia,
    Sepolia,
    OptimismSepolia,
    Other(u64),
}

const KNOWN_NETWORKS: &[(Network, u64)] = &[
    (Network::Mainnet, 1),
    (Network::Ropsten, 3),
    (Network::Rinkeby, 4),
    (Network::Goerli, 5),
    (Network::Optimism, 10),
    (Network::Cronos, 25),
    (Network::Bsc, 56),
    (Network::Gnosis, 100),
    (Network::Polygon, 137),
    (Network::Fantom, 250),
    (Network::Moonbeam, 1284),
    (Network::Base, 8453),
    (Network::Arbitrum, 42161),
    (Network::Avalanche, 43114),
    (Network::Linea, 59144),
    (Network::PolygonAmoy, 80002),
    (Network::BaseSepolia, 84532),
    (Network::ArbitrumSepolia, 421614),
    (Network::Sepolia, 11155111),
    (Network::OptimismSepolia, 11155420),
];

impl Network {
    pub fn id(self) -> u64 {
        if let Network::Other(id) = self {
            return id;
        }
        KNOWN_NETWORKS
            .iter()
            .find(|(network, _)| *network == self)
            .map(|(_, id)| *id)
            .unwrap_or_default()
    }

    /// Decimal string form used by endpoints that take network ids as strings.
    pub fn id_string(self) -> String {
        self.id().to_string()
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl From<Network> for u64 {
    fn from(network: Network) -> Self {
        network.id()
    }
}

impl From<u64> for Network {
    fn from(id: u64) -> Self {
        KNOWN_NETWORKS
            .iter()
            .find(|(_, known)| *known == id)
            .map(|(network, _)| *network)
            .unwrap_or(Network::Other(id))
    }
}

impl FromStr for Network {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Network::from)
            .map_err(|_| SdkError::invalid_arguments(format!("Invalid network id: '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_ids_round_trip() {
        assert_eq!(Network::Mainnet.id(), 1);
        assert_eq!(Network::Sepolia.id_string(), "11155111");
        assert_eq!(Network::from(137), Network::Polygon);
        assert_eq!(Network::from(3), Network::Ropsten);
        assert_eq!(Network::from(2), Network::Other(2));
        assert_eq!(Network::Other(2).id(), 2);
    }

    #[test]
    fn test_network_parsing() {
        assert_eq!("42161".parse::<Network>().unwrap(), Network::Arbitrum);
        assert_eq!(" 1 ".parse::<Network>().unwrap(), Network::Mainnet);
        assert!("mainnet".parse::<Network>().is_err());
        assert!("".parse::<Network>().is_err());
    }

    #[test]
    fn test_network_serializes_as_number() {
        let json = serde_json::to_string(&Network::Base).unwrap();
        assert_eq!(json, "8453");
        let parsed: Network = serde_json::from_str("10").unwrap();
        assert_eq!(parsed, Network::Optimism);
    }
}
