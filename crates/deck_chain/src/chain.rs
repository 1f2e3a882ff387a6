use std::fmt;
use std::str::FromStr;

use deck_core::DeckError;
use serde::{Deserialize, Serialize};

/// Stored chain ids with this prefix belong to the Solana family.
pub const SOLANA_PREFIX: &str = "solana:";

/// Execution model behind a chain id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainFamily {
    Evm,
    Solana,
}

impl fmt::Display for ChainFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChainFamily::Evm => "EVM",
            ChainFamily::Solana => "Solana",
        })
    }
}

/// A deployment's target chain, parsed once from its stored string form.
///
/// `"8453"` is an EVM chain id; `"solana:mainnet-beta"` names a Solana
/// cluster.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChainId {
    Evm(u64),
    Solana(String),
}

impl ChainId {
    pub fn family(&self) -> ChainFamily {
        match self {
            ChainId::Evm(_) => ChainFamily::Evm,
            ChainId::Solana(_) => ChainFamily::Solana,
        }
    }

    /// Human-readable name for well-known networks.
    pub fn label(&self) -> String {
        match self {
            ChainId::Evm(1) => "Ethereum Mainnet".into(),
            ChainId::Evm(10) => "OP Mainnet".into(),
            ChainId::Evm(56) => "BNB Smart Chain".into(),
            ChainId::Evm(137) => "Polygon".into(),
            ChainId::Evm(8453) => "Base Mainnet".into(),
            ChainId::Evm(42161) => "Arbitrum One".into(),
            ChainId::Evm(84532) => "Base Sepolia".into(),
            ChainId::Evm(11155111) => "Sepolia".into(),
            ChainId::Evm(id) => format!("EVM chain {id}"),
            ChainId::Solana(cluster) => format!("Solana {cluster}"),
        }
    }
}

impl FromStr for ChainId {
    type Err = DeckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(cluster) = trimmed.strip_prefix(SOLANA_PREFIX) {
            if cluster.is_empty() {
                return Err(DeckError::Config(format!("'{s}' names no Solana cluster")));
            }
            return Ok(ChainId::Solana(cluster.to_string()));
        }
        trimmed
            .parse::<u64>()
            .map(ChainId::Evm)
            .map_err(|_| DeckError::Config(format!("'{s}' is not a valid chain id")))
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainId::Evm(id) => write!(f, "{id}"),
            ChainId::Solana(cluster) => write!(f, "{SOLANA_PREFIX}{cluster}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_evm_ids() {
        assert_eq!("8453".parse::<ChainId>().unwrap(), ChainId::Evm(8453));
        assert_eq!(" 1 ".parse::<ChainId>().unwrap(), ChainId::Evm(1));
        assert_eq!(ChainId::Evm(1).family(), ChainFamily::Evm);
    }

    #[test]
    fn parses_solana_clusters() {
        let id: ChainId = "solana:devnet".parse().unwrap();
        assert_eq!(id, ChainId::Solana("devnet".into()));
        assert_eq!(id.family(), ChainFamily::Solana);
        assert_eq!(id.to_string(), "solana:devnet");
    }

    #[test]
    fn rejects_malformed_ids() {
        assert!("".parse::<ChainId>().is_err());
        assert!("solana:".parse::<ChainId>().is_err());
        assert!("0x2105".parse::<ChainId>().is_err());
        assert!("base".parse::<ChainId>().is_err());
    }

    #[test]
    fn labels() {
        assert_eq!(ChainId::Evm(8453).label(), "Base Mainnet");
        assert_eq!(ChainId::Evm(999).label(), "EVM chain 999");
        assert_eq!(ChainId::Solana("devnet".into()).label(), "Solana devnet");
        assert_eq!(ChainFamily::Solana.to_string(), "Solana");
    }
}
