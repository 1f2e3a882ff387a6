pub mod chain;
pub mod client;
pub mod contracts;
pub mod evm;
pub mod factory;
pub mod rpc;
pub mod solana;

pub use chain::{ChainFamily, ChainId, SOLANA_PREFIX};
pub use client::{ChainClient, ContractReader, TxOutcome, TxStatus, TxWatcher, poll_outcome};
pub use contracts::{
    BatchConfigurationSource, Distributor, Erc20, FeeSettings, LockHook, LockPreset,
    OnChainConfiguration, OnChainStrategy, PenaltyHook, PenaltyWindow, parse_address,
};
pub use evm::{EvmClient, EvmReceipt};
pub use factory::ClientFactory;
pub use solana::{SignatureStatus, SolanaClient};
