//! ABI bindings and typed read wrappers for the distributor, its hooks and
//! the distributed ERC-20 token.
//!
//! Every wrapper is generic over [`ContractReader`] so tests can answer
//! calls from memory.

use std::str::FromStr;

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::{SolCall, sol};
use anyhow::Result;
use async_trait::async_trait;
use deck_core::DeckError;
use serde::Serialize;

use crate::client::{ChainClient, ContractReader};

sol! {
    struct HookStrategy {
        address hook;
        uint256 proportion;
    }

    struct BatchConfiguration {
        HookStrategy[] strategies;
        uint256 fallbackHook;
    }

    interface IDistributor {
        function token() external view returns (address);
        function vault() external view returns (address);
        function signer() external view returns (address);
        function active() external view returns (bool);
        function configurationId(bytes32 root) external view returns (bytes32);
        function getBatchConfiguration(bytes32 id) external view returns (BatchConfiguration memory config);
        function feeModes(bytes32 id) external view returns (uint8);
        function fixedFees(bytes32 id) external view returns (uint256);
        function singleTierFeeRates(bytes32 id) external view returns (uint256);
    }

    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function decimals() external view returns (uint8);
        function symbol() external view returns (string);
    }

    interface ILockHook {
        function streamPresets(bytes32 id) external view returns (
            uint64 startTime,
            uint64 cliffDuration,
            uint64 vestingDuration,
            uint64 pieceDuration,
            uint256 startUnlockPercentage,
            uint256 cliffUnlockPercentage,
            address lock,
            bool isFixedStart
        );
    }

    interface ILinearPenaltyHook {
        function penaltyConfigs(bytes32 id) external view returns (uint64 beginTime, uint64 endTime);
        function getPenalty(bytes32 id, uint256 amount) external view returns (uint256);
    }
}

/// Parse a `0x` address, reporting the offending field on failure.
pub fn parse_address(field: &str, value: &str) -> Result<Address, DeckError> {
    Address::from_str(value.trim())
        .map_err(|_| DeckError::Validation(format!("{field} '{value}' is not a valid address")))
}

/// Encode `call`, run it against `to` and decode the return tuple.
pub async fn read<C, R>(reader: &R, to: Address, call: C) -> Result<C::Return>
where
    C: SolCall + Send,
    R: ContractReader + ?Sized,
{
    let calldata = call.abi_encode();
    let output = reader.call(to, calldata.into()).await?;
    C::abi_decode_returns(&output, true)
        .map_err(|e| DeckError::Decode(format!("{} at {to}: {e}", C::SIGNATURE)).into())
}

// ---------------------------------------------------------------------------
// Domain shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OnChainStrategy {
    /// Lower-cased hex address.
    pub hook: String,
    pub proportion: U256,
}

/// What `getBatchConfiguration` reports for one configuration id. An empty
/// strategy list means nothing was ever set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnChainConfiguration {
    pub strategies: Vec<OnChainStrategy>,
    pub fallback_hook: U256,
}

impl From<BatchConfiguration> for OnChainConfiguration {
    fn from(raw: BatchConfiguration) -> Self {
        Self {
            strategies: raw
                .strategies
                .into_iter()
                .map(|s| OnChainStrategy {
                    hook: s.hook.to_string().to_lowercase(),
                    proportion: s.proportion,
                })
                .collect(),
            fallback_hook: raw.fallbackHook,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeSettings {
    pub mode: u8,
    pub fixed_fee: U256,
    pub single_tier_rate: U256,
}

/// Vesting preset stored by the lock hook for one configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LockPreset {
    pub start_time: u64,
    pub cliff_duration: u64,
    pub vesting_duration: u64,
    pub piece_duration: u64,
    pub start_unlock_percentage: U256,
    pub cliff_unlock_percentage: U256,
    pub lock: Address,
    pub is_fixed_start: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PenaltyWindow {
    pub begin_time: u64,
    pub end_time: u64,
}

// ---------------------------------------------------------------------------
// Typed wrappers
// ---------------------------------------------------------------------------

pub struct Distributor<'a, R: ContractReader + ?Sized> {
    reader: &'a R,
    address: Address,
}

impl<'a, R: ContractReader + ?Sized> Distributor<'a, R> {
    pub fn at(reader: &'a R, address: &str) -> Result<Self, DeckError> {
        Ok(Self {
            reader,
            address: parse_address("contract", address)?,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub async fn token(&self) -> Result<Address> {
        Ok(read(self.reader, self.address, IDistributor::tokenCall {}).await?._0)
    }

    pub async fn vault(&self) -> Result<Address> {
        Ok(read(self.reader, self.address, IDistributor::vaultCall {}).await?._0)
    }

    pub async fn signer(&self) -> Result<Address> {
        Ok(read(self.reader, self.address, IDistributor::signerCall {}).await?._0)
    }

    pub async fn active(&self) -> Result<bool> {
        Ok(read(self.reader, self.address, IDistributor::activeCall {}).await?._0)
    }

    /// Configuration id a claim root is bound to.
    pub async fn configuration_for_root(&self, root: B256) -> Result<B256> {
        let call = IDistributor::configurationIdCall { root };
        Ok(read(self.reader, self.address, call).await?._0)
    }

    pub async fn batch_configuration(&self, id: B256) -> Result<OnChainConfiguration> {
        let call = IDistributor::getBatchConfigurationCall { id };
        Ok(read(self.reader, self.address, call).await?.config.into())
    }

    pub async fn fee_settings(&self, id: B256) -> Result<FeeSettings> {
        let (mode, fixed, rate) = tokio::try_join!(
            read(self.reader, self.address, IDistributor::feeModesCall { id }),
            read(self.reader, self.address, IDistributor::fixedFeesCall { id }),
            read(self.reader, self.address, IDistributor::singleTierFeeRatesCall { id }),
        )?;
        Ok(FeeSettings {
            mode: mode._0,
            fixed_fee: fixed._0,
            single_tier_rate: rate._0,
        })
    }
}

pub struct Erc20<'a, R: ContractReader + ?Sized> {
    reader: &'a R,
    address: Address,
}

impl<'a, R: ContractReader + ?Sized> Erc20<'a, R> {
    pub fn new(reader: &'a R, address: Address) -> Self {
        Self { reader, address }
    }

    pub async fn balance_of(&self, account: Address) -> Result<U256> {
        let call = IERC20::balanceOfCall { account };
        Ok(read(self.reader, self.address, call).await?._0)
    }

    pub async fn allowance(&self, owner: Address, spender: Address) -> Result<U256> {
        let call = IERC20::allowanceCall { owner, spender };
        Ok(read(self.reader, self.address, call).await?._0)
    }

    pub async fn decimals(&self) -> Result<u8> {
        Ok(read(self.reader, self.address, IERC20::decimalsCall {}).await?._0)
    }

    pub async fn symbol(&self) -> Result<String> {
        Ok(read(self.reader, self.address, IERC20::symbolCall {}).await?._0)
    }
}

pub struct LockHook<'a, R: ContractReader + ?Sized> {
    reader: &'a R,
    address: Address,
}

impl<'a, R: ContractReader + ?Sized> LockHook<'a, R> {
    pub fn at(reader: &'a R, address: &str) -> Result<Self, DeckError> {
        Ok(Self {
            reader,
            address: parse_address("lockHook", address)?,
        })
    }

    pub async fn preset(&self, id: B256) -> Result<LockPreset> {
        let raw = read(self.reader, self.address, ILockHook::streamPresetsCall { id }).await?;
        Ok(LockPreset {
            start_time: raw.startTime,
            cliff_duration: raw.cliffDuration,
            vesting_duration: raw.vestingDuration,
            piece_duration: raw.pieceDuration,
            start_unlock_percentage: raw.startUnlockPercentage,
            cliff_unlock_percentage: raw.cliffUnlockPercentage,
            lock: raw.lock,
            is_fixed_start: raw.isFixedStart,
        })
    }
}

pub struct PenaltyHook<'a, R: ContractReader + ?Sized> {
    reader: &'a R,
    address: Address,
}

impl<'a, R: ContractReader + ?Sized> PenaltyHook<'a, R> {
    pub fn at(reader: &'a R, address: &str) -> Result<Self, DeckError> {
        Ok(Self {
            reader,
            address: parse_address("linearPenaltyHook", address)?,
        })
    }

    pub async fn window(&self, id: B256) -> Result<PenaltyWindow> {
        let raw = read(self.reader, self.address, ILinearPenaltyHook::penaltyConfigsCall { id })
            .await?;
        Ok(PenaltyWindow {
            begin_time: raw.beginTime,
            end_time: raw.endTime,
        })
    }

    /// Penalty the hook would take from `amount` if claimed now.
    pub async fn penalty(&self, id: B256, amount: U256) -> Result<U256> {
        let call = ILinearPenaltyHook::getPenaltyCall { id, amount };
        Ok(read(self.reader, self.address, call).await?._0)
    }
}

// ---------------------------------------------------------------------------
// Reconciliation seam
// ---------------------------------------------------------------------------

/// Source of deployed batch configurations.
#[async_trait]
pub trait BatchConfigurationSource: Send + Sync {
    async fn batch_configuration(&self, distributor: &str, id: B256) -> Result<OnChainConfiguration>;
}

#[async_trait]
impl BatchConfigurationSource for ChainClient {
    async fn batch_configuration(&self, distributor: &str, id: B256) -> Result<OnChainConfiguration> {
        Distributor::at(self, distributor)?.batch_configuration(id).await
    }
}
