//! Request and response bodies of the backend `/admin` API.

use std::collections::BTreeMap;
use std::fmt;

use deck_core::Strategy;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Accept a JSON string or number and keep it as a string.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = string_or_number(deserializer)?;
    Ok(if value.is_empty() { None } else { Some(value) })
}

// ── Relay actions ───────────────────────────────────────────────────

/// Transactions the backend signs and submits on the operator's behalf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelayAction {
    DistributorDeploy,
    DistributorPause,
    DistributorUnpause,
    DistributorSetClaimRoot,
    DistributorSetFee,
    DistributorSetHook,
    TransferHookDeploy,
    LockHookDeploy,
    LockHookSetPreset,
    PenaltyHookDeploy,
    PenaltyHookSetConfig,
}

impl RelayAction {
    /// Path below `/admin/relay/`.
    pub fn path(self) -> &'static str {
        match self {
            Self::DistributorDeploy => "distributor/deploy",
            Self::DistributorPause => "distributor/pause",
            Self::DistributorUnpause => "distributor/unpause",
            Self::DistributorSetClaimRoot => "distributor/set-claim-root",
            Self::DistributorSetFee => "distributor/set-fee",
            Self::DistributorSetHook => "distributor/set-hook",
            Self::TransferHookDeploy => "transfer-hook/deploy",
            Self::LockHookDeploy => "cliquelock-hook/deploy",
            Self::LockHookSetPreset => "cliquelock-hook/set-preset",
            Self::PenaltyHookDeploy => "linear-penalty-hook/deploy",
            Self::PenaltyHookSetConfig => "linear-penalty-hook/set-penalty-config",
        }
    }
}

impl fmt::Display for RelayAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

// ── Responses ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxHashResponse {
    pub tx_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayerInfo {
    pub address: String,
    #[serde(deserialize_with = "string_or_number")]
    pub chain_id: String,
    #[serde(default)]
    pub nonce: u64,
    #[serde(default)]
    pub online: bool,
}

/// Batch name -> merkle root produced by an upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub root: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationExtra {
    #[serde(default)]
    pub recipient: Option<String>,
}

/// One recipient row of an uploaded batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub address_handler: String,
    #[serde(deserialize_with = "string_or_number")]
    pub allocation: String,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub claim_at: Option<String>,
    #[serde(default)]
    pub extra: Option<AllocationExtra>,
}

impl Allocation {
    pub fn recipient(&self) -> Option<&str> {
        self.extra.as_ref()?.recipient.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcProvider {
    #[serde(deserialize_with = "string_or_number")]
    pub chain_id: String,
    pub rpc_url: String,
}

// ── Requests ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRelayerRequest {
    pub app_id: String,
    pub chain_id: String,
}

/// Target of a relay that needs nothing beyond the deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRef {
    pub app_id: String,
    pub deployment: String,
}

impl DeploymentRef {
    pub fn new(app_id: impl Into<String>, deployment: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            deployment: deployment.into(),
        }
    }
}

/// `distributor/set-hook`: bind a resolved strategy to a configuration name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetHookRequest {
    pub app_id: String,
    pub deployment: String,
    pub project_admin: String,
    pub hook_name: String,
    pub strategy: Vec<Strategy>,
    pub fallback_idx: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetClaimRootRequest {
    pub app_id: String,
    pub deployment: String,
    pub root: String,
    pub hook_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetFeeRequest {
    pub app_id: String,
    pub deployment: String,
    pub hook_name: String,
    pub fee_mode: u8,
    pub fixed_fee: String,
    pub single_tier_fee_rate: String,
}

/// Integer fields are decimal strings so 256-bit values survive JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetLockPresetRequest {
    pub app_id: String,
    pub deployment: String,
    pub hook_name: String,
    pub start_time: String,
    pub cliff_duration: String,
    pub vesting_duration: String,
    pub piece_duration: String,
    pub start_unlock_percentage: String,
    pub cliff_unlock_percentage: String,
    pub lock: String,
    pub is_fixed_start: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPenaltyConfigRequest {
    pub app_id: String,
    pub deployment: String,
    pub hook_name: String,
    pub begin_time: String,
    pub end_time: String,
}

/// A recipient batch ready for `POST /admin/upload/:appId/:batchName`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchUpload {
    pub template: String,
    pub primary_key: String,
    pub file_name: String,
    pub contents: Vec<u8>,
}

impl BatchUpload {
    /// SHA-256 of the file contents, lower-case hex.
    pub fn file_hash(&self) -> String {
        use sha2::{Digest, Sha256};
        hex::encode(Sha256::digest(&self.contents))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relay_paths() {
        assert_eq!(RelayAction::DistributorSetHook.path(), "distributor/set-hook");
        assert_eq!(RelayAction::LockHookSetPreset.path(), "cliquelock-hook/set-preset");
        assert_eq!(
            RelayAction::PenaltyHookSetConfig.to_string(),
            "linear-penalty-hook/set-penalty-config"
        );
    }

    #[test]
    fn set_hook_request_is_camel_case() {
        let req = SetHookRequest {
            app_id: "app".into(),
            deployment: "base".into(),
            project_admin: "0xAD".into(),
            hook_name: "default".into(),
            strategy: vec![Strategy::new("0xAAA", "1000000000000000000")],
            fallback_idx: "0".into(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["appId"], "app");
        assert_eq!(json["projectAdmin"], "0xAD");
        assert_eq!(json["hookName"], "default");
        assert_eq!(json["fallbackIdx"], "0");
        assert_eq!(json["strategy"][0]["hook"], "0xAAA");
    }

    #[test]
    fn relayer_accepts_numeric_chain_id() {
        let relayer: RelayerInfo = serde_json::from_str(
            r#"{"address":"0xR","chainId":8453,"nonce":4,"online":true}"#,
        )
        .unwrap();
        assert_eq!(relayer.chain_id, "8453");
        assert_eq!(relayer.nonce, 4);
        assert!(relayer.online);
    }

    #[test]
    fn allocation_optional_fields() {
        let full: Allocation = serde_json::from_str(
            r#"{"address_handler":"0x1","allocation":"100","claim_at":1700000000,"extra":{"recipient":"0x2"}}"#,
        )
        .unwrap();
        assert_eq!(full.claim_at.as_deref(), Some("1700000000"));
        assert_eq!(full.recipient(), Some("0x2"));

        let bare: Allocation =
            serde_json::from_str(r#"{"address_handler":"0x1","allocation":5}"#).unwrap();
        assert_eq!(bare.allocation, "5");
        assert!(bare.claim_at.is_none());
        assert!(bare.recipient().is_none());
    }

    #[test]
    fn upload_response_defaults_to_empty_roots() {
        let resp: UploadResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.root.is_empty());
        let resp: UploadResponse =
            serde_json::from_str(r#"{"root":{"batch-1":"0xabc"}}"#).unwrap();
        assert_eq!(resp.root["batch-1"], "0xabc");
    }

    #[test]
    fn file_hash_is_sha256_hex() {
        let upload = BatchUpload {
            template: "default".into(),
            primary_key: "address".into(),
            file_name: "batch.csv".into(),
            contents: b"abc".to_vec(),
        };
        assert_eq!(
            upload.file_hash(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
