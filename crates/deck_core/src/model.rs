//! App / deployment / configuration aggregate as stored by the backend.

use std::collections::BTreeMap;

use alloy_primitives::{B256, U256, keccak256};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error_handler::DeckError;
use crate::fixed::{full_proportion, parse_uint};

/// Role names ending in this suffix are distribution hooks.
pub const HOOK_ROLE_SUFFIX: &str = "Hook";

pub const ROLE_CONTRACT: &str = "contract";
pub const ROLE_PROJECT_ADMIN: &str = "projectAdmin";
pub const ROLE_DEPLOYER: &str = "deployer";
pub const ROLE_SIGNER: &str = "signer";
pub const ROLE_TRANSFER_HOOK: &str = "transferHook";
pub const ROLE_LOCK_HOOK: &str = "lockHook";
pub const ROLE_PENALTY_HOOK: &str = "linearPenaltyHook";

/// Treat an explicit JSON `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// On-chain identifier of a configuration: `keccak256(utf8(name))`.
///
/// Identity is the name, not the content, so a rename is a new configuration.
pub fn configuration_id(name: &str) -> B256 {
    keccak256(name.as_bytes())
}

// ---------------------------------------------------------------------------
// AppConf
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConf {
    pub app_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub deployments: BTreeMap<String, Deployment>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub gated: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub unique_device: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub extra: AppExtra,
}

/// Open-ended app settings. Keys this crate does not know are kept in
/// `other` so a save never drops them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppExtra {
    #[serde(default, deserialize_with = "null_as_default")]
    pub root: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tos_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tos_message: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Body of `POST /admin/app_conf/:appId`. The backend replaces the whole
/// record with it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfUpdate<'a> {
    pub deployments: &'a BTreeMap<String, Deployment>,
    pub gated: bool,
    pub unique_device: bool,
    pub extra: &'a AppExtra,
}

impl AppConf {
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            ..Self::default()
        }
    }

    pub fn update_payload(&self) -> AppConfUpdate<'_> {
        AppConfUpdate {
            deployments: &self.deployments,
            gated: self.gated,
            unique_device: self.unique_device,
            extra: &self.extra,
        }
    }

    pub fn deployment(&self, name: &str) -> Result<&Deployment, DeckError> {
        self.deployments
            .get(name)
            .ok_or_else(|| DeckError::NotFound(format!("Deployment '{name}'")))
    }

    pub fn deployment_mut(&mut self, name: &str) -> Result<&mut Deployment, DeckError> {
        self.deployments
            .get_mut(name)
            .ok_or_else(|| DeckError::NotFound(format!("Deployment '{name}'")))
    }

    /// Merge batch roots returned by an upload into `extra.root`.
    pub fn merge_roots(&mut self, roots: &BTreeMap<String, String>) {
        self.extra
            .root
            .extend(roots.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
}

// ---------------------------------------------------------------------------
// Deployment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub chain_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rpc_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub roles: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub extra: DeploymentExtra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentExtra {
    #[serde(default, deserialize_with = "null_as_default")]
    pub configurations: BTreeMap<String, Configuration>,
    /// Root registry scoped to this deployment. Independent of
    /// [`AppExtra::root`].
    #[serde(default, deserialize_with = "null_as_default")]
    pub root: BTreeMap<String, String>,
    /// Root name -> configuration name it was bound to on chain.
    #[serde(default, deserialize_with = "null_as_default")]
    pub root_conf: BTreeMap<String, String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Deployment {
    pub fn new(chain_id: impl Into<String>, rpc_url: impl Into<String>) -> Self {
        Self {
            chain_id: chain_id.into(),
            rpc_url: rpc_url.into(),
            ..Self::default()
        }
    }

    pub fn role(&self, name: &str) -> Option<&str> {
        self.roles
            .get(name)
            .map(String::as_str)
            .filter(|addr| !addr.is_empty())
    }

    pub fn require_role(&self, name: &str) -> Result<&str, DeckError> {
        self.role(name)
            .ok_or_else(|| DeckError::Config(format!("deployment has no '{name}' address")))
    }

    /// Distributor contract address.
    pub fn contract(&self) -> Result<&str, DeckError> {
        self.require_role(ROLE_CONTRACT)
    }

    /// Roles that name distribution hooks, in name order.
    pub fn hook_roles(&self) -> impl Iterator<Item = (&str, &str)> {
        self.roles
            .iter()
            .filter(|(name, _)| name.ends_with(HOOK_ROLE_SUFFIX))
            .map(|(name, addr)| (name.as_str(), addr.as_str()))
    }

    /// Resolve a strategy hook to an address. A role name maps through
    /// `roles`; anything else, including a misspelled role, is returned as is.
    pub fn resolve_hook(&self, hook: &str) -> String {
        self.role(hook).unwrap_or(hook).to_string()
    }

    pub fn configuration(&self, name: &str) -> Result<&Configuration, DeckError> {
        self.extra
            .configurations
            .get(name)
            .ok_or_else(|| DeckError::NotFound(format!("Configuration '{name}'")))
    }

    /// The named configuration's strategy with every hook resolved.
    pub fn resolved_strategy(&self, name: &str) -> Result<Vec<Strategy>, DeckError> {
        Ok(self
            .configuration(name)?
            .strategy
            .iter()
            .map(|s| Strategy {
                hook: self.resolve_hook(&s.hook),
                proportion: s.proportion.clone(),
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Configuration / Strategy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    #[serde(default, deserialize_with = "null_as_default")]
    pub strategy: Vec<Strategy>,
    #[serde(default = "default_fallback_idx")]
    pub fallback_idx: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub deployed: bool,
}

fn default_fallback_idx() -> String {
    "0".into()
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            strategy: Vec::new(),
            fallback_idx: default_fallback_idx(),
            deployed: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strategy {
    /// Role name (`transferHook`) or literal address.
    pub hook: String,
    /// 18-decimal fixed point; `10^18` is 100%.
    pub proportion: String,
}

impl Strategy {
    pub fn new(hook: impl Into<String>, proportion: impl Into<String>) -> Self {
        Self {
            hook: hook.into(),
            proportion: proportion.into(),
        }
    }
}

/// Outcome of [`Configuration::validate`]. Errors block a deploy, warnings
/// do not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigurationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ConfigurationReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_result(self) -> Result<Vec<String>, DeckError> {
        if self.errors.is_empty() {
            Ok(self.warnings)
        } else {
            Err(DeckError::Validation(self.errors.join("; ")))
        }
    }
}

impl Configuration {
    pub fn fallback_index(&self) -> Option<usize> {
        self.fallback_idx.trim().parse().ok()
    }

    pub fn validate(&self) -> ConfigurationReport {
        let mut report = ConfigurationReport::default();
        if self.strategy.is_empty() {
            report.errors.push("Strategy list is empty".into());
            return report;
        }

        let fallback = self.fallback_index();
        match fallback {
            Some(idx) if idx < self.strategy.len() => {}
            _ => report.errors.push(format!(
                "Fallback index '{}' must be between 0 and {}",
                self.fallback_idx,
                self.strategy.len() - 1
            )),
        }

        let mut total = U256::ZERO;
        for (i, entry) in self.strategy.iter().enumerate() {
            if entry.hook.trim().is_empty() {
                report.errors.push(format!("Strategy {i} has no hook"));
            }
            if Some(i) == fallback {
                continue;
            }
            match parse_uint(&entry.proportion) {
                Some(value) => total = total.saturating_add(value),
                None => report.errors.push(format!(
                    "Strategy {i} proportion '{}' is not an integer",
                    entry.proportion
                )),
            }
        }

        if report.errors.is_empty() && total != full_proportion() {
            report.warnings.push(format!(
                "Non-fallback proportions sum to {total}, expected {}",
                full_proportion()
            ));
        }
        report
    }
}
