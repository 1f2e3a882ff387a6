pub mod client;
pub mod types;

pub use client::{API_KEY_HEADER, AdminApi, AdminClient, relay_typed};
pub use types::{
    Allocation, AllocationExtra, BatchUpload, CreateRelayerRequest, DeploymentRef, RelayAction,
    RelayerInfo, RpcProvider, SetClaimRootRequest, SetFeeRequest, SetHookRequest,
    SetLockPresetRequest, SetPenaltyConfigRequest, TxHashResponse, UploadResponse,
};
