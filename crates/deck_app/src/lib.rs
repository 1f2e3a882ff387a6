pub mod context;
pub mod deploy;
pub mod hooks;
pub mod inspect;
pub mod reconcile;
pub mod store;
pub mod wizard;

pub use context::AppContext;
pub use deploy::{ApplyReport, BusyFlags, ConfigurationDeployer, TxContext, TxSettings};
pub use hooks::{HookKind, LockDraft, LockHookEditor, PenaltyDraft, PenaltyHookEditor, TransferHookEditor};
pub use inspect::{ContractInspector, DistributorSnapshot};
pub use reconcile::{ConfigurationStatus, SyncAction, SyncState, reconcile_deployment};
pub use store::AppStore;
pub use wizard::{Wizard, WizardStep};
