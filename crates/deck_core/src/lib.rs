pub mod config;
pub mod error_handler;
pub mod fixed;
pub mod logging;
pub mod model;
pub mod secure_storage;
pub mod session;
pub mod validate;

pub use config::{ConfigManager, DeckConfig, Environment};
pub use error_handler::{ClassifiedError, DeckError, ErrorCategory, classify_error, user_message};
pub use model::{
    AppConf, AppExtra, Configuration, ConfigurationReport, Deployment, DeploymentExtra, Strategy,
    configuration_id,
};
pub use secure_storage::SecureStorage;
pub use session::SessionState;
