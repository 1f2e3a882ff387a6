use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors whose kind matters to callers. Library functions return
/// `anyhow::Result` and wrap one of these where the category is meaningful.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeckError {
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Transaction failed")]
    TransactionFailed { tx_hash: String },

    #[error("Transaction reverted")]
    TransactionReverted { tx_hash: String },

    #[error("Timed out after {secs}s waiting for transaction {tx_hash}{}", last_check_suffix(.last_error))]
    Timeout {
        tx_hash: String,
        secs: u64,
        /// Most recent status check failure, if the last one failed.
        last_error: Option<String>,
    },

    #[error("{0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Action already in progress: {0}")]
    Busy(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

fn last_check_suffix(last_error: &Option<String>) -> String {
    last_error
        .as_deref()
        .map(|e| format!(" (last check failed: {e})"))
        .unwrap_or_default()
}

/// Broad routing category for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Non-2xx response or transport failure talking to the backend or RPC.
    Network,
    /// The chain accepted the transaction but it did not succeed.
    Transaction,
    /// Rejected locally before any network call.
    Validation,
    /// Missing or invalid settings.
    Config,
    /// Malformed response payload.
    Decode,
    /// Anything else.
    Internal,
}

impl DeckError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Http { .. } | Self::Network(_) | Self::Timeout { .. } => ErrorCategory::Network,
            Self::TransactionFailed { .. } | Self::TransactionReverted { .. } => {
                ErrorCategory::Transaction
            }
            Self::Validation(_) | Self::Busy(_) => ErrorCategory::Validation,
            Self::Config(_) | Self::Unsupported(_) => ErrorCategory::Config,
            Self::Decode(_) => ErrorCategory::Decode,
            Self::NotFound(_) => ErrorCategory::Internal,
        }
    }

    /// Text shown inline next to the action that failed.
    pub fn user_message(&self) -> String {
        match self {
            Self::Http { status, body } if body.is_empty() => {
                format!("Request failed with status {status}")
            }
            Self::Http { status, body } => format!("Request failed with status {status}: {body}"),
            Self::Network(_) => "Network error. Check your connection.".into(),
            Self::TransactionFailed { .. } => "Transaction failed".into(),
            Self::TransactionReverted { .. } => "Transaction reverted".into(),
            Self::Timeout { secs, .. } => {
                format!("Transaction not confirmed within {secs}s")
            }
            Self::Validation(msg) => msg.clone(),
            Self::Config(msg) => format!("Configuration issue: {msg}"),
            Self::Decode(_) => "Unexpected response from the server.".into(),
            Self::Unsupported(msg) => msg.clone(),
            Self::Busy(action) => format!("{action} is already in progress"),
            Self::NotFound(what) => format!("{what} not found"),
        }
    }
}

/// Classified error with context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedError {
    pub category: ErrorCategory,
    pub message: String,
    pub user_message: String,
}

/// Classify an `anyhow::Error`: a wrapped [`DeckError`] decides directly,
/// otherwise the message is matched against known transport patterns.
pub fn classify_error(error: &anyhow::Error) -> ClassifiedError {
    if let Some(deck) = error.chain().find_map(|e| e.downcast_ref::<DeckError>()) {
        return ClassifiedError {
            category: deck.category(),
            message: format!("{error:#}"),
            user_message: deck.user_message(),
        };
    }

    let msg = format!("{error:#}").to_lowercase();
    let (category, user_message) = if msg.contains("unauthorized")
        || msg.contains("401")
        || msg.contains("403")
    {
        (ErrorCategory::Config, "Invalid API key. Check your settings.")
    } else if msg.contains("timed out")
        || msg.contains("timeout")
        || msg.contains("connection")
        || msg.contains("dns")
    {
        (ErrorCategory::Network, "Network error. Check your connection.")
    } else if msg.contains("decode") || msg.contains("parse") {
        (ErrorCategory::Decode, "Unexpected response from the server.")
    } else {
        (ErrorCategory::Internal, "An unexpected error occurred.")
    };

    ClassifiedError {
        category,
        message: format!("{error:#}"),
        user_message: user_message.to_string(),
    }
}

/// Shorthand for the inline message of any error.
pub fn user_message(error: &anyhow::Error) -> String {
    classify_error(error).user_message
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, anyhow};

    #[test]
    fn transaction_messages() {
        let failed = DeckError::TransactionFailed { tx_hash: "0x1".into() };
        let reverted = DeckError::TransactionReverted { tx_hash: "0x2".into() };
        assert_eq!(failed.to_string(), "Transaction failed");
        assert_eq!(reverted.user_message(), "Transaction reverted");
        assert_eq!(failed.category(), ErrorCategory::Transaction);
    }

    #[test]
    fn validation_message_is_shown_verbatim() {
        let err = DeckError::Validation("Please select a CSV file".into());
        assert_eq!(err.user_message(), "Please select a CSV file");
        assert_eq!(err.category(), ErrorCategory::Validation);
    }

    #[test]
    fn http_error_is_network_category() {
        let err = DeckError::Http { status: 502, body: String::new() };
        assert_eq!(err.category(), ErrorCategory::Network);
        assert_eq!(err.user_message(), "Request failed with status 502");
    }

    #[test]
    fn classify_finds_wrapped_deck_error() {
        let err = anyhow::Error::new(DeckError::TransactionReverted { tx_hash: "0xab".into() })
            .context("applying configuration default");
        let classified = classify_error(&err);
        assert_eq!(classified.category, ErrorCategory::Transaction);
        assert_eq!(classified.user_message, "Transaction reverted");
        assert!(classified.message.contains("applying configuration default"));
    }

    #[test]
    fn classify_falls_back_to_patterns() {
        assert_eq!(
            classify_error(&anyhow!("connection refused")).category,
            ErrorCategory::Network
        );
        assert_eq!(
            classify_error(&anyhow!("server said 401")).category,
            ErrorCategory::Config
        );
        assert_eq!(
            classify_error(&anyhow!("something odd")).category,
            ErrorCategory::Internal
        );
    }

    #[test]
    fn user_message_shorthand() {
        let result: anyhow::Result<()> =
            Err(DeckError::Busy("Apply default".into())).context("click");
        assert_eq!(
            user_message(&result.unwrap_err()),
            "Apply default is already in progress"
        );
    }
}
