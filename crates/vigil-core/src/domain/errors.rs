//! Errors - 失敗の分類
//!
//! - Metadata: 非致命的（ログのみ、ランは続行）
//! - Transport / InvalidResponse: Failed フェーズへ
//! - キャンセルはエラーではない（Cancelled フェーズ）

use thiserror::Error;

/// Fixed message for payloads without a usable `checks` collection.
pub const INVALID_RESPONSE_FORMAT: &str = "invalid response format";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    /// Dataset metadata could not be fetched. Never fatal for a run.
    #[error("dataset metadata unavailable: {0}")]
    Metadata(String),

    /// Network failure, non-2xx status or HTTP-level timeout.
    #[error("{message}")]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// The engine answered, but not with a report.
    #[error("invalid response format")]
    InvalidResponse { detail: String },

    #[error("a validation run is already in progress")]
    AlreadyRunning,
}

impl RunError {
    pub fn transport(message: impl Into<String>) -> Self {
        RunError::Transport {
            status: None,
            message: message.into(),
        }
    }

    pub fn http_status(status: u16, message: impl Into<String>) -> Self {
        RunError::Transport {
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn invalid_response(detail: impl Into<String>) -> Self {
        RunError::InvalidResponse {
            detail: detail.into(),
        }
    }

    /// Text placed in `RunState::error_message`.
    pub fn user_message(&self) -> String {
        match self {
            RunError::Transport { message, .. } if message.trim().is_empty() => {
                "validation request failed".to_string()
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_response_uses_fixed_message() {
        let err = RunError::invalid_response("missing `checks`");
        assert_eq!(err.user_message(), "invalid response format");
    }

    #[test]
    fn transport_message_is_passed_through() {
        let err = RunError::http_status(400, "Dataset not found: 42");
        assert_eq!(err.user_message(), "Dataset not found: 42");
    }

    #[test]
    fn empty_transport_message_gets_a_fallback() {
        let err = RunError::transport("  ");
        assert!(!err.user_message().trim().is_empty());
    }
}
