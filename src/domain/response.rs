//! Result envelope shared by every engine and query operation

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Failed,
}

/// `{status, code, message, data}`; `data` is omitted when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletResponse<T> {
    pub status: ResponseStatus,
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> WalletResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            status: ResponseStatus::Success,
            code: 200,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self {
            status: ResponseStatus::Success,
            code: 201,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn failure(code: u16, message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Failed,
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }
}

impl WalletResponse<()> {
    /// Success with no payload
    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Success,
            code: 200,
            message: message.into(),
            data: None,
        }
    }
}
