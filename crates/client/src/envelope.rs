//! Uniform response envelopes.
//!
//! [`Envelope`] is what the SDK hands to callers that want a single shape
//! for every outcome: `{errorCode, errorDesc?, result?}` with code zero on
//! success. [`NodeResponse`] is the node's own `error_code`/`error_desc`/
//! `result` wrapper as it arrives over HTTP.

use crate::error::{codes, SdkError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub error_code: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_desc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
}

impl<T> Envelope<T> {
    pub fn ok(result: T) -> Self {
        Self {
            error_code: codes::SUCCESS,
            error_desc: None,
            result: Some(result),
        }
    }

    pub fn error(code: i64, desc: impl Into<String>) -> Self {
        Self {
            error_code: code,
            error_desc: Some(desc.into()),
            result: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error_code == codes::SUCCESS
    }
}

impl<T> From<Result<T, SdkError>> for Envelope<T> {
    fn from(res: Result<T, SdkError>) -> Self {
        match res {
            Ok(result) => Self::ok(result),
            Err(e) => Self::error(e.code(), e.to_string()),
        }
    }
}

/// Wrapper used by every enveloped node endpoint. Missing fields read as
/// `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeResponse<T> {
    pub error_code: i64,
    pub error_desc: Option<String>,
    pub result: Option<T>,
}
