//! Rollback request and its JSON outcome

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Why a rollback did not (fully) succeed
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RollbackErrorCode {
    /// Missing capability, bad nonce, unknown plugin or empty target
    ValidationFailure,
    /// Target version absent from the catalog, or the catalog was unavailable
    NoTargetVersion,
    InstallFailure,
    /// Files were replaced but the plugin did not come back up; not fatal
    ReactivationFailure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackRequest {
    /// Plugin basename (`dir/main.php`) or slug
    pub plugin_id: String,
    pub target_version: String,
    pub nonce: String,
    pub actor_capability_ok: bool,
    /// Actor session the nonce was issued for
    pub session_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackResult {
    pub success: bool,
    pub current_version: String,
    pub target_version: String,
    pub error_code: Option<RollbackErrorCode>,
    pub message: String,
    pub debug_trace: Option<Vec<String>>,
}

impl RollbackResult {
    pub fn failed(
        code: RollbackErrorCode,
        message: impl Into<String>,
        current_version: &str,
        target_version: &str,
    ) -> Self {
        Self {
            success: false,
            current_version: current_version.to_string(),
            target_version: target_version.to_string(),
            error_code: Some(code),
            message: message.into(),
            debug_trace: None,
        }
    }

    /// Interactive response payload
    pub fn to_json(&self) -> Value {
        let mut payload = Map::new();
        payload.insert("error".into(), json!(!self.success));
        if let Some(code) = self.error_code {
            payload.insert("errorCode".into(), json!(code.as_ref()));
        }
        payload.insert("message".into(), json!(self.message));
        payload.insert("currentVersion".into(), json!(self.current_version));
        payload.insert("targetVersion".into(), json!(self.target_version));
        if let Some(trace) = &self.debug_trace {
            payload.insert("debug".into(), json!(trace));
        }
        Value::Object(payload)
    }
}
