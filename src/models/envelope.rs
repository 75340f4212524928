use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{DashboardError, Result};

/// `{success, message?, <payload>}` as returned by every backend endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl ApiEnvelope {
    /// Fails with the server's message, verbatim, when `success` is false.
    pub fn into_success(self) -> Result<Self> {
        if self.success {
            Ok(self)
        } else {
            Err(DashboardError::Server(
                self.message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| "Request failed".to_string()),
            ))
        }
    }

    /// Decodes the payload stored under `key`.
    pub fn take<T: serde::de::DeserializeOwned>(&mut self, key: &str) -> Result<T> {
        let value = self
            .payload
            .remove(key)
            .ok_or_else(|| DashboardError::Decode(format!("response has no `{key}` field")))?;
        Ok(serde_json::from_value(value)?)
    }

    /// Like [`ApiEnvelope::take`], but a missing or null field yields the default.
    pub fn take_or_default<T>(&mut self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned + Default,
    {
        match self.payload.remove(key) {
            None | Some(Value::Null) => Ok(T::default()),
            Some(value) => Ok(serde_json::from_value(value)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn failure_keeps_the_server_message() {
        let env: ApiEnvelope =
            serde_json::from_value(json!({"success": false, "message": "Insufficient stock"})).unwrap();
        match env.into_success() {
            Err(DashboardError::Server(m)) => assert_eq!(m, "Insufficient stock"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn payload_is_taken_by_key() {
        let env: ApiEnvelope =
            serde_json::from_value(json!({"success": true, "count": 3})).unwrap();
        let mut env = env.into_success().unwrap();
        let count: u32 = env.take("count").unwrap();
        assert_eq!(count, 3);
        let missing: Vec<u32> = env.take_or_default("items").unwrap();
        assert!(missing.is_empty());
    }
}
