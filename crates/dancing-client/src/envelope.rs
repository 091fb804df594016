//! Response envelope shared by every REST endpoint.

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};

/// Application-level success code.
pub const SUCCESS_CODE: i32 = 200;

/// `{code, message, data}` wrapper. `code == 200` means success, whatever the
/// HTTP status was.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope<T> {
    pub code: i32,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

/// Envelope for endpoints whose data is just a confirmation string or null.
pub type Ack = Envelope<serde_json::Value>;

impl<T> Envelope<T> {
    pub fn success(message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            code: SUCCESS_CODE,
            message: message.into(),
            data,
            timestamp: None,
        }
    }

    pub fn failure(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
            timestamp: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }

    /// Data of a successful envelope; non-200 codes become [`ClientError::Api`].
    pub fn into_data(self) -> ClientResult<T> {
        if !self.is_success() {
            return Err(ClientError::Api {
                code: self.code,
                message: self.message,
            });
        }
        self.data.ok_or(ClientError::MissingData)
    }

    /// Server message of a successful envelope.
    pub fn into_message(self) -> ClientResult<String> {
        if self.is_success() {
            Ok(self.message)
        } else {
            Err(ClientError::Api {
                code: self.code,
                message: self.message,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_with_timestamp_and_null_data() {
        let json = r#"{"code":200,"message":"退出成功","data":null,"timestamp":1718000000000}"#;
        let envelope: Ack = serde_json::from_str(json).unwrap();
        assert!(envelope.is_success());
        assert_eq!(envelope.timestamp, Some(1_718_000_000_000));
        assert!(envelope.data.is_none());
        assert_eq!(envelope.into_message().unwrap(), "退出成功");
    }

    #[test]
    fn test_failure_code_becomes_api_error() {
        let json = r#"{"code":401,"message":"bad credentials"}"#;
        let envelope: Envelope<Vec<i64>> = serde_json::from_str(json).unwrap();
        assert!(!envelope.is_success());

        match envelope.into_data() {
            Err(ClientError::Api { code, message }) => {
                assert_eq!(code, 401);
                assert_eq!(message, "bad credentials");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_missing_data_field_decodes_for_any_payload() {
        // User has no Default impl
        let json = r#"{"code":500,"message":"x"}"#;
        let envelope: Envelope<crate::models::User> = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.code, 500);
        assert!(envelope.data.is_none());
    }

    #[test]
    fn test_success_without_data() {
        let envelope: Envelope<String> = Envelope::success("ok", None);
        assert!(matches!(envelope.into_data(), Err(ClientError::MissingData)));
    }
}
