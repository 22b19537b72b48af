//! Success/failure result contract shared by the adapter and the dispatcher.
//!
//! Every remote operation resolves to an [`ApiResult`] instead of an error so
//! callers branch on `success` and the dispatcher can forward values verbatim.
//! On the wire it is `{"success": true, "data": T}` or
//! `{"success": false, "data": "message"}`.

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Outcome of a remote operation.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResult<T> {
    Success(T),
    Failure(String),
}

impl<T> ApiResult<T> {
    /// Build a failure from any displayable error.
    pub fn failure(message: impl Display) -> Self {
        Self::Failure(message.to_string())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Map the success payload, passing failures through untouched.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> ApiResult<U> {
        match self {
            Self::Success(data) => ApiResult::Success(f(data)),
            Self::Failure(message) => ApiResult::Failure(message),
        }
    }

    /// The success payload, if any.
    pub fn ok(self) -> Option<T> {
        match self {
            Self::Success(data) => Some(data),
            Self::Failure(_) => None,
        }
    }

    /// The failure message, if any.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Failure(message) => Some(message.as_str()),
        }
    }

    /// Convert into a `Result` for `?`-style consumers.
    pub fn into_result(self) -> Result<T, String> {
        match self {
            Self::Success(data) => Ok(data),
            Self::Failure(message) => Err(message),
        }
    }
}

impl<T, E: Display> From<Result<T, E>> for ApiResult<T> {
    fn from(value: Result<T, E>) -> Self {
        match value {
            Ok(data) => Self::Success(data),
            Err(err) => Self::Failure(err.to_string()),
        }
    }
}

impl<T: Serialize> Serialize for ApiResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ApiResult", 2)?;
        match self {
            Self::Success(data) => {
                state.serialize_field("success", &true)?;
                state.serialize_field("data", data)?;
            }
            Self::Failure(message) => {
                state.serialize_field("success", &false)?;
                state.serialize_field("data", message)?;
            }
        }
        state.end()
    }
}

#[derive(Deserialize)]
struct RawApiResult {
    success: bool,
    #[serde(default)]
    data: serde_json::Value,
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for ApiResult<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawApiResult::deserialize(deserializer)?;
        if raw.success {
            serde_json::from_value(raw.data)
                .map(Self::Success)
                .map_err(de::Error::custom)
        } else {
            let message = match raw.data {
                serde_json::Value::String(message) => message,
                serde_json::Value::Null => String::new(),
                other => other.to_string(),
            };
            Ok(Self::Failure(message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ApiResult;
    use serde_json::json;

    #[test]
    fn serializes_to_success_envelope() {
        let value = serde_json::to_value(ApiResult::Success(vec![1, 2])).expect("serialize");
        assert_eq!(value, json!({"success": true, "data": [1, 2]}));

        let value =
            serde_json::to_value(ApiResult::<Vec<i32>>::failure("boom")).expect("serialize");
        assert_eq!(value, json!({"success": false, "data": "boom"}));
    }

    #[test]
    fn failure_with_structured_data_keeps_a_message() {
        let parsed: ApiResult<u32> =
            serde_json::from_value(json!({"success": false, "data": {"code": 7}}))
                .expect("deserialize");
        assert_eq!(parsed, ApiResult::Failure("{\"code\":7}".to_string()));

        let parsed: ApiResult<u32> =
            serde_json::from_value(json!({"success": false})).expect("deserialize");
        assert_eq!(parsed.error_message(), Some(""));
    }

    #[test]
    fn converts_from_result_and_back() {
        let ok: ApiResult<u8> = Ok::<u8, std::io::Error>(3).into();
        assert_eq!(ok.clone().into_result(), Ok(3));
        assert_eq!(ok.map(|v| v * 2), ApiResult::Success(6));

        let err: ApiResult<u8> = Err::<u8, _>("nope").into();
        assert!(!err.is_success());
        assert_eq!(err.ok(), None);
    }
}
