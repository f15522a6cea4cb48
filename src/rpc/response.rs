use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};

#[derive(Deserialize)]
pub struct Response {
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub error: Value,
}

#[derive(Deserialize)]
struct ErrorObject {
    code: i64,
    message: String,
}

impl Response {
    pub fn parse_str(s: &str) -> Result<Response> {
        Ok(serde_json::from_str(s)?)
    }

    /// Yields `result` unless the node filled in `error`.
    pub fn into_result(self) -> Result<Value> {
        if self.error.is_null() {
            return Ok(self.result);
        }
        match serde_json::from_value::<ErrorObject>(self.error.clone()) {
            Ok(e) => Err(Error::Rpc {
                code: e.code,
                message: e.message,
            }),
            Err(_) => Err(Error::Rpc {
                code: 0,
                message: self.error.to_string(),
            }),
        }
    }
}
