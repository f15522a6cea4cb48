use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::model::{Amount, Balance, HistoryItem};

#[derive(Deserialize)]
pub struct Response {
    pub id: Option<u32>,
    pub result: Option<Value>,
    pub error: Option<Value>,
}

impl Response {
    pub fn parse_str(s: &str) -> Result<Response> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn into_result(self) -> Result<Value> {
        if let Some(error) = self.error.filter(|e| !e.is_null()) {
            let code = error.get("code").and_then(Value::as_i64).unwrap_or_default();
            let message = match error.get("message").and_then(Value::as_str) {
                Some(message) => message.to_owned(),
                None => error.to_string(),
            };
            return Err(Error::Electrum { code, message });
        }
        self.result
            .ok_or_else(|| Error::Protocol("electrum response carries no result".to_owned()))
    }
}

#[derive(Deserialize)]
pub struct RawHistoryItem {
    pub tx_hash: String,
    pub height: i64,
}

impl From<RawHistoryItem> for HistoryItem {
    fn from(raw: RawHistoryItem) -> Self {
        HistoryItem {
            tx_hash: raw.tx_hash,
            height: raw.height,
        }
    }
}

#[derive(Deserialize)]
pub struct RawBalance {
    pub confirmed: Amount,
    pub unconfirmed: Amount,
}

impl From<RawBalance> for Balance {
    fn from(raw: RawBalance) -> Self {
        Balance {
            confirmed: raw.confirmed,
            unconfirmed: raw.unconfirmed,
        }
    }
}
