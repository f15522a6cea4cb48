use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

#[derive(Serialize)]
pub struct Request<'a> {
    jsonrpc: &'static str,
    id: u32,
    method: &'a str,
    params: &'a [Value],
}

impl<'a> Request<'a> {
    pub fn new(id: u32, method: &'a str, params: &'a [Value]) -> Request<'a> {
        Request {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }

    /// One request per line, as the Electrum protocol frames them.
    pub fn to_line(&self) -> Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}
