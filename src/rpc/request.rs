use serde::Serialize;
use serde_json::Value;

#[derive(Serialize)]
pub struct Request {
    jsonrpc: String,
    id: String,
    method: String,
    params: Vec<Value>,
}

impl Request {
    pub fn method(&self) -> &str {
        &self.method
    }
}

pub struct RequestBuilder {
    rpc_json: Request,
}

impl RequestBuilder {
    pub fn new() -> RequestBuilder {
        RequestBuilder {
            rpc_json: Request {
                jsonrpc: "1.0".to_owned(),
                id: "nmc-explorer".to_owned(),
                method: "".to_owned(),
                params: Vec::new(),
            },
        }
    }

    pub fn set_method(mut self, method_name: &str) -> RequestBuilder {
        self.rpc_json.method = method_name.to_owned();
        self
    }

    pub fn add_param_i64(mut self, value: i64) -> RequestBuilder {
        self.rpc_json.params.push(Value::Number(value.into()));
        self
    }

    pub fn add_param_string(mut self, value: &str) -> RequestBuilder {
        self.rpc_json.params.push(Value::String(value.to_owned()));
        self
    }

    pub fn build(self) -> Request {
        self.rpc_json
    }
}
