use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use serde_json::Value;
use ureq::AgentBuilder;

use crate::api::NodeApi;
use crate::error::{Error, Result};
use crate::model::{Block, Height, RawBlock};

use super::{Auth, AuthError, Config, Request, RequestBuilder, Response};

/// JSON-RPC 1.0 client for the full node. Every call is a blocking HTTP POST,
/// moved onto the blocking pool when driven from async code.
#[derive(Clone)]
pub struct Client {
    config: Config,
}

impl Client {
    pub fn new(config: Config) -> Client {
        Client { config }
    }

    pub fn send(&self, req: &Request) -> Result<Value> {
        let agent = AgentBuilder::new()
            .timeout(self.config.timeout)
            .try_proxy_from_env(self.config.use_proxy)
            .build();
        let body = serde_json::to_string(req)?;
        let mut http_req = agent
            .post(&self.config.endpoint)
            .set("Content-Type", "text/plain");
        if let Some(auth) = &self.config.auth {
            http_req = http_req.set("Authorization", auth);
        }
        debug!("sending body to node: {}", body);
        let resp_str = match http_req.send_string(&body) {
            Ok(resp) => resp
                .into_string()
                .map_err(|e| Error::Network(e.to_string()))?,
            // the node answers RPC failures with a non-2xx status and a regular body
            Err(ureq::Error::Status(code, resp)) => {
                let text = resp.into_string().unwrap_or_default();
                return match Response::parse_str(&text) {
                    Ok(resp) => resp.into_result(),
                    Err(_) => Err(Error::Rpc {
                        code: code as i64,
                        message: format!("http status {code} on `{}`", req.method()),
                    }),
                };
            }
            Err(ureq::Error::Transport(e)) => return Err(Error::Network(e.to_string())),
        };
        Response::parse_str(&resp_str)?.into_result()
    }

    pub async fn call(&self, req: Request) -> Result<Value> {
        let client = self.clone();
        tokio::task::spawn_blocking(move || client.send(&req))
            .await
            .map_err(|e| Error::Network(format!("rpc task is aborted, reason: {e}")))?
    }
}

#[async_trait]
impl NodeApi for Client {
    async fn get_block_count(&self) -> Result<Height> {
        let req = RequestBuilder::new().set_method("getblockcount").build();
        let result = self.call(req).await?;
        result
            .as_u64()
            .and_then(|h| Height::try_from(h).ok())
            .ok_or_else(|| Error::Protocol(format!("unexpected block count {result}")))
    }

    async fn get_block_hash(&self, height: Height) -> Result<String> {
        let req = RequestBuilder::new()
            .set_method("getblockhash")
            .add_param_i64(height as i64)
            .build();
        let result = self.call(req).await?;
        match result.as_str() {
            Some(hash) => Ok(hash.to_owned()),
            None => Err(Error::Protocol(format!("unexpected block hash {result}"))),
        }
    }

    async fn get_block(&self, hash: &str) -> Result<Block> {
        let req = RequestBuilder::new()
            .set_method("getblock")
            .add_param_string(hash)
            .add_param_i64(2)
            .build();
        let result = self.call(req).await?;
        let raw: RawBlock = serde_json::from_value(result)?;
        raw.try_into()
    }
}

pub struct ClientBuilder {
    endpoint: String,
    use_proxy: bool,
    auth: Option<Auth>,
    timeout: Duration,
}

impl ClientBuilder {
    pub fn new() -> ClientBuilder {
        ClientBuilder {
            endpoint: "http://127.0.0.1:18443".to_owned(),
            use_proxy: false,
            auth: None,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn set_endpoint(mut self, endpoint: &str) -> ClientBuilder {
        self.endpoint = endpoint.to_owned();
        self
    }

    pub fn set_use_proxy(mut self, use_proxy: bool) -> ClientBuilder {
        self.use_proxy = use_proxy;
        self
    }

    pub fn set_auth(mut self, auth: Auth) -> ClientBuilder {
        self.auth = Some(auth);
        self
    }

    pub fn set_auth_from_cookie(self, cookie_path: &str) -> Result<ClientBuilder, AuthError> {
        let auth = Auth::from_cookie(cookie_path)?;
        Ok(self.set_auth(auth))
    }

    pub fn set_timeout(mut self, timeout: Duration) -> ClientBuilder {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Client {
        Client::new(Config {
            endpoint: self.endpoint,
            use_proxy: self.use_proxy,
            auth: self.auth.map(|auth| auth.header_value()),
            timeout: self.timeout,
        })
    }
}
