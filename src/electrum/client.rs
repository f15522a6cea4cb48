use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use log::{debug, warn};
use serde_json::{json, Value};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::TcpStream,
    time::{sleep, timeout},
};

use crate::api::ElectrumApi;
use crate::error::{Error, Result};
use crate::model::{Balance, HistoryItem, RawTransaction, Transaction};

use super::{Config, RawBalance, RawHistoryItem, Request, Response};

/// Electrum protocol client. Each call opens its own TCP connection, writes
/// one request line and reads one response line.
pub struct Client {
    config: Config,
    next_id: AtomicU32,
}

impl Client {
    pub fn new(config: Config) -> Client {
        Client {
            config,
            next_id: AtomicU32::new(0),
        }
    }

    pub async fn call(&self, method: &str, params: &[Value]) -> Result<Value> {
        let mut attempt = 0u32;
        loop {
            match self.call_once(method, params).await {
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    attempt += 1;
                    warn!(
                        "electrum call `{}` failed, retrying ({}/{}), reason: {}",
                        method, attempt, self.config.max_retries, e
                    );
                    sleep(self.config.retry_backoff * attempt).await;
                }
                res => return res,
            }
        }
    }

    async fn call_once(&self, method: &str, params: &[Value]) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let line = Request::new(id, method, params).to_line()?;
        debug!("sending line to electrum: {}", line.trim_end());
        let resp_line = timeout(self.config.timeout, exchange(&self.config.endpoint, &line))
            .await
            .map_err(|_| {
                Error::Network(format!(
                    "electrum call `{}` timed out after {:?}",
                    method, self.config.timeout
                ))
            })??;
        let resp = Response::parse_str(&resp_line)?;
        if let Some(resp_id) = resp.id {
            if resp_id != id {
                return Err(Error::Protocol(format!(
                    "electrum response id {resp_id} does not match request id {id}"
                )));
            }
        }
        resp.into_result()
    }
}

async fn exchange(endpoint: &str, line: &str) -> Result<String> {
    let to_network = |e: std::io::Error| Error::Network(format!("electrum {endpoint}: {e}"));
    let mut stream = TcpStream::connect(endpoint).await.map_err(to_network)?;
    stream
        .write_all(line.as_bytes())
        .await
        .map_err(to_network)?;
    let mut reader = BufReader::new(stream);
    let mut resp = String::new();
    let n = reader.read_line(&mut resp).await.map_err(to_network)?;
    if n == 0 {
        return Err(Error::Network(format!(
            "electrum {endpoint} closed the connection without answering"
        )));
    }
    Ok(resp)
}

#[async_trait]
impl ElectrumApi for Client {
    async fn get_transaction(&self, txid: &str) -> Result<Transaction> {
        let result = self
            .call("blockchain.transaction.get", &[json!(txid), json!(true)])
            .await?;
        let raw: RawTransaction = serde_json::from_value(result)?;
        if raw.txid != txid {
            return Err(Error::Protocol(format!(
                "asked for transaction {txid}, got {}",
                raw.txid
            )));
        }
        raw.try_into()
    }

    async fn get_history(&self, script_hash: &str) -> Result<Vec<HistoryItem>> {
        let result = self
            .call("blockchain.scripthash.get_history", &[json!(script_hash)])
            .await?;
        let raw: Vec<RawHistoryItem> = serde_json::from_value(result)?;
        Ok(raw.into_iter().map(HistoryItem::from).collect())
    }

    async fn get_balance(&self, script_hash: &str) -> Result<Balance> {
        let result = self
            .call("blockchain.scripthash.get_balance", &[json!(script_hash)])
            .await?;
        let raw: RawBalance = serde_json::from_value(result)?;
        Ok(raw.into())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::net::TcpListener;

    use super::*;

    /// Serves `answers` one connection at a time; `None` drops the connection
    /// without replying.
    async fn serve(answers: Vec<Option<Value>>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            for answer in answers {
                let (stream, _) = listener.accept().await.unwrap();
                let mut reader = BufReader::new(stream);
                let mut line = String::new();
                reader.read_line(&mut line).await.unwrap();
                let req: Value = serde_json::from_str(&line).unwrap();
                if let Some(mut answer) = answer {
                    answer["id"] = req["id"].clone();
                    let mut out = answer.to_string();
                    out.push('\n');
                    reader.get_mut().write_all(out.as_bytes()).await.unwrap();
                }
            }
        });
        endpoint
    }

    fn client(endpoint: &str) -> Client {
        Client::new(
            Config::new(endpoint)
                .set_timeout(Duration::from_secs(2))
                .set_retry_backoff(Duration::from_millis(10)),
        )
    }

    #[tokio::test]
    async fn test_get_balance() {
        let endpoint = serve(vec![Some(
            json!({"jsonrpc": "2.0", "result": {"confirmed": 1500, "unconfirmed": 20}}),
        )])
        .await;
        let balance = client(&endpoint).get_balance("00").await.unwrap();
        assert_eq!(balance.confirmed, 1500);
        assert_eq!(balance.unconfirmed, 20);
    }

    #[tokio::test]
    async fn test_get_history() {
        let endpoint = serve(vec![Some(json!({"jsonrpc": "2.0", "result": [
            {"tx_hash": "aa", "height": 10},
            {"tx_hash": "bb", "height": 0, "fee": 200}
        ]}))])
        .await;
        let history = client(&endpoint).get_history("00").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].confirmed_height(), Some(10));
        assert_eq!(history[1].confirmed_height(), None);
    }

    #[tokio::test]
    async fn test_server_error_is_not_retried() {
        let endpoint = serve(vec![Some(
            json!({"jsonrpc": "2.0", "error": {"code": 1, "message": "bad scripthash"}}),
        )])
        .await;
        let e = client(&endpoint).get_balance("zz").await.unwrap_err();
        assert_eq!(e.kind(), "electrum");
    }

    #[tokio::test]
    async fn test_dropped_connection_is_retried() {
        let endpoint = serve(vec![
            None,
            Some(json!({"jsonrpc": "2.0", "result": {"confirmed": 7, "unconfirmed": 0}})),
        ])
        .await;
        let balance = client(&endpoint).get_balance("00").await.unwrap();
        assert_eq!(balance.confirmed, 7);
    }

    #[tokio::test]
    async fn test_mismatched_transaction_is_protocol_error() {
        let endpoint = serve(vec![Some(json!({"jsonrpc": "2.0", "result": {
            "txid": "other", "vin": [], "vout": []
        }}))])
        .await;
        let e = client(&endpoint).get_transaction("aa").await.unwrap_err();
        assert_eq!(e.kind(), "protocol");
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let (_stream, _) = listener.accept().await.unwrap();
            sleep(Duration::from_secs(10)).await;
        });
        let client = Client::new(
            Config::new(&endpoint)
                .set_timeout(Duration::from_millis(100))
                .set_max_retries(0),
        );
        let e = client.get_balance("00").await.unwrap_err();
        assert_eq!(e.kind(), "network");
    }
}
