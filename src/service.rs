use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::DateTime;
use log::{error, info, warn};
use num_format::{Locale, ToFormattedString};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::signal;

use crate::api::{ElectrumApi, NodeApi};
use crate::error::Error;
use crate::explorer::{BlockDetail, Explorer};
use crate::model::{AddressHistory, Amount, Height, COIN};

const DEFAULT_LATEST_BLOCKS: u32 = 10;
const MAX_LATEST_BLOCKS: u32 = 100;

trait FormatMoney {
    fn format_money(&self) -> String;
}

impl FormatMoney for Amount {
    fn format_money(&self) -> String {
        let sign = if *self < 0 { "-" } else { "" };
        let abs = self.unsigned_abs();
        let coin = COIN as u64;
        format!(
            "{}{}.{:08}",
            sign,
            (abs / coin).to_formatted_string(&Locale::en),
            abs % coin
        )
    }
}

#[derive(Serialize)]
struct AmountView {
    sat: Amount,
    human: String,
}

impl From<Amount> for AmountView {
    fn from(sat: Amount) -> Self {
        AmountView {
            sat,
            human: sat.format_money(),
        }
    }
}

#[derive(Serialize)]
struct BlockView {
    hash: String,
    height: Height,
    time: u64,
    time_rfc3339: String,
    bits: String,
    nonce: u64,
    difficulty: f64,
    merkle_root: String,
    previous_hash: Option<String>,
    next_hash: Option<String>,
    confirmations: i64,
    size: u64,
    weight: u64,
    txids: Vec<String>,
    reward: AmountView,
    fees: AmountView,
    value: AmountView,
}

impl From<BlockDetail> for BlockView {
    fn from(detail: BlockDetail) -> Self {
        let block = detail.block;
        BlockView {
            time_rfc3339: format_time(block.time),
            txids: block.transactions.into_iter().map(|tx| tx.txid).collect(),
            hash: block.hash,
            height: block.height,
            time: block.time,
            bits: block.bits,
            nonce: block.nonce,
            difficulty: block.difficulty,
            merkle_root: block.merkle_root,
            previous_hash: block.previous_hash,
            next_hash: block.next_hash,
            confirmations: block.confirmations,
            size: block.size,
            weight: block.weight,
            reward: detail.economics.reward.into(),
            fees: detail.economics.fees.into(),
            value: detail.economics.value.into(),
        }
    }
}

#[derive(Serialize)]
struct AddressView {
    address: String,
    script_hash: String,
    current_height: Height,
    confirmed: AmountView,
    unconfirmed: AmountView,
    transactions: Vec<Value>,
    unconfirmed_transactions: Vec<Value>,
    balance_history: Vec<Value>,
}

impl From<AddressHistory> for AddressView {
    fn from(history: AddressHistory) -> Self {
        let entry_json = |entry: &crate::model::AddressHistoryEntry| {
            json!({
                "txid": entry.transaction.txid,
                "height": entry.height,
                "confirmations": entry.confirmations,
                "time": entry.transaction.time,
                "balance_change": AmountView::from(entry.balance_change),
                "transaction": entry.transaction,
                "prevouts": entry.prevouts,
            })
        };
        AddressView {
            transactions: history.entries.iter().map(entry_json).collect(),
            unconfirmed_transactions: history.unconfirmed.iter().map(entry_json).collect(),
            balance_history: history
                .balance_history
                .iter()
                .map(|p| json!({"height": p.height, "balance": AmountView::from(p.balance)}))
                .collect(),
            address: history.address,
            script_hash: history.script_hash,
            current_height: history.current_height,
            confirmed: history.balance.confirmed.into(),
            unconfirmed: history.balance.unconfirmed.into(),
        }
    }
}

fn format_time(timestamp: u64) -> String {
    DateTime::from_timestamp(timestamp as i64, 0)
        .map(|t| t.to_rfc3339())
        .unwrap_or_default()
}

#[derive(Serialize)]
struct ErrorDetail {
    kind: String,
    message: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

fn make_error_json(kind: &str, message: String) -> Value {
    let resp = ErrorResponse {
        error: ErrorDetail {
            kind: kind.to_owned(),
            message,
        },
    };
    json!(resp)
}

/// Any failure ends up as a 5xx carrying the error kind.
struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_upstream() {
            StatusCode::BAD_GATEWAY
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        error!("request failed, reason: {}", self.0);
        (
            status,
            Json(make_error_json(self.0.kind(), self.0.to_string())),
        )
            .into_response()
    }
}

type ApiResult = Result<Json<Value>, ApiError>;

struct ServerData<N, E> {
    explorer: Explorer<N, E>,
}

async fn get_root<N: NodeApi, E: ElectrumApi>(
    State(state): State<Arc<ServerData<N, E>>>,
) -> ApiResult {
    let height = state.explorer.chain_height().await?;
    let params = state.explorer.params();
    Ok(Json(json!({
        "chain": params.name,
        "coin": params.coin,
        "height": height,
    })))
}

async fn get_height<N: NodeApi, E: ElectrumApi>(
    State(state): State<Arc<ServerData<N, E>>>,
) -> ApiResult {
    let height = state.explorer.chain_height().await?;
    Ok(Json(json!(height)))
}

#[derive(Deserialize)]
struct LatestParams {
    count: Option<u32>,
}

async fn get_latest_blocks<N: NodeApi, E: ElectrumApi>(
    Query(params): Query<LatestParams>,
    State(state): State<Arc<ServerData<N, E>>>,
) -> ApiResult {
    let count = params
        .count
        .unwrap_or(DEFAULT_LATEST_BLOCKS)
        .min(MAX_LATEST_BLOCKS);
    let summaries = state.explorer.latest_blocks(count).await?;
    Ok(Json(json!(summaries)))
}

async fn get_block<N: NodeApi, E: ElectrumApi>(
    Path(hash): Path<String>,
    State(state): State<Arc<ServerData<N, E>>>,
) -> ApiResult {
    let detail = state.explorer.block_by_hash(&hash).await?;
    Ok(Json(json!(BlockView::from(detail))))
}

async fn get_block_by_height<N: NodeApi, E: ElectrumApi>(
    Path(height): Path<Height>,
    State(state): State<Arc<ServerData<N, E>>>,
) -> ApiResult {
    let detail = state.explorer.block_by_height(height).await?;
    Ok(Json(json!(BlockView::from(detail))))
}

async fn get_transaction<N: NodeApi, E: ElectrumApi>(
    Path(txid): Path<String>,
    State(state): State<Arc<ServerData<N, E>>>,
) -> ApiResult {
    let detail = state.explorer.transaction(&txid).await?;
    Ok(Json(json!({
        "transaction": detail.transaction,
        "prevouts": detail.prevouts,
        "input_value": AmountView::from(detail.input_value),
        "output_value": AmountView::from(detail.output_value),
        "fee": AmountView::from(detail.fee),
    })))
}

async fn get_address<N: NodeApi, E: ElectrumApi>(
    Path(address): Path<String>,
    State(state): State<Arc<ServerData<N, E>>>,
) -> ApiResult {
    let history = state.explorer.address(&address).await?;
    Ok(Json(json!(AddressView::from(history))))
}

pub fn router<N, E>(explorer: Explorer<N, E>) -> Router
where
    N: NodeApi + 'static,
    E: ElectrumApi + 'static,
{
    Router::new()
        .route("/", get(get_root::<N, E>))
        .route("/height", get(get_height::<N, E>))
        .route("/blocks/latest", get(get_latest_blocks::<N, E>))
        .route("/block/:hash", get(get_block::<N, E>))
        .route("/block/height/:height", get(get_block_by_height::<N, E>))
        .route("/tx/:txid", get(get_transaction::<N, E>))
        .route("/address/:address", get(get_address::<N, E>))
        .with_state(Arc::new(ServerData { explorer }))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler, reason: {}", e);
            std::future::pending::<()>().await;
        }
        warn!("ctrl-c is received, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("failed to install signal handler, reason: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

pub async fn run_service<N, E>(bind: &str, explorer: Explorer<N, E>) -> std::io::Result<()>
where
    N: NodeApi + 'static,
    E: ElectrumApi + 'static,
{
    info!("listening on {}", bind);
    let app = router(explorer);
    let listener = tokio::net::TcpListener::bind(bind).await?;

    info!("web server is running...");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("web server exits.");
    Ok(())
}
