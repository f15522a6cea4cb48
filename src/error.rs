use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// Connection, transport or timeout failure talking to an upstream service
    #[error("network error: {0}")]
    Network(String),
    /// The upstream answered with something we cannot interpret
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("node rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("electrum error {code}: {message}")]
    Electrum { code: i64, message: String },
    #[error("cannot decode address `{address}`: {reason}")]
    AddressDecode { address: String, reason: String },
    #[error("cannot build output script: {0}")]
    ScriptBuild(String),
    /// A referenced transaction or output does not exist
    #[error("not found: {0}")]
    LookupNotFound(String),
}

impl Error {
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Network(_) => "network",
            Error::Protocol(_) => "protocol",
            Error::Rpc { .. } => "rpc",
            Error::Electrum { .. } => "electrum",
            Error::AddressDecode { .. } => "address_decode",
            Error::ScriptBuild(_) => "script_build",
            Error::LookupNotFound(_) => "lookup_not_found",
        }
    }

    /// Only transport level failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Network(_))
    }

    /// True when the failure was produced by (or while talking to) an upstream service.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Error::Network(_) | Error::Protocol(_) | Error::Rpc { .. } | Error::Electrum { .. }
        )
    }

    /// Electrum's reply for a txid neither the mempool nor the chain knows.
    pub fn is_missing_transaction(&self) -> bool {
        match self {
            Error::Electrum { message, .. } => {
                let message = message.to_lowercase();
                message.contains("no such") || message.contains("not found")
            }
            _ => false,
        }
    }

    pub fn address_decode(address: &str, reason: impl ToString) -> Error {
        Error::AddressDecode {
            address: address.to_owned(),
            reason: reason.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Protocol(e.to_string())
    }
}
