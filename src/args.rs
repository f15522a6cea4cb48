use clap::Parser;

use crate::chain::Network;

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// The address:port the web service will listen to
    #[arg(long, default_value = "127.0.0.1:3000")]
    pub bind: String,
    /// The network whose address rules apply
    #[arg(long, value_enum, default_value_t = Network::NmcRegtest)]
    pub chain: Network,
    /// The endpoint (http://ip:port) for the full node
    #[arg(long, default_value = "http://127.0.0.1:18443")]
    pub rpc_endpoint: String,
    /// Use cookie for RPC authentication
    #[arg(long, default_value_t = false)]
    pub rpc_use_cookie: bool,
    /// The path string to file `.cookie`
    #[arg(long, default_value = "$HOME/.namecoin/regtest/.cookie")]
    pub rpc_cookie_path: String,
    /// The username for RPC authentication
    #[arg(long, default_value = "rpc")]
    pub rpc_user: String,
    /// The password for RPC authentication
    #[arg(long, default_value = "rpc")]
    pub rpc_passwd: String,
    /// Use proxy for the connection of RPC
    #[arg(long, default_value_t = false)]
    pub rpc_use_proxy: bool,
    /// Seconds before a node RPC call is given up
    #[arg(long, default_value_t = 30)]
    pub rpc_timeout_secs: u64,
    /// The host:port of the Electrum server (plain TCP)
    #[arg(long, default_value = "127.0.0.1:50001")]
    pub electrum_endpoint: String,
    /// Seconds before an Electrum call is given up
    #[arg(long, default_value_t = 30)]
    pub electrum_timeout_secs: u64,
    /// Extra attempts for Electrum calls failing on the network
    #[arg(long, default_value_t = 2)]
    pub electrum_retries: u32,
    /// Concurrent Electrum lookups allowed per request
    #[arg(long, default_value_t = 16)]
    pub max_in_flight: usize,
}
