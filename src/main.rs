mod api;
mod args;
mod chain;
mod electrum;
mod error;
mod explorer;
#[cfg(test)]
mod mock;
mod model;
mod resolver;
mod rpc;
mod service;

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use log::{debug, info};

use args::Args;
use explorer::Explorer;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    debug!("debug mode");

    let args = Args::parse();
    let params = args.chain.params();
    info!("serving chain {} ({})", params.name, params.coin);

    let builder = rpc::ClientBuilder::new()
        .set_endpoint(&args.rpc_endpoint)
        .set_use_proxy(args.rpc_use_proxy)
        .set_timeout(Duration::from_secs(args.rpc_timeout_secs));
    let node = if args.rpc_use_cookie {
        let cookie_path = shellexpand::env(&args.rpc_cookie_path)?;
        info!(
            "prepare client with cookie file {} to {}",
            cookie_path, args.rpc_endpoint
        );
        builder.set_auth_from_cookie(&cookie_path)?.build()
    } else {
        info!("prepare client with user/passwd to {}", args.rpc_endpoint);
        builder
            .set_auth(rpc::Auth::new(&args.rpc_user, &args.rpc_passwd))
            .build()
    };

    info!("electrum server at {}", args.electrum_endpoint);
    let electrum = electrum::Client::new(
        electrum::Config::new(&args.electrum_endpoint)
            .set_timeout(Duration::from_secs(args.electrum_timeout_secs))
            .set_max_retries(args.electrum_retries),
    );

    let explorer = Explorer::new(node, electrum, params, args.max_in_flight);
    service::run_service(&args.bind, explorer).await?;

    info!("exit.");
    Ok(())
}
