//! Relay order tool.
//!
//! This binary signs and submits gasless order operations through the
//! Gelato relay and tracks relay tasks to completion.

mod config;
mod error;
mod operator;

use std::{process::exit, time::Duration};

use alloy::signers::local::PrivateKeySigner;
use clap::Parser;
use gasless_sdk::{
    Chain,
    submit::{GELATO_RELAY_URL, GelatoRelayApi},
};
use tracing::error;
use url::Url;

use config::{CliConfig, EnvConfig, Operation};
use operator::RelayOperator;

#[tokio::main]
async fn main() {
    // Load .env file
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Warning: Failed to load .env file: {}", e);
    }

    // Parse environment configuration
    let env_config = match EnvConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to parse environment configuration: {}", e);
            exit(1);
        }
    };

    // Parse CLI arguments
    let cli_config = CliConfig::parse();

    let operation = match cli_config.to_operation() {
        Ok(operation) => operation,
        Err(e) => {
            eprintln!("Invalid arguments: {}", e);
            exit(1);
        }
    };

    // Set up logging
    if std::env::var("RUST_LOG").is_err() {
        unsafe {
            std::env::set_var("RUST_LOG", "info");
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let operator = match build_operator(&env_config) {
        Ok(operator) => operator,
        Err(e) => {
            eprintln!("Failed to create relay operator: {}", e);
            exit(1);
        }
    };

    let result = match operation {
        Operation::Status { task_id } => operator.status(task_id).await,
        Operation::Cancel {
            order_key,
            fee_token,
            fee_amount,
            validity_seconds,
        } => {
            operator
                .cancel(order_key, fee_token, fee_amount, validity_seconds)
                .await
        }
        Operation::SignPermit {
            token,
            spender,
            value,
            deadline,
        } => operator.sign_permit(token, spender, value, deadline).await,
    };

    if let Err(e) = result {
        error!(%e, "Relay operation failed");
        exit(1);
    }
}

fn build_operator(env_config: &EnvConfig) -> error::Result<RelayOperator> {
    let chain = Chain::custom(
        env_config.chain_id,
        env_config.relay_router_address()?,
        env_config.subaccount_relay_router_address()?,
    );

    let signer: PrivateKeySigner = env_config.private_key.parse()?;
    let node_url = Url::parse(&env_config.node_rpc_url)?;

    let relay_url = Url::parse(
        env_config
            .relay_api_url
            .as_deref()
            .unwrap_or(GELATO_RELAY_URL),
    )?;
    let mut api = GelatoRelayApi::new(relay_url);
    if let Some(key) = &env_config.relay_api_key {
        api = api.with_api_key(key.clone());
    }

    // Default timeout is 120 seconds
    let timeout = Duration::from_secs(env_config.timeout_seconds.unwrap_or(120));

    Ok(RelayOperator::new(node_url, signer, chain, api, timeout))
}
