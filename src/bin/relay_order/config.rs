//! Configuration for the relay order tool.
//!
//! Configuration comes from two sources:
//! - Environment variables (via .env file or shell): connection details, keys
//! - CLI arguments: the operation to run

use std::str::FromStr;

use alloy::primitives::{Address, B256, U256};
use clap::{Parser, Subcommand};

/// Environment configuration (connection details, credentials).
#[derive(Debug, serde::Deserialize)]
pub struct EnvConfig {
    /// Chain ID (e.g., 42161 for Arbitrum One)
    pub chain_id: u64,

    /// RPC URL for the node
    pub node_rpc_url: String,

    /// Private key signing relayed calls and permits
    pub private_key: String,

    /// Relay router contract address
    pub relay_router_address: String,

    /// Subaccount relay router contract address
    pub subaccount_relay_router_address: String,

    /// Optional relay API base URL (default: public Gelato endpoint)
    pub relay_api_url: Option<String>,

    /// Optional relay API key
    pub relay_api_key: Option<String>,

    /// Optional timeout for awaiting relay tasks (default: 120s)
    pub timeout_seconds: Option<u64>,
}

impl EnvConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    /// Parse the relay router address.
    pub fn relay_router_address(&self) -> Result<Address, alloy::primitives::hex::FromHexError> {
        self.relay_router_address.parse()
    }

    /// Parse the subaccount relay router address.
    pub fn subaccount_relay_router_address(
        &self,
    ) -> Result<Address, alloy::primitives::hex::FromHexError> {
        self.subaccount_relay_router_address.parse()
    }
}

/// CLI arguments.
#[derive(Debug, Parser)]
#[command(name = "relay-order")]
#[command(about = "Gasless order operations through the Gelato relay")]
pub struct CliConfig {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Wait for a relay task to finish and report its outcome
    Status {
        /// Relay task ID
        task_id: String,
    },

    /// Cancel an order of the signer's account through the relay
    Cancel {
        /// Order key (bytes32, hex)
        order_key: String,

        /// Token the relay fee is paid in
        #[arg(long)]
        fee_token: String,

        /// Relay fee amount in fee token units
        #[arg(long)]
        fee_amount: String,

        /// Seconds the signed request stays valid
        #[arg(long, default_value = "600")]
        validity_seconds: u64,
    },

    /// Sign an EIP-2612 permit and print it as JSON
    SignPermit {
        /// Permit token address
        token: String,

        /// Spender address
        #[arg(long)]
        spender: String,

        /// Amount in token units
        #[arg(long)]
        value: String,

        /// Permit deadline (unix timestamp)
        #[arg(long)]
        deadline: u64,
    },
}

/// Parsed operation.
#[derive(Debug, PartialEq, Eq)]
pub enum Operation {
    Status {
        task_id: String,
    },
    Cancel {
        order_key: B256,
        fee_token: Address,
        fee_amount: U256,
        validity_seconds: u64,
    },
    SignPermit {
        token: Address,
        spender: Address,
        value: U256,
        deadline: U256,
    },
}

impl CliConfig {
    /// Convert CLI arguments to the operation to run.
    pub fn to_operation(&self) -> Result<Operation, ConfigError> {
        match &self.command {
            Command::Status { task_id } => {
                if task_id.trim().is_empty() {
                    return Err(ConfigError::EmptyTaskId);
                }
                Ok(Operation::Status {
                    task_id: task_id.trim().to_string(),
                })
            }
            Command::Cancel {
                order_key,
                fee_token,
                fee_amount,
                validity_seconds,
            } => {
                if *validity_seconds == 0 {
                    return Err(ConfigError::ZeroValidity);
                }
                Ok(Operation::Cancel {
                    order_key: order_key
                        .parse()
                        .map_err(|_| ConfigError::InvalidOrderKey)?,
                    fee_token: parse_address("fee_token", fee_token)?,
                    fee_amount: parse_amount("fee_amount", fee_amount)?,
                    validity_seconds: *validity_seconds,
                })
            }
            Command::SignPermit {
                token,
                spender,
                value,
                deadline,
            } => Ok(Operation::SignPermit {
                token: parse_address("token", token)?,
                spender: parse_address("spender", spender)?,
                value: parse_amount("value", value)?,
                deadline: U256::from(*deadline),
            }),
        }
    }
}

fn parse_address(field: &str, value: &str) -> Result<Address, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidAddress(field.to_string()))
}

fn parse_amount(field: &str, value: &str) -> Result<U256, ConfigError> {
    U256::from_str(value).map_err(|_| ConfigError::InvalidAmount(field.to_string()))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid address value for {0}")]
    InvalidAddress(String),

    #[error("Invalid amount value for {0}")]
    InvalidAmount(String),

    #[error("Order key must be 32 bytes of hex")]
    InvalidOrderKey,

    #[error("validity_seconds cannot be zero")]
    ZeroValidity,

    #[error("task_id cannot be empty")]
    EmptyTaskId,
}
