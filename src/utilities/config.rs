use dotenv::dotenv;
use std::env;
use std::str::FromStr;

use crate::models::session::Network;

/// Initialize dotenv (only needs to be called once at startup)
pub fn init() {
    if dotenv().is_ok() {
        println!("Loaded .env file");
    } else {
        println!("Failed to load .env file");
    }
}

/// Fetch environment variables by key
pub fn get_env_var(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("Environment variable {} must be set", key))
}

pub fn get_rpc_url() -> String {
    let network = env::var("NETWORK").unwrap_or_else(|_| "mainnet".to_string());

    match network.as_str() {
        "mainnet" => get_env_var("OPTIMISM_RPC_MAINNET"),
        "testnet" => get_env_var("OPTIMISM_RPC_TESTNET"),
        _ => panic!("Invalid NETWORK value: must be 'mainnet' or 'testnet'"),
    }
}

pub fn get_test_rpc_url() -> String {
    //when you know you want the test network
    get_env_var("OPTIMISM_RPC_TESTNET")
}

pub fn get_network() -> Network {
    let network = env::var("NETWORK").unwrap_or_else(|_| "mainnet".to_string());

    Network::from_str(&network).unwrap_or_else(|e| panic!("{}", e))
}

pub fn get_chain_id() -> u64 {
    get_network().chain_id()
}

/// Interval between receipt polls while waiting for inclusion.
pub fn get_confirmation_poll_interval_ms() -> u64 {
    env::var("CONFIRMATION_POLL_INTERVAL_MS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(1500)
}
