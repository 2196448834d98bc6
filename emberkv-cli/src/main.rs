//! EmberKV command-line client

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;

#[derive(Parser, Debug)]
#[command(name = "emberkv")]
#[command(about = "EmberKV command-line client", version)]
struct Args {
    /// Base URL of the EmberKV server
    #[arg(long, default_value = "http://127.0.0.1:7379", env = "EMBERKV_ADDR")]
    addr: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Store a value under a key
    Set {
        key: String,
        value: String,
        /// Seconds until the value expires; zero means it never does
        #[arg(long, default_value = "0")]
        ttl: u64,
    },
    /// Print the value stored under a key
    Get { key: String },
    /// Remove a key
    Delete { key: String },
}

#[derive(Debug, Deserialize)]
struct GetResponse {
    found: bool,
    value: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .context("failed to build HTTP client")?;

    match args.command {
        Commands::Set { key, value, ttl } => {
            let resp = client
                .post(format!("{}/v1/set", args.addr))
                .json(&serde_json::json!({ "key": key, "value": value, "ttl_seconds": ttl }))
                .send()
                .await
                .context("set request failed")?;
            check_status(resp).await?;
            println!("OK");
        }
        Commands::Get { key } => {
            let resp = client
                .get(format!("{}/v1/get", args.addr))
                .query(&[("key", key.as_str())])
                .send()
                .await
                .context("get request failed")?;
            let body: GetResponse = check_status(resp).await?.json().await?;
            if !body.found {
                println!("(not found)");
                std::process::exit(2);
            }
            println!("{}", body.value);
        }
        Commands::Delete { key } => {
            let resp = client
                .post(format!("{}/v1/delete", args.addr))
                .json(&serde_json::json!({ "key": key }))
                .send()
                .await
                .context("delete request failed")?;
            check_status(resp).await?;
            println!("OK");
        }
    }

    Ok(())
}

/// Turn a non-2xx response into an error carrying the server's message
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status();
    let message = resp
        .json::<ErrorResponse>()
        .await
        .map(|e| e.error)
        .unwrap_or_else(|_| status.to_string());
    bail!("server error: {message}")
}
