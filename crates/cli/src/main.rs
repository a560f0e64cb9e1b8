// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cqc` - management client for server admin endpoints.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use cqc_wire::{Request, Response};

#[derive(Parser)]
#[command(name = "cqc", about = "Control a CQC server's admin endpoint")]
struct Cli {
    /// Host the server runs on
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Admin port of the server
    #[arg(long)]
    port: u16,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Health check
    Ping,
    /// Show lifecycle state and identity
    Status,
    /// Request an orderly shutdown
    Stop,
    /// Invoke an operation on a registered server object
    Query {
        object: String,
        op: String,
        #[arg(long)]
        arg: Option<String>,
    },
}

fn request_for(command: &Command) -> Request {
    match command {
        Command::Ping => Request::Ping,
        Command::Status => Request::Status,
        Command::Stop => Request::AdminStop,
        Command::Query { object, op, arg } => Request::Query {
            object: object.clone(),
            op: op.clone(),
            arg: arg.clone(),
        },
    }
}

fn print_response(response: Response) -> Result<()> {
    match response {
        Response::Pong => println!("alive"),
        Response::Ok => println!("ok"),
        Response::Status { info } => {
            println!("{} ({})", info.name, info.descr);
            println!("  stage:  {}", info.stage);
            println!("  uptime: {}s", info.uptime_secs);
            for extra in info.extras {
                println!("  {}", extra);
            }
        }
        Response::Value { value } => {
            println!("{}", serde_json::to_string_pretty(&value)?)
        }
        Response::Error { message } => return Err(anyhow!(message)),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let response = client::send(&cli.host, cli.port, &request_for(&cli.command)).await?;
    print_response(response)
}
