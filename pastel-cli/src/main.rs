// Copyright (C) 2025 Pastel Network
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
extern crate pastel_rpc;
extern crate serde_json;
extern crate slog;

mod cli;

use std::process;

use clap::Parser;
use pastel_rpc::{debug, error};
use pastel_rpc::RpcClient;
use serde_json::Value;
use slog::{slog_debug, slog_error};

use crate::cli::{
    parse_batch, parse_param, read_batch_input, BatchArgs, CallArgs, Cli, CliError, Command,
};

fn handle_call(client: &RpcClient, args: CallArgs) -> Result<Value, CliError> {
    let params = args.params.iter().map(|param| parse_param(param)).collect();
    Ok(client.call(&args.method, params)?)
}

fn handle_batch(client: &RpcClient, args: BatchArgs) -> Result<Value, CliError> {
    let input = read_batch_input(args.file.as_ref())?;
    let calls = parse_batch(&input)?;
    debug!("Sending a batch of {} calls", calls.len());
    Ok(Value::Array(client.batch(calls)?))
}

fn run(cli: Cli) -> Result<Value, CliError> {
    let client = RpcClient::with_timeout(&cli.service_url()?, cli.timeout())?;
    debug!("Connected to {}", client.endpoint());
    match cli.command {
        Command::Call(args) => handle_call(&client, args),
        Command::Batch(args) => handle_batch(&client, args),
    }
}

fn main() {
    let cli = Cli::parse();

    match run(cli) {
        Ok(result) => match serde_json::to_string_pretty(&result) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                error!("Failed to format result: {}", e);
                process::exit(1);
            }
        },
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    }
}
