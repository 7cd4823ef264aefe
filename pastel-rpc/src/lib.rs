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

#![allow(clippy::result_large_err)]

#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate slog;

#[macro_use]
pub mod util;

pub mod batch;
pub mod client;
pub mod config;
pub mod connection;
pub mod daemon;
pub mod decimal;
pub mod endpoint;
pub mod error;

pub use crate::batch::BatchCall;
pub use crate::client::{to_param, RpcClient};
pub use crate::config::{ConfigError, DaemonConfig};
pub use crate::connection::{Connection, DEFAULT_TIMEOUT};
pub use crate::daemon::{BlockInfo, BlockRef, PastelRpcClient, TotalBalance, UnspentOutput};
pub use crate::decimal::{Decimal, DecimalError};
pub use crate::endpoint::{Endpoint, RpcAuth};
pub use crate::error::{RpcError, RpcErrorObject, RpcResult};
