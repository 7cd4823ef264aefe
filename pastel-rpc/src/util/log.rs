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

//! Process-wide logger for RPC traffic.
//!
//! Records go to stderr, as compact terminal lines or as JSON objects when
//! `PASTELRPC_LOG_JSON=1`. The level is `info` unless `PASTELRPC_LOG_LEVEL`
//! names another one; `PASTELRPC_DEBUG=1` and `PASTELRPC_TRACE=1` are
//! shorthands for `debug` and `trace`.

use std::env;
use std::sync::Mutex;

use slog::{Drain, Level, Logger};

const LOG_JSON_VAR: &str = "PASTELRPC_LOG_JSON";
const LOG_LEVEL_VAR: &str = "PASTELRPC_LOG_LEVEL";
const DEBUG_VAR: &str = "PASTELRPC_DEBUG";
const TRACE_VAR: &str = "PASTELRPC_TRACE";

lazy_static! {
    pub static ref LOGGER: Logger = make_logger();
}

fn env_flag(name: &str) -> bool {
    env::var(name).map_or(false, |value| value == "1")
}

fn make_logger() -> Logger {
    let level = get_loglevel();
    let context = o!("lib" => "pastel-rpc", "version" => env!("CARGO_PKG_VERSION"));
    if env_flag(LOG_JSON_VAR) {
        let drain = Mutex::new(slog_json::Json::default(std::io::stderr())).map(slog::Fuse);
        let filtered_drain = slog::LevelFilter::new(drain, level).fuse();
        Logger::root(filtered_drain, context)
    } else {
        let decorator = slog_term::TermDecorator::new().stderr().build();
        let drain = slog_term::CompactFormat::new(decorator).build().fuse();
        let drain = slog_async::Async::new(drain).build().fuse();
        let filtered_drain = slog::LevelFilter::new(drain, level).fuse();
        Logger::root(filtered_drain, context)
    }
}

fn get_loglevel() -> Level {
    level_from(
        env::var(LOG_LEVEL_VAR).ok().as_deref(),
        env_flag(DEBUG_VAR),
        env_flag(TRACE_VAR),
    )
}

/// An explicit level name wins; otherwise the most verbose flag that is set.
fn level_from(name: Option<&str>, debug: bool, trace: bool) -> Level {
    let named = name.map(|name| name.trim().to_ascii_lowercase());
    match named.as_deref() {
        Some("trace") => return Level::Trace,
        Some("debug") => return Level::Debug,
        Some("info") => return Level::Info,
        Some("warn") | Some("warning") => return Level::Warning,
        Some("error") => return Level::Error,
        Some("crit") | Some("critical") => return Level::Critical,
        _ => {}
    }
    if trace {
        Level::Trace
    } else if debug {
        Level::Debug
    } else {
        Level::Info
    }
}

#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => ({
        slog_trace!($crate::util::log::LOGGER, $($arg)*)
    })
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => ({
        slog_error!($crate::util::log::LOGGER, $($arg)*)
    })
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => ({
        slog_warn!($crate::util::log::LOGGER, $($arg)*)
    })
}

#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => ({
        slog_info!($crate::util::log::LOGGER, $($arg)*)
    })
}

#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => ({
        slog_debug!($crate::util::log::LOGGER, $($arg)*)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_selection() {
        assert_eq!(level_from(None, false, false), Level::Info);
        assert_eq!(level_from(None, true, false), Level::Debug);
        assert_eq!(level_from(None, true, true), Level::Trace);
        assert_eq!(level_from(Some("warn"), true, true), Level::Warning);
        assert_eq!(level_from(Some(" error "), false, false), Level::Error);
        assert_eq!(level_from(Some("loud"), true, false), Level::Debug);
    }
}
