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

use std::env;
use std::fs;
use std::path::PathBuf;

/// Port the daemon listens on for RPC when `rpcport` is not set
pub const DEFAULT_RPC_PORT: u16 = 19932;
/// Host the daemon listens on for RPC when `rpchost` is not set
pub const DEFAULT_RPC_HOST: &str = "127.0.0.1";

#[derive(thiserror::Error, Debug)]
/// An error occurred reading the daemon configuration
pub enum ConfigError {
    /// Error occurred reading config file
    #[error("{0}")]
    InvalidConfig(String),
    /// A line is not of the form `key=value`
    #[error("line {0}: expected key=value, got '{1}'")]
    ParseError(usize, String),
    /// A required field is absent
    #[error("missing required field '{0}'")]
    MissingField(String),
    /// A field was malformed
    #[error("identifier={0}, value={1}")]
    BadField(String, String),
}

/// The `key=value` pairs of a `pastel.conf`, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawConfigFile {
    pub entries: Vec<(String, String)>,
}

impl RawConfigFile {
    /// load the config from a string and parse it
    pub fn load_from_str(data: &str) -> Result<Self, ConfigError> {
        let mut entries = vec![];
        for (lineno, line) in data.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| ConfigError::ParseError(lineno + 1, line.to_string()))?;
            entries.push((key.trim().to_string(), value.trim().to_string()));
        }
        Ok(RawConfigFile { entries })
    }

    /// load the config from a file and parse it
    pub fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        Self::try_from(&PathBuf::from(path))
    }

    /// The last value given for `key`
    fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl TryFrom<&PathBuf> for RawConfigFile {
    type Error = ConfigError;

    fn try_from(path: &PathBuf) -> Result<Self, Self::Error> {
        Self::load_from_str(&fs::read_to_string(path).map_err(|e| {
            ConfigError::InvalidConfig(format!("failed to read config file: {e:?}"))
        })?)
    }
}

/// The RPC settings of a local Pastel daemon.
#[derive(Clone, PartialEq, Eq)]
pub struct DaemonConfig {
    pub rpc_host: String,
    pub rpc_port: u16,
    pub rpc_user: String,
    pub rpc_password: String,
    /// Every other setting in the file, in order of appearance
    pub other_flags: Vec<(String, String)>,
}

impl std::fmt::Debug for DaemonConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DaemonConfig")
            .field("rpc_host", &self.rpc_host)
            .field("rpc_port", &self.rpc_port)
            .field("rpc_user", &self.rpc_user)
            .field("rpc_password", &"<redacted>")
            .field("other_flags", &self.other_flags)
            .finish()
    }
}

impl TryFrom<RawConfigFile> for DaemonConfig {
    type Error = ConfigError;

    /// Pick the RPC settings out of the raw file and validate them.
    fn try_from(raw_data: RawConfigFile) -> Result<Self, Self::Error> {
        let rpc_user = raw_data
            .get("rpcuser")
            .ok_or_else(|| ConfigError::MissingField("rpcuser".to_string()))?
            .to_string();
        let rpc_password = raw_data
            .get("rpcpassword")
            .ok_or_else(|| ConfigError::MissingField("rpcpassword".to_string()))?
            .to_string();

        let rpc_port = match raw_data.get("rpcport") {
            Some(port) => port
                .parse::<u16>()
                .ok()
                .filter(|port| *port != 0)
                .ok_or_else(|| ConfigError::BadField("rpcport".to_string(), port.to_string()))?,
            None => DEFAULT_RPC_PORT,
        };

        let rpc_host = raw_data.get("rpchost").unwrap_or(DEFAULT_RPC_HOST).to_string();
        url::Url::parse(&format!("http://{rpc_host}"))
            .map_err(|_| ConfigError::BadField("rpchost".to_string(), rpc_host.clone()))?;

        let other_flags = raw_data
            .entries
            .into_iter()
            .filter(|(key, _)| {
                !matches!(
                    key.as_str(),
                    "rpcuser" | "rpcpassword" | "rpcport" | "rpchost"
                )
            })
            .collect();

        Ok(DaemonConfig {
            rpc_host,
            rpc_port,
            rpc_user,
            rpc_password,
            other_flags,
        })
    }
}

impl TryFrom<&PathBuf> for DaemonConfig {
    type Error = ConfigError;
    fn try_from(path: &PathBuf) -> Result<Self, ConfigError> {
        let config_file = RawConfigFile::try_from(path)?;
        Self::try_from(config_file)
    }
}

impl DaemonConfig {
    /// load the config from a string and parse it
    pub fn load_from_str(data: &str) -> Result<Self, ConfigError> {
        RawConfigFile::load_from_str(data)?.try_into()
    }

    /// load the config from a file and parse it
    pub fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        Self::try_from(&PathBuf::from(path))
    }

    /// `$HOME/.pastel/pastel.conf`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let home = env::var_os("HOME")
            .ok_or_else(|| ConfigError::InvalidConfig("HOME is not set".to_string()))?;
        Ok(PathBuf::from(home).join(".pastel").join("pastel.conf"))
    }

    /// The value of a setting other than the RPC ones
    pub fn flag(&self, key: &str) -> Option<&str> {
        self.other_flags
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// A connection URL for [`RpcClient`](crate::RpcClient), credentials percent-encoded.
    pub fn rpc_url(&self) -> String {
        format!(
            "http://{}:{}@{}:{}/",
            urlencoding::encode(&self.rpc_user),
            urlencoding::encode(&self.rpc_password),
            self.rpc_host,
            self.rpc_port
        )
    }

    /// Return a string with non-sensitive configuration
    /// information for logging purposes
    pub fn config_to_log_string(&self) -> String {
        format!(
            "RPC endpoint: http://{}:{}/, RPC user: {}, other settings: {}",
            self.rpc_host,
            self.rpc_port,
            self.rpc_user,
            self.other_flags.len()
        )
    }
}
