// streamctl - CLI for HTTP+JSON network audio streamers
// Copyright (C) 2024 The streamctl contributors
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
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use crate::client::TransportError;
use crate::query::QueryError;
use thiserror::Error;

/// Every way a single invocation can fail once configuration is resolved.
#[derive(Debug, Error)]
pub enum CtlError {
    #[error("cannot connect to the device (is the network up and the host right?)")]
    ConnectFailed,
    #[error("device refused the connection (it may be in standby)")]
    DeviceUnreachable,
    #[error("device did not answer in time")]
    Timeout,
    #[error("request failed ({0})")]
    Http(u16),
    #[error("unknown option `{0}`; run `streamctl --commands` for the list")]
    InvalidOption(String),
    #[error("invalid argument `{arg}` for `{option}`: {reason}")]
    InvalidArgument {
        option: String,
        arg: String,
        reason: String,
    },
    #[error("`{0}` needs an argument")]
    MissingArgument(String),
    #[error("field `{0}` is not present in the device response")]
    QueryFieldAbsent(String),
    #[error("device returned malformed JSON: {0}")]
    InvalidJson(String),
    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl CtlError {
    pub fn invalid_argument(
        option: &str,
        arg: &str,
        reason: impl Into<String>,
    ) -> Self {
        CtlError::InvalidArgument {
            option: option.to_string(),
            arg: arg.to_string(),
            reason: reason.into(),
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            CtlError::InvalidOption(_)
            | CtlError::InvalidArgument { .. }
            | CtlError::MissingArgument(_) => 2,
            CtlError::ConnectFailed => 3,
            CtlError::DeviceUnreachable => 4,
            CtlError::Timeout => 5,
            CtlError::Http(_) => 6,
            CtlError::QueryFieldAbsent(_) | CtlError::InvalidJson(_) => 7,
            CtlError::Io(_) => 1,
        }
    }
}

impl From<TransportError> for CtlError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::ConnectFailed => CtlError::ConnectFailed,
            TransportError::DeviceUnreachable => CtlError::DeviceUnreachable,
            TransportError::Timeout => CtlError::Timeout,
            TransportError::Other(code) => CtlError::Http(code),
        }
    }
}

impl From<QueryError> for CtlError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::FieldAbsent(path) => CtlError::QueryFieldAbsent(path),
            QueryError::TypeMismatch { path, expected } => {
                CtlError::InvalidJson(format!("`{path}` is not {expected}"))
            }
            QueryError::Parse(msg) => CtlError::InvalidJson(msg),
        }
    }
}
