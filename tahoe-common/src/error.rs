// Copyright 2025 OPPO.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt::Display;
use std::io;
use thiserror::Error;

/// Failure kinds raised anywhere below the filesystem call surface.
///
/// Every variant is surfaced to the caller unchanged; nothing here is retried.
#[derive(Error, Debug)]
pub enum FsError {
    #[error("invalid capability: {0}")]
    InvalidCapability(String),

    #[error("remote unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("not a directory: {0}")]
    NotADirectory(String),

    #[error("metadata is not a directory: {0}")]
    NotADirectoryMetadata(String),

    #[error("is a directory: {0}")]
    IsADirectory(String),

    #[error("not open: {0}")]
    NotOpen(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("configuration error: {0}")]
    Conf(String),

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl FsError {
    pub fn invalid_capability(msg: impl Display) -> Self {
        Self::InvalidCapability(msg.to_string())
    }

    pub fn remote(msg: impl Display) -> Self {
        Self::RemoteUnavailable(msg.to_string())
    }

    pub fn malformed(msg: impl Display) -> Self {
        Self::MalformedResponse(msg.to_string())
    }

    pub fn not_found(msg: impl Display) -> Self {
        Self::NotFound(msg.to_string())
    }

    pub fn unsupported(msg: impl Display) -> Self {
        Self::Unsupported(msg.to_string())
    }

    pub fn conf(msg: impl Display) -> Self {
        Self::Conf(msg.to_string())
    }

    /// Short name of the failure kind, used by call tracing.
    pub fn kind_name(&self) -> &'static str {
        match self {
            FsError::InvalidCapability(_) => "InvalidCapability",
            FsError::RemoteUnavailable(_) => "RemoteUnavailable",
            FsError::MalformedResponse(_) => "MalformedResponse",
            FsError::NotFound(_) => "NotFound",
            FsError::NotADirectory(_) => "NotADirectory",
            FsError::NotADirectoryMetadata(_) => "NotADirectoryMetadata",
            FsError::IsADirectory(_) => "IsADirectory",
            FsError::NotOpen(_) => "NotOpen",
            FsError::Unsupported(_) => "Unsupported",
            FsError::Conf(_) => "Conf",
            FsError::Io(_) => "Io",
        }
    }
}

impl From<serde_json::Error> for FsError {
    fn from(value: serde_json::Error) -> Self {
        Self::MalformedResponse(value.to_string())
    }
}

impl From<toml::de::Error> for FsError {
    fn from(value: toml::de::Error) -> Self {
        Self::Conf(value.to_string())
    }
}

pub type FsResult<T> = Result<T, FsError>;

#[macro_export]
macro_rules! err_fs {
    ($kind:ident, $($arg:tt)*) => {
        Err($crate::error::FsError::$kind(format!($($arg)*)))
    };
}
