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

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tahoe_common::{FsError, FsResult};

/// The discriminant of a metadata response, and the kind tag of a directory child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum NodeKind {
    #[serde(rename = "dirnode")]
    DirNode,
    #[serde(rename = "filenode")]
    FileNode,
    #[serde(other)]
    Unknown,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::DirNode => "dirnode",
            NodeKind::FileNode => "filenode",
            NodeKind::Unknown => "unknown",
        }
    }
}

/// File length as reported by the web API. Some encodings cannot report it, in
/// which case the API sends `"?"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileSize {
    Known(u64),
    Unknown,
}

impl FileSize {
    /// The `st_size` style rendering: unknown sizes become -1.
    pub const UNKNOWN_SIZE: i64 = -1;

    fn from_value(value: Option<&Value>) -> Self {
        match value.and_then(Value::as_u64) {
            Some(v) => FileSize::Known(v),
            None => FileSize::Unknown,
        }
    }

    pub fn as_st_size(&self) -> i64 {
        match self {
            FileSize::Known(v) => i64::try_from(*v).unwrap_or(i64::MAX),
            FileSize::Unknown => Self::UNKNOWN_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub size: FileSize,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChildInfo {
    #[serde(default)]
    pub ro_uri: Option<String>,
    #[serde(default)]
    pub rw_uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChildEntry(pub NodeKind, pub ChildInfo);

impl ChildEntry {
    pub fn kind(&self) -> NodeKind {
        self.0
    }

    /// The read-only capability when present, else the read-write one.
    pub fn cap(&self) -> Option<&str> {
        self.1.ro_uri.as_deref().or(self.1.rw_uri.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DirInfo {
    #[serde(default)]
    pub children: BTreeMap<String, ChildEntry>,
}

/// Decoded response of `GET <base>uri/<cap>?t=json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeMetadata {
    Dir(DirInfo),
    File(FileInfo),
}

impl NodeMetadata {
    /// Parse the two element `[discriminant, body]` response.
    pub fn from_slice(bytes: &[u8]) -> FsResult<Self> {
        let (kind, body): (NodeKind, Value) = serde_json::from_slice(bytes)?;
        Self::from_parts(kind, body)
    }

    pub fn from_parts(kind: NodeKind, body: Value) -> FsResult<Self> {
        match kind {
            NodeKind::DirNode => Ok(NodeMetadata::Dir(serde_json::from_value(body)?)),

            NodeKind::FileNode => {
                if !body.is_object() {
                    return Err(FsError::malformed(format!(
                        "filenode body is not an object: {}",
                        body
                    )));
                }
                Ok(NodeMetadata::File(FileInfo {
                    size: FileSize::from_value(body.get("size")),
                }))
            }

            NodeKind::Unknown => Err(FsError::malformed("unexpected metadata discriminant")),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            NodeMetadata::Dir(_) => NodeKind::DirNode,
            NodeMetadata::File(_) => NodeKind::FileNode,
        }
    }
}
