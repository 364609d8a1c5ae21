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

use crate::{ContentReader, NodeKind, NodeMetadata, TahoeClient};
use bytes::Bytes;
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tahoe_common::capability::Capability;
use tahoe_common::{FsError, FsResult};

struct MemoryNode {
    metadata: Vec<u8>,
    content: Bytes,
}

#[derive(Default)]
struct Grid {
    nodes: HashMap<Capability, MemoryNode>,
    unavailable: HashSet<Capability>,
}

/// An in-process grid answering the same two requests as the web API.
///
/// Metadata is stored as the raw JSON the web API would return, so responses go
/// through the same parser as [`crate::WebClient`].
pub struct MemoryClient {
    base: String,
    grid: RwLock<Grid>,
    metadata_fetches: AtomicU64,
    content_fetches: AtomicU64,
}

impl MemoryClient {
    pub const BASE: &'static str = "memory://grid/";

    pub fn new() -> Self {
        Self {
            base: Self::BASE.to_string(),
            grid: RwLock::new(Grid::default()),
            metadata_fetches: AtomicU64::new(0),
            content_fetches: AtomicU64::new(0),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Grid> {
        self.grid.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Grid> {
        self.grid.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Store a node whose metadata response is exactly `metadata`.
    pub fn put_raw(&self, cap: &str, metadata: impl Into<Vec<u8>>, content: impl Into<Bytes>) {
        let node = MemoryNode {
            metadata: metadata.into(),
            content: content.into(),
        };
        self.write()
            .nodes
            .insert(Capability::from_canonical(cap), node);
    }

    pub fn put_file(&self, cap: &str, content: impl Into<Bytes>) {
        let content = content.into();
        let metadata = json!(["filenode", {"ro_uri": cap, "size": content.len()}]);
        self.put_raw(cap, metadata.to_string(), content);
    }

    /// A file whose encoding does not let the API report a size.
    pub fn put_file_unknown_size(&self, cap: &str, content: impl Into<Bytes>) {
        let metadata = json!(["filenode", {"ro_uri": cap, "size": "?"}]);
        self.put_raw(cap, metadata.to_string(), content);
    }

    /// A directory with `(name, kind, child cap)` entries.
    pub fn put_dir(&self, cap: &str, children: &[(&str, NodeKind, &str)]) {
        let mut map = Map::new();
        for (name, kind, child) in children {
            map.insert(
                name.to_string(),
                json!([kind.as_str(), {"ro_uri": child, "metadata": {}}]),
            );
        }
        let metadata = json!(["dirnode", {"ro_uri": cap, "children": Value::Object(map)}]);
        self.put_raw(cap, metadata.to_string(), Bytes::new());
    }

    /// Make every request for `cap` fail as if the node were unreachable.
    pub fn set_unavailable(&self, cap: &str, unavailable: bool) {
        let cap = Capability::from_canonical(cap);
        let mut grid = self.write();
        if unavailable {
            grid.unavailable.insert(cap);
        } else {
            grid.unavailable.remove(&cap);
        }
    }

    pub fn metadata_fetches(&self) -> u64 {
        self.metadata_fetches.load(Ordering::Relaxed)
    }

    pub fn content_fetches(&self) -> u64 {
        self.content_fetches.load(Ordering::Relaxed)
    }

    fn with_node<T>(&self, cap: &Capability, f: impl FnOnce(&MemoryNode) -> T) -> FsResult<T> {
        let grid = self.read();
        if grid.unavailable.contains(cap) {
            return Err(FsError::remote(format!("GET {} failed", self.node_url(cap))));
        }
        match grid.nodes.get(cap) {
            Some(node) => Ok(f(node)),
            None => Err(FsError::remote(format!(
                "GET {} returned 410 Gone",
                self.node_url(cap)
            ))),
        }
    }
}

impl Default for MemoryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl TahoeClient for MemoryClient {
    fn base(&self) -> &str {
        &self.base
    }

    fn fetch_metadata(&self, cap: &Capability) -> FsResult<NodeMetadata> {
        self.metadata_fetches.fetch_add(1, Ordering::Relaxed);
        let body = self.with_node(cap, |node| node.metadata.clone())?;
        NodeMetadata::from_slice(&body)
    }

    fn fetch_content(&self, cap: &Capability) -> FsResult<ContentReader> {
        self.content_fetches.fetch_add(1, Ordering::Relaxed);
        let content = self.with_node(cap, |node| node.content.clone())?;
        Ok(Box::new(Cursor::new(content)))
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryClient;
    use crate::{FileSize, NodeKind, NodeMetadata, TahoeClient};
    use std::io::Read;
    use tahoe_common::capability::Capability;
    use tahoe_common::FsError;

    #[test]
    fn file_and_dir() {
        let client = MemoryClient::new();
        client.put_file("URI:CHK:xyz", "hello");
        client.put_dir("URI:DIR2:root", &[("a.txt", NodeKind::FileNode, "URI:CHK:xyz")]);

        let cap = Capability::from_canonical("URI:CHK:xyz");
        match client.fetch_metadata(&cap).unwrap() {
            NodeMetadata::File(info) => assert_eq!(info.size, FileSize::Known(5)),
            m => panic!("unexpected {:?}", m),
        }

        let mut buf = String::new();
        client
            .fetch_content(&cap)
            .unwrap()
            .read_to_string(&mut buf)
            .unwrap();
        assert_eq!(buf, "hello");

        let root = Capability::from_canonical("URI:DIR2:root");
        match client.fetch_metadata(&root).unwrap() {
            NodeMetadata::Dir(dir) => {
                assert_eq!(dir.children["a.txt"].cap(), Some("URI:CHK:xyz"))
            }
            m => panic!("unexpected {:?}", m),
        }

        assert_eq!(client.metadata_fetches(), 2);
        assert_eq!(client.content_fetches(), 1);
    }

    #[test]
    fn missing_and_unavailable() {
        let client = MemoryClient::new();
        let cap = Capability::from_canonical("URI:CHK:none");
        let err = client.fetch_metadata(&cap).unwrap_err();
        assert!(matches!(err, FsError::RemoteUnavailable(_)));

        client.put_file("URI:CHK:none", "x");
        client.set_unavailable("URI:CHK:none", true);
        assert!(client.fetch_content(&cap).is_err());

        client.set_unavailable("URI:CHK:none", false);
        assert!(client.fetch_content(&cap).is_ok());
    }
}
