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

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tahoe_client::{MemoryClient, NodeKind};
use tahoe_common::capability::Capability;
use tahoe_common::conf::{FuseConf, NodeConf};
use tahoe_common::FsResult;
use tahoe_fuse::fs::TahoeFileSystem;
use tahoe_fuse::session::FuseSession;

pub const ROOT_CAP: &str = "URI:DIR2:root:tree";
pub const A_TXT_CAP: &str = "URI:CHK:a:txt:3:10:5";
pub const A_TXT: &[u8] = b"hello";

/// A small in-memory grid:
///
/// ```text
/// /
/// |-- a.txt          "hello"
/// |-- docs/
/// |   |-- readme     "read me first"
/// |   `-- blob       size unknown
/// `-- empty/
/// ```
pub struct Testing {
    pub client: Arc<MemoryClient>,
    pub root_cap: Capability,
}

impl Testing {
    pub fn new() -> Self {
        let client = Arc::new(MemoryClient::new());
        client.put_file(A_TXT_CAP, A_TXT);
        client.put_file("URI:CHK:readme", "read me first");
        client.put_file_unknown_size("URI:CHK:blob", vec![7u8; 10000]);
        client.put_dir("URI:DIR2:empty", &[]);
        client.put_dir(
            "URI:DIR2:docs",
            &[
                ("readme", NodeKind::FileNode, "URI:CHK:readme"),
                ("blob", NodeKind::FileNode, "URI:CHK:blob"),
            ],
        );
        client.put_dir(
            ROOT_CAP,
            &[
                ("a.txt", NodeKind::FileNode, A_TXT_CAP),
                ("docs", NodeKind::DirNode, "URI:DIR2:docs"),
                ("empty", NodeKind::DirNode, "URI:DIR2:empty"),
            ],
        );

        Self {
            client,
            root_cap: Capability::from_canonical(ROOT_CAP),
        }
    }

    pub fn fs(&self) -> FsResult<TahoeFileSystem> {
        TahoeFileSystem::new(
            FuseConf::default(),
            self.client.clone(),
            self.root_cap.clone(),
        )
    }

    pub fn session(&self) -> FsResult<FuseSession> {
        Ok(FuseSession::new(self.fs()?))
    }

    /// A fresh directory under the system temp dir.
    pub fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tahoe-tests-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// A node base directory holding `node.url` and `private/root_dir.cap`.
    pub fn node_dir(url: &str, root_cap: &str) -> PathBuf {
        let dir = Self::temp_dir();
        fs::write(dir.join(NodeConf::NODE_URL_FILE), url).unwrap();
        let cap_file = dir.join(NodeConf::ROOT_CAP_FILE);
        fs::create_dir_all(cap_file.parent().unwrap()).unwrap();
        fs::write(cap_file, root_cap).unwrap();
        dir
    }
}

impl Default for Testing {
    fn default() -> Self {
        Self::new()
    }
}
