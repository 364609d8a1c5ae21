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

use crate::FUSE_ROOT_ID;
use std::collections::HashMap;

/// Kernel inode numbers for the paths the kernel has looked up.
///
/// The tree never changes under the mount, so a path keeps its number until the
/// kernel forgets it.
#[derive(Debug)]
pub struct NodeTable {
    paths: HashMap<u64, String>,
    inos: HashMap<String, u64>,
    next_ino: u64,
}

impl NodeTable {
    pub const ROOT_PATH: &'static str = "/";

    pub fn new() -> Self {
        let mut table = Self {
            paths: HashMap::new(),
            inos: HashMap::new(),
            next_ino: FUSE_ROOT_ID + 1,
        };
        table.paths.insert(FUSE_ROOT_ID, Self::ROOT_PATH.to_string());
        table.inos.insert(Self::ROOT_PATH.to_string(), FUSE_ROOT_ID);
        table
    }

    pub fn get_path(&self, ino: u64) -> Option<&str> {
        self.paths.get(&ino).map(|v| v.as_str())
    }

    pub fn get_ino(&self, path: &str) -> Option<u64> {
        self.inos.get(path).copied()
    }

    pub fn child_path(&self, parent: u64, name: &str) -> Option<String> {
        let parent = self.get_path(parent)?;
        if parent == Self::ROOT_PATH {
            Some(format!("/{}", name))
        } else {
            Some(format!("{}/{}", parent, name))
        }
    }

    pub fn parent_path(path: &str) -> &str {
        match path.rfind('/') {
            Some(0) | None => Self::ROOT_PATH,
            Some(idx) => &path[..idx],
        }
    }

    pub fn get_or_insert(&mut self, path: &str) -> u64 {
        if let Some(ino) = self.inos.get(path) {
            return *ino;
        }

        let ino = self.next_ino;
        self.next_ino += 1;
        self.paths.insert(ino, path.to_string());
        self.inos.insert(path.to_string(), ino);
        ino
    }

    pub fn forget(&mut self, ino: u64) {
        if ino == FUSE_ROOT_ID {
            return;
        }
        if let Some(path) = self.paths.remove(&ino) {
            self.inos.remove(&path);
        }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl Default for NodeTable {
    fn default() -> Self {
        Self::new()
    }
}
