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

use log::warn;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tahoe_client::{ContentReader, FileSize, NodeKind, NodeMetadata, TahoeClient};
use tahoe_common::capability::Capability;
use tahoe_common::{err_fs, FsError, FsResult};

pub const MAGIC_DEV: u64 = 42;
pub const DIR_SIZE: i64 = 4096;
pub const FILE_MODE: u32 = libc::S_IFREG as u32 | 0o400;
pub const DIR_MODE: u32 = libc::S_IFDIR as u32 | 0o500;

/// Hands out node identifiers, one per constructed node.
///
/// Identifiers are not stable: resolving the same path twice yields two nodes
/// with different identifiers.
#[derive(Debug)]
pub struct InodeAllocator {
    next: AtomicU64,
}

impl InodeAllocator {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    pub fn next_ino(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for InodeAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub struct NodeContext {
    pub client: Arc<dyn TahoeClient>,
    pub inodes: Arc<InodeAllocator>,
}

impl NodeContext {
    pub fn new(client: Arc<dyn TahoeClient>) -> Self {
        Self {
            client,
            inodes: Arc::new(InodeAllocator::new()),
        }
    }
}

/// Stat-like attributes of a node. `size` is -1 when the grid does not know it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeAttr {
    pub mode: u32,
    pub ino: u64,
    pub dev: u64,
    pub nlink: u32,
    pub uid: u32,
    pub gid: u32,
    pub size: i64,
    pub atime: i64,
    pub mtime: i64,
    pub ctime: i64,
}

impl NodeAttr {
    fn new(mode: u32, ino: u64, nlink: u32, size: i64) -> Self {
        Self {
            mode,
            ino,
            dev: MAGIC_DEV,
            nlink,
            uid: nix::unistd::getuid().as_raw(),
            gid: nix::unistd::getgid().as_raw(),
            size,
            atime: 0,
            mtime: 0,
            ctime: 0,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.mode & libc::S_IFMT as u32 == libc::S_IFDIR as u32
    }
}

#[derive(Clone)]
pub struct FileNode {
    ino: u64,
    cap: Capability,
    ctx: NodeContext,
}

impl FileNode {
    pub fn new(ctx: &NodeContext, cap: Capability) -> Self {
        Self {
            ino: ctx.inodes.next_ino(),
            cap,
            ctx: ctx.clone(),
        }
    }

    pub fn ino(&self) -> u64 {
        self.ino
    }

    pub fn cap(&self) -> &Capability {
        &self.cap
    }

    /// Fetches the node's metadata on every call.
    pub fn size(&self) -> FsResult<FileSize> {
        match self.ctx.client.fetch_metadata(&self.cap)? {
            NodeMetadata::File(info) => Ok(info.size),
            other => err_fs!(
                MalformedResponse,
                "expected filenode for {}, got {}",
                self.cap,
                other.kind().as_str()
            ),
        }
    }

    pub fn link_count(&self) -> u32 {
        1
    }

    pub fn attributes(&self) -> FsResult<NodeAttr> {
        let size = self.size()?;
        Ok(NodeAttr::new(
            FILE_MODE,
            self.ino,
            self.link_count(),
            size.as_st_size(),
        ))
    }

    pub fn open_content(&self) -> FsResult<ContentReader> {
        self.ctx.client.fetch_content(&self.cap)
    }
}

#[derive(Clone)]
pub struct DirNode {
    ino: u64,
    cap: Capability,
    ctx: NodeContext,
}

impl DirNode {
    pub fn new(ctx: &NodeContext, cap: Capability) -> Self {
        Self {
            ino: ctx.inodes.next_ino(),
            cap,
            ctx: ctx.clone(),
        }
    }

    pub fn ino(&self) -> u64 {
        self.ino
    }

    pub fn cap(&self) -> &Capability {
        &self.cap
    }

    pub fn size(&self) -> i64 {
        DIR_SIZE
    }

    pub fn children(&self) -> FsResult<BTreeMap<String, Node>> {
        let info = match self.ctx.client.fetch_metadata(&self.cap)? {
            NodeMetadata::Dir(info) => info,
            other => {
                return Err(FsError::NotADirectoryMetadata(format!(
                    "{} is a {}",
                    self.cap,
                    other.kind().as_str()
                )))
            }
        };

        let mut children = BTreeMap::new();
        for (name, entry) in info.children {
            if name.is_empty() {
                continue;
            }
            let cap = match entry.cap() {
                Some(v) => Capability::from_canonical(v),
                None => {
                    warn!("child {} of {} has no capability, skipped", name, self.cap);
                    continue;
                }
            };
            let node = Node::with_kind(&self.ctx, entry.kind(), cap);
            children.insert(name, node);
        }

        Ok(children)
    }

    pub fn child(&self, name: &str) -> FsResult<Node> {
        match self.children()?.remove(name) {
            Some(v) => Ok(v),
            None => err_fs!(NotFound, "no entry {} in {}", name, self.cap),
        }
    }

    /// Entry names with their modes, `.` and `..` first.
    pub fn listing(&self) -> FsResult<Vec<(String, u32)>> {
        let children = self.children()?;
        let mut entries = Vec::with_capacity(children.len() + 2);
        entries.push((".".to_string(), DIR_MODE));
        entries.push(("..".to_string(), DIR_MODE));
        for (name, node) in children {
            entries.push((name, node.mode()));
        }
        Ok(entries)
    }

    pub fn link_count(&self) -> FsResult<u32> {
        Ok(self.listing()?.len() as u32)
    }

    pub fn attributes(&self) -> FsResult<NodeAttr> {
        Ok(NodeAttr::new(
            DIR_MODE,
            self.ino,
            self.link_count()?,
            self.size(),
        ))
    }
}

#[derive(Clone)]
pub enum Node {
    File(FileNode),
    Dir(DirNode),
}

impl Node {
    /// Builds a node from the capability's type tag without touching the grid.
    pub fn make(ctx: &NodeContext, cap: Capability) -> Self {
        if cap.kind().is_dir() {
            Node::Dir(DirNode::new(ctx, cap))
        } else {
            Node::File(FileNode::new(ctx, cap))
        }
    }

    pub fn with_kind(ctx: &NodeContext, kind: NodeKind, cap: Capability) -> Self {
        match kind {
            NodeKind::DirNode => Node::Dir(DirNode::new(ctx, cap)),
            _ => Node::File(FileNode::new(ctx, cap)),
        }
    }

    pub fn ino(&self) -> u64 {
        match self {
            Node::File(f) => f.ino(),
            Node::Dir(d) => d.ino(),
        }
    }

    pub fn cap(&self) -> &Capability {
        match self {
            Node::File(f) => f.cap(),
            Node::Dir(d) => d.cap(),
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Node::Dir(_))
    }

    pub fn mode(&self) -> u32 {
        match self {
            Node::File(_) => FILE_MODE,
            Node::Dir(_) => DIR_MODE,
        }
    }

    pub fn attributes(&self) -> FsResult<NodeAttr> {
        match self {
            Node::File(f) => f.attributes(),
            Node::Dir(d) => d.attributes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tahoe_client::MemoryClient;

    fn context() -> (Arc<MemoryClient>, NodeContext) {
        let client = Arc::new(MemoryClient::new());
        let ctx = NodeContext::new(client.clone());
        (client, ctx)
    }

    #[test]
    fn make_by_type_tag() {
        let (client, ctx) = context();
        let dir = Node::make(&ctx, Capability::from_canonical("URI:DIR2:aa:bb"));
        let file = Node::make(&ctx, Capability::from_canonical("URI:CHK:cc:dd:3:10:5"));
        assert!(dir.is_dir());
        assert!(!file.is_dir());
        assert_ne!(dir.ino(), file.ino());
        assert_eq!(client.metadata_fetches(), 0);
    }

    #[test]
    fn file_attributes() -> FsResult<()> {
        let (client, ctx) = context();
        client.put_file("URI:CHK:f", "hello");
        client.put_file_unknown_size("URI:CHK:u", "x");

        let attr = Node::make(&ctx, Capability::from_canonical("URI:CHK:f")).attributes()?;
        assert_eq!(attr.mode, FILE_MODE);
        assert_eq!(attr.size, 5);
        assert_eq!(attr.nlink, 1);
        assert_eq!(attr.dev, MAGIC_DEV);
        assert_eq!(attr.mtime, 0);
        assert!(!attr.is_dir());

        let attr = Node::make(&ctx, Capability::from_canonical("URI:CHK:u")).attributes()?;
        assert_eq!(attr.size, FileSize::UNKNOWN_SIZE);
        Ok(())
    }

    #[test]
    fn file_size_on_dirnode() {
        let (client, ctx) = context();
        client.put_dir("URI:CHK:odd", &[]);
        let file = FileNode::new(&ctx, Capability::from_canonical("URI:CHK:odd"));
        assert!(matches!(file.size(), Err(FsError::MalformedResponse(_))));
    }

    #[test]
    fn dir_listing() -> FsResult<()> {
        let (client, ctx) = context();
        client.put_file("URI:CHK:a", "aaa");
        client.put_dir("URI:DIR2:sub", &[]);
        client.put_dir(
            "URI:DIR2:root",
            &[
                ("b", NodeKind::DirNode, "URI:DIR2:sub"),
                ("a.txt", NodeKind::FileNode, "URI:CHK:a"),
                ("", NodeKind::FileNode, "URI:CHK:a"),
            ],
        );

        let root = DirNode::new(&ctx, Capability::from_canonical("URI:DIR2:root"));
        let listing = root.listing()?;
        let names: Vec<&str> = listing.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec![".", "..", "a.txt", "b"]);
        assert_eq!(listing[2].1, FILE_MODE);
        assert_eq!(listing[3].1, DIR_MODE);

        let attr = root.attributes()?;
        assert_eq!(attr.nlink, 4);
        assert_eq!(attr.size, DIR_SIZE);
        assert!(attr.is_dir());

        assert!(root.child("b")?.is_dir());
        assert!(matches!(root.child("c"), Err(FsError::NotFound(_))));
        Ok(())
    }

    #[test]
    fn children_of_filenode() {
        let (client, ctx) = context();
        client.put_file("URI:DIR2:lies", "data");
        let dir = DirNode::new(&ctx, Capability::from_canonical("URI:DIR2:lies"));
        assert!(matches!(
            dir.children(),
            Err(FsError::NotADirectoryMetadata(_))
        ));
    }

    #[test]
    fn child_without_cap() -> FsResult<()> {
        let (client, ctx) = context();
        client.put_raw(
            "URI:DIR2:root",
            r#"["dirnode", {"children": {"ghost": ["filenode", {}], "rw": ["filenode", {"rw_uri": "URI:SSK:w"}]}}]"#,
            "",
        );
        let dir = DirNode::new(&ctx, Capability::from_canonical("URI:DIR2:root"));
        let children = dir.children()?;
        assert_eq!(children.len(), 1);
        assert_eq!(children["rw"].cap().as_str(), "URI:SSK:w");
        Ok(())
    }
}
