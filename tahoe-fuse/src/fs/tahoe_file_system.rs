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

use crate::fs::Caller;
use crate::handle::{check_open_flags, FileHandleCache};
use crate::node::{DirNode, Node, NodeAttr, NodeContext};
use crate::resolver::resolve;
use crate::{FuseError, FuseResult};
use bytes::Bytes;
use log::info;
use std::fmt::Debug;
use std::sync::Arc;
use tahoe_client::{TahoeClient, WebClient};
use tahoe_common::capability::Capability;
use tahoe_common::conf::{FuseConf, NodeConf};
use tahoe_common::{err_fs, FsResult};

const TRACE_RESULT_LIMIT: usize = 256;

/// Path based, read-only view of a grid directory tree.
///
/// Every public operation goes through [`TahoeFileSystem::trace`], which logs the
/// call with its caller and turns the outcome into a [`FuseResult`].
pub struct TahoeFileSystem {
    root: DirNode,
    handles: FileHandleCache,
    conf: FuseConf,
}

impl TahoeFileSystem {
    pub fn new(conf: FuseConf, client: Arc<dyn TahoeClient>, root_cap: Capability) -> FsResult<Self> {
        if !root_cap.kind().is_dir() {
            return err_fs!(NotADirectory, "root capability {} is not a directory", root_cap);
        }

        let ctx = NodeContext::new(client);
        let root = DirNode::new(&ctx, root_cap);
        info!("Root: {} at {}", root.cap(), ctx.client.base());

        Ok(Self {
            root,
            handles: FileHandleCache::new(),
            conf,
        })
    }

    /// Builds the file system on top of the node's web API.
    pub fn with_node_conf(conf: FuseConf, node_conf: NodeConf) -> FsResult<Self> {
        let client = WebClient::new(&node_conf.base_url, conf.request_deadline())?;
        Self::new(conf, Arc::new(client), node_conf.root_cap)
    }

    pub fn conf(&self) -> &FuseConf {
        &self.conf
    }

    pub fn root(&self) -> &DirNode {
        &self.root
    }

    pub fn handles(&self) -> &FileHandleCache {
        &self.handles
    }

    fn trace<T, A, F>(&mut self, caller: &Caller, op: &str, args: A, f: F) -> FuseResult<T>
    where
        T: Debug,
        A: Debug,
        F: FnOnce(&mut Self) -> FsResult<T>,
    {
        info!("[{}] {}{:?}", caller, op, args);
        match f(self) {
            Ok(v) => {
                let repr: String = format!("{:?}", v).chars().take(TRACE_RESULT_LIMIT).collect();
                info!("-> {}", repr);
                Ok(v)
            }

            Err(e) => {
                let e = FuseError::from(e);
                info!("-> {} {} ({})", e.errno_name(), e.error().kind_name(), e.error());
                Err(e)
            }
        }
    }

    pub fn getattr(&mut self, caller: &Caller, path: &str) -> FuseResult<NodeAttr> {
        self.trace(caller, "getattr", (path,), |fs| {
            resolve(&fs.root, path)?.attributes()
        })
    }

    pub fn getdir(&mut self, caller: &Caller, path: &str) -> FuseResult<Vec<(String, u32)>> {
        self.trace(caller, "getdir", (path,), |fs| match resolve(&fs.root, path)? {
            Node::Dir(dir) => dir.listing(),
            Node::File(_) => err_fs!(NotADirectory, "{}", path),
        })
    }

    pub fn open(&mut self, caller: &Caller, path: &str, flags: i32) -> FuseResult<()> {
        self.trace(caller, "open", (path, flags), |fs| {
            check_open_flags(flags)?;
            if fs.handles.is_open(path) {
                return Ok(());
            }
            let node = resolve(&fs.root, path)?;
            fs.handles.open(path, &node, flags)
        })
    }

    pub fn read(
        &mut self,
        caller: &Caller,
        path: &str,
        length: usize,
        offset: u64,
    ) -> FuseResult<Bytes> {
        self.trace(caller, "read", (path, length, offset), |fs| {
            fs.handles.read(path, offset, length)
        })
    }

    pub fn release(&mut self, caller: &Caller, path: &str) -> FuseResult<()> {
        self.trace(caller, "release", (path,), |fs| fs.handles.release(path))
    }

    fn unsupported<A: Debug>(&mut self, caller: &Caller, op: &str, args: A) -> FuseResult<()> {
        self.trace(caller, op, args, |_| err_fs!(Unsupported, "{}", op))
    }

    pub fn mkdir(&mut self, caller: &Caller, path: &str, mode: u32) -> FuseResult<()> {
        self.unsupported(caller, "mkdir", (path, mode))
    }

    pub fn mknod(&mut self, caller: &Caller, path: &str, mode: u32, dev: u32) -> FuseResult<()> {
        self.unsupported(caller, "mknod", (path, mode, dev))
    }

    pub fn unlink(&mut self, caller: &Caller, path: &str) -> FuseResult<()> {
        self.unsupported(caller, "unlink", (path,))
    }

    pub fn rmdir(&mut self, caller: &Caller, path: &str) -> FuseResult<()> {
        self.unsupported(caller, "rmdir", (path,))
    }

    pub fn rename(&mut self, caller: &Caller, old: &str, new: &str) -> FuseResult<()> {
        self.unsupported(caller, "rename", (old, new))
    }

    pub fn link(&mut self, caller: &Caller, target: &str, link: &str) -> FuseResult<()> {
        self.unsupported(caller, "link", (target, link))
    }

    pub fn symlink(&mut self, caller: &Caller, target: &str, link: &str) -> FuseResult<()> {
        self.unsupported(caller, "symlink", (target, link))
    }

    pub fn chmod(&mut self, caller: &Caller, path: &str, mode: u32) -> FuseResult<()> {
        self.unsupported(caller, "chmod", (path, mode))
    }

    pub fn chown(
        &mut self,
        caller: &Caller,
        path: &str,
        uid: Option<u32>,
        gid: Option<u32>,
    ) -> FuseResult<()> {
        self.unsupported(caller, "chown", (path, uid, gid))
    }

    pub fn truncate(&mut self, caller: &Caller, path: &str, size: u64) -> FuseResult<()> {
        self.unsupported(caller, "truncate", (path, size))
    }

    pub fn utime(
        &mut self,
        caller: &Caller,
        path: &str,
        atime: Option<i64>,
        mtime: Option<i64>,
    ) -> FuseResult<()> {
        self.unsupported(caller, "utime", (path, atime, mtime))
    }

    pub fn readlink(&mut self, caller: &Caller, path: &str) -> FuseResult<()> {
        self.unsupported(caller, "readlink", (path,))
    }

    pub fn fsync(&mut self, caller: &Caller, path: &str, datasync: bool) -> FuseResult<()> {
        self.unsupported(caller, "fsync", (path, datasync))
    }

    pub fn statfs(&mut self, caller: &Caller) -> FuseResult<()> {
        self.unsupported(caller, "statfs", ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tahoe_client::{MemoryClient, NodeKind};

    fn fs() -> (Arc<MemoryClient>, TahoeFileSystem) {
        let client = Arc::new(MemoryClient::new());
        client.put_file("URI:CHK:a", "hello");
        client.put_dir("URI:DIR2:root", &[("a.txt", NodeKind::FileNode, "URI:CHK:a")]);
        let root = Capability::from_canonical("URI:DIR2:root");
        let fs = TahoeFileSystem::new(FuseConf::default(), client.clone(), root).unwrap();
        (client, fs)
    }

    #[test]
    fn root_must_be_dir() {
        let client = Arc::new(MemoryClient::new());
        let cap = Capability::from_canonical("URI:CHK:a");
        assert!(TahoeFileSystem::new(FuseConf::default(), client, cap).is_err());
    }

    #[test]
    fn errno() {
        let (_, mut fs) = fs();
        let caller = Caller::current();
        assert_eq!(fs.getattr(&caller, "/nope").unwrap_err().errno(), libc::ENOENT);
        assert_eq!(fs.getdir(&caller, "/a.txt").unwrap_err().errno(), libc::ENOTDIR);
        assert_eq!(fs.open(&caller, "/", libc::O_RDONLY).unwrap_err().errno(), libc::EISDIR);
        assert_eq!(fs.read(&caller, "/a.txt", 1, 0).unwrap_err().errno(), libc::EBADF);
        assert_eq!(fs.mkdir(&caller, "/x", 0o755).unwrap_err().errno(), libc::ENOSYS);
    }

    #[test]
    fn open_cached_skips_resolution() {
        let (client, mut fs) = fs();
        let caller = Caller::current();
        fs.open(&caller, "/a.txt", libc::O_RDONLY).unwrap();
        let fetches = client.metadata_fetches();

        fs.open(&caller, "/a.txt", libc::O_RDONLY).unwrap();
        assert_eq!(client.metadata_fetches(), fetches);
        assert_eq!(client.content_fetches(), 1);
        assert_eq!(fs.handles().len(), 1);
    }
}
