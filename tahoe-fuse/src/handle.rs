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

use crate::node::Node;
use bytes::Bytes;
use log::{debug, warn};
use std::collections::HashMap;
use std::io::Read;
use tahoe_common::{err_fs, FsError, FsResult};

// 64-bit glibc defines O_LARGEFILE as 0, while the kernel still sets its own bit.
#[cfg(target_os = "linux")]
const O_LARGEFILE: i32 = if libc::O_LARGEFILE == 0 {
    0o100000
} else {
    libc::O_LARGEFILE
};
#[cfg(not(target_os = "linux"))]
const O_LARGEFILE: i32 = 0;

pub const ACCEPTED_OPEN_FLAGS: i32 =
    libc::O_RDONLY | libc::O_NONBLOCK | libc::O_SYNC | O_LARGEFILE;

pub fn check_open_flags(flags: i32) -> FsResult<()> {
    let rejected = flags & !ACCEPTED_OPEN_FLAGS;
    if rejected != 0 {
        warn!("Flag not supported: {:#o}", rejected);
        return err_fs!(Unsupported, "open flags {:#o}", rejected);
    }
    Ok(())
}

/// Whole-file contents of every open path, keyed by path.
///
/// Opening an already open path is a no-op; one release closes it.
#[derive(Debug, Default)]
pub struct FileHandleCache {
    contents: HashMap<String, Bytes>,
}

impl FileHandleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, path: &str, node: &Node, flags: i32) -> FsResult<()> {
        check_open_flags(flags)?;
        if self.contents.contains_key(path) {
            return Ok(());
        }

        let file = match node {
            Node::File(f) => f,
            Node::Dir(_) => return err_fs!(IsADirectory, "{}", path),
        };

        let mut buf = Vec::new();
        file.open_content()?
            .read_to_end(&mut buf)
            .map_err(|e| FsError::remote(format!("reading {}: {}", file.cap(), e)))?;

        debug!("cached {} bytes for {}", buf.len(), path);
        self.contents.insert(path.to_string(), Bytes::from(buf));
        Ok(())
    }

    /// Bytes in `[offset, offset + length)`, clamped to the content.
    pub fn read(&self, path: &str, offset: u64, length: usize) -> FsResult<Bytes> {
        let content = match self.contents.get(path) {
            Some(v) => v,
            None => return err_fs!(NotOpen, "{}", path),
        };

        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(content.len());
        let end = start.saturating_add(length).min(content.len());
        Ok(content.slice(start..end))
    }

    pub fn release(&mut self, path: &str) -> FsResult<()> {
        match self.contents.remove(path) {
            Some(_) => Ok(()),
            None => err_fs!(NotOpen, "{}", path),
        }
    }

    pub fn is_open(&self, path: &str) -> bool {
        self.contents.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeContext;
    use std::sync::Arc;
    use tahoe_client::MemoryClient;
    use tahoe_common::capability::Capability;

    fn file(client: &Arc<MemoryClient>, cap: &str) -> Node {
        let ctx = NodeContext::new(client.clone());
        Node::make(&ctx, Capability::from_canonical(cap))
    }

    #[test]
    fn flags() {
        assert!(check_open_flags(libc::O_RDONLY).is_ok());
        assert!(check_open_flags(libc::O_RDONLY | libc::O_NONBLOCK | libc::O_SYNC).is_ok());
        assert!(check_open_flags(O_LARGEFILE).is_ok());
        for flags in [libc::O_WRONLY, libc::O_RDWR, libc::O_CREAT, libc::O_TRUNC] {
            assert!(matches!(
                check_open_flags(flags),
                Err(FsError::Unsupported(_))
            ));
        }
    }

    #[test]
    fn open_read_release() -> FsResult<()> {
        let client = Arc::new(MemoryClient::new());
        client.put_file("URI:CHK:a", "hello world");
        let node = file(&client, "URI:CHK:a");

        let mut cache = FileHandleCache::new();
        cache.open("/a", &node, libc::O_RDONLY)?;
        cache.open("/a", &node, libc::O_RDONLY)?;
        assert_eq!(client.content_fetches(), 1);
        assert_eq!(cache.len(), 1);

        assert_eq!(cache.read("/a", 0, 5)?, Bytes::from_static(b"hello"));
        assert_eq!(cache.read("/a", 6, 100)?, Bytes::from_static(b"world"));
        assert!(cache.read("/a", 11, 4)?.is_empty());
        assert!(cache.read("/a", u64::MAX, 4)?.is_empty());

        cache.release("/a")?;
        assert!(!cache.is_open("/a"));
        assert!(matches!(cache.read("/a", 0, 1), Err(FsError::NotOpen(_))));
        assert!(matches!(cache.release("/a"), Err(FsError::NotOpen(_))));
        Ok(())
    }

    #[test]
    fn failed_open_leaves_nothing() {
        let client = Arc::new(MemoryClient::new());
        client.put_file("URI:CHK:a", "hello");
        client.put_dir("URI:DIR2:d", &[]);
        let mut cache = FileHandleCache::new();

        let node = file(&client, "URI:CHK:a");
        let res = cache.open("/a", &node, libc::O_WRONLY);
        assert!(matches!(res, Err(FsError::Unsupported(_))));
        assert_eq!(client.content_fetches(), 0);

        client.set_unavailable("URI:CHK:a", true);
        assert!(matches!(
            cache.open("/a", &node, libc::O_RDONLY),
            Err(FsError::RemoteUnavailable(_))
        ));

        let dir = file(&client, "URI:DIR2:d");
        assert!(matches!(
            cache.open("/d", &dir, libc::O_RDONLY),
            Err(FsError::IsADirectory(_))
        ));
        assert!(cache.is_empty());
    }
}
