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

use crate::node::{DirNode, Node};
use tahoe_common::{err_fs, FsResult};

/// Walks `path` from `root`, one child lookup per segment.
///
/// `/` is the root itself. A trailing slash produces an empty final segment, and
/// no directory has a child with an empty name.
pub fn resolve(root: &DirNode, path: &str) -> FsResult<Node> {
    let rest = match path.strip_prefix('/') {
        Some(v) => v,
        None => return err_fs!(NotFound, "{} is not an absolute path", path),
    };

    let mut current = Node::Dir(root.clone());
    if rest.is_empty() {
        return Ok(current);
    }

    for segment in rest.split('/') {
        let dir = match &current {
            Node::Dir(d) => d,
            Node::File(_) => return err_fs!(NotADirectory, "{}", path),
        };
        current = dir.child(segment)?;
    }

    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::resolve;
    use crate::node::{DirNode, NodeContext};
    use std::sync::Arc;
    use tahoe_client::{MemoryClient, NodeKind};
    use tahoe_common::capability::Capability;
    use tahoe_common::{FsError, FsResult};

    fn tree() -> DirNode {
        let client = Arc::new(MemoryClient::new());
        client.put_file("URI:CHK:a", "aaa");
        client.put_file("URI:CHK:c", "ccc");
        client.put_dir("URI:DIR2:b", &[("c", NodeKind::FileNode, "URI:CHK:c")]);
        client.put_dir(
            "URI:DIR2:root",
            &[
                ("a.txt", NodeKind::FileNode, "URI:CHK:a"),
                ("b", NodeKind::DirNode, "URI:DIR2:b"),
            ],
        );
        let ctx = NodeContext::new(client);
        DirNode::new(&ctx, Capability::from_canonical("URI:DIR2:root"))
    }

    #[test]
    fn root() -> FsResult<()> {
        let root = tree();
        let node = resolve(&root, "/")?;
        assert!(node.is_dir());
        assert_eq!(node.ino(), root.ino());
        Ok(())
    }

    #[test]
    fn nested() -> FsResult<()> {
        let root = tree();
        let node = resolve(&root, "/b/c")?;
        assert!(!node.is_dir());
        assert_eq!(node.cap().as_str(), "URI:CHK:c");
        assert!(resolve(&root, "/b")?.is_dir());
        Ok(())
    }

    #[test]
    fn failures() {
        let root = tree();
        assert!(matches!(resolve(&root, "/missing"), Err(FsError::NotFound(_))));
        assert!(matches!(resolve(&root, "/b/missing"), Err(FsError::NotFound(_))));
        assert!(matches!(resolve(&root, "/b/"), Err(FsError::NotFound(_))));
        assert!(matches!(resolve(&root, "a.txt"), Err(FsError::NotFound(_))));
        assert!(matches!(
            resolve(&root, "/a.txt/x"),
            Err(FsError::NotADirectory(_))
        ));
    }
}
