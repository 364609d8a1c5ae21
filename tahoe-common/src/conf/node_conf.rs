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

use crate::capability::Capability;
use crate::{FsError, FsResult};
use log::info;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Where the storage node's web API lives and which directory is mounted as `/`,
/// both read from a node base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConf {
    pub base_url: String,
    pub root_cap: Capability,
}

impl NodeConf {
    pub const NODE_URL_FILE: &'static str = "node.url";
    pub const WEBPORT_FILE: &'static str = "webport";
    pub const ROOT_CAP_FILE: &'static str = "private/root_dir.cap";

    pub fn load(basedir: impl AsRef<Path>) -> FsResult<Self> {
        let basedir = basedir.as_ref();
        let base_url = Self::load_url(basedir)?;
        let root_cap = Self::load_root_cap(basedir)?;

        info!("node url: {}, root dir cap type: {}", base_url, root_cap.type_tag());
        Ok(Self { base_url, root_cap })
    }

    pub fn load_url(basedir: &Path) -> FsResult<String> {
        let url_file = basedir.join(Self::NODE_URL_FILE);
        if url_file.exists() {
            let mut url = Self::read_conf_file(&url_file)?;
            if !url.ends_with('/') {
                url.push('/');
            }
            return Ok(url);
        }

        let port_file = basedir.join(Self::WEBPORT_FILE);
        let contents = Self::read_conf_file(&port_file)?;
        Self::url_from_webport(&contents)
    }

    /// `tcp:8123:interface=127.0.0.1` -> `http://localhost:8123/`
    pub fn url_from_webport(webport: &str) -> FsResult<String> {
        let mut fields = webport.trim().split(':');
        let proto = fields.next().unwrap_or_default();
        if proto != "tcp" {
            return Err(FsError::conf(format!(
                "unsupported webport protocol {:?} in {:?}",
                proto, webport
            )));
        }

        let port = fields
            .next()
            .and_then(|p| p.parse::<u16>().ok())
            .ok_or_else(|| FsError::conf(format!("invalid webport: {:?}", webport)))?;

        Ok(format!("http://localhost:{}/", port))
    }

    pub fn load_root_cap(basedir: &Path) -> FsResult<Capability> {
        let cap_file = basedir.join(Self::ROOT_CAP_FILE);
        let cap = Self::read_conf_file(&cap_file)?;
        Capability::canonicalize(cap)
    }

    fn read_conf_file(path: &Path) -> FsResult<String> {
        match fs::read_to_string(path) {
            Ok(v) => Ok(v.trim().to_string()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(FsError::conf(format!(
                "a required configuration file was not found: {}",
                path.display()
            ))),
            Err(e) => Err(FsError::conf(format!(
                "failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::NodeConf;
    use crate::FsError;
    use std::fs;
    use std::path::PathBuf;

    fn test_basedir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tahoe-node-conf-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(dir.join("private")).unwrap();
        dir
    }

    #[test]
    fn node_url_file() {
        let dir = test_basedir();
        fs::write(dir.join("node.url"), "http://127.0.0.1:3456\n").unwrap();
        fs::write(dir.join("private/root_dir.cap"), "URI%3ADIR2%3Aaa%3Abb\n").unwrap();

        let conf = NodeConf::load(&dir).unwrap();
        assert_eq!(conf.base_url, "http://127.0.0.1:3456/");
        assert_eq!(conf.root_cap.as_str(), "URI:DIR2:aa:bb");
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn webport_fallback() {
        let dir = test_basedir();
        fs::write(dir.join("webport"), "tcp:8123:interface=127.0.0.1").unwrap();
        assert_eq!(
            NodeConf::load_url(&dir).unwrap(),
            "http://localhost:8123/"
        );
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn webport_invalid() {
        assert!(NodeConf::url_from_webport("ssl:443").is_err());
        assert!(NodeConf::url_from_webport("tcp:port").is_err());
        assert!(NodeConf::url_from_webport("").is_err());
    }

    #[test]
    fn missing_root_cap() {
        let dir = test_basedir();
        fs::write(dir.join("node.url"), "http://127.0.0.1:3456/").unwrap();

        let err = NodeConf::load(&dir).unwrap_err();
        match err {
            FsError::Conf(msg) => assert!(msg.contains("root_dir.cap"), "{}", msg),
            e => panic!("unexpected error {:?}", e),
        }
        let _ = fs::remove_dir_all(&dir);
    }
}
