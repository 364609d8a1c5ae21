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

use crate::conf::LogConf;
use crate::utils::DurationUnit;
use crate::{FsError, FsResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Mount configuration. Loaded from an optional TOML file, then overridden by
/// command line arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FuseConf {
    // Node base directory holding node.url / webport and private/root_dir.cap.
    pub basedir: String,

    // Mount point.
    pub mnt_path: String,

    pub fs_name: String,

    pub allow_other: bool,

    // fuser adds allow_other to auto_unmount mounts, which a non-root user may only
    // request with user_allow_other in /etc/fuse.conf.
    pub auto_unmount: bool,

    // Deadline of a single request to the web API, 0 disables it.
    #[serde(skip)]
    pub request_timeout: Duration,
    #[serde(alias = "request_timeout")]
    pub request_timeout_str: String,

    // How long the kernel may cache attributes and entries.
    #[serde(skip)]
    pub attr_ttl: Duration,
    #[serde(alias = "attr_ttl")]
    pub attr_ttl_str: String,

    pub log: LogConf,
}

impl FuseConf {
    pub const DEFAULT_BASEDIR: &'static str = "~/.tahoe";
    pub const LOG_DIR: &'static str = "logs";

    /// Read `path` (TOML) when given and overlay the non-null fields of `args_json`.
    pub fn from(path: Option<&str>, args_json: Option<&str>) -> FsResult<Self> {
        let mut value = match path {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .map_err(|e| FsError::conf(format!("failed to read {}: {}", path, e)))?;
                let table: toml::Value = toml::from_str(&text)?;
                serde_json::to_value(table)?
            }
            None => Value::Object(Default::default()),
        };

        if let Some(args) = args_json {
            let args: Value = serde_json::from_str(args)?;
            Self::merge(&mut value, args);
        }

        let mut conf: FuseConf =
            serde_json::from_value(value).map_err(|e| FsError::conf(e.to_string()))?;
        conf.init()?;
        Ok(conf)
    }

    fn merge(base: &mut Value, overlay: Value) {
        match (base, overlay) {
            (Value::Object(base), Value::Object(overlay)) => {
                for (k, v) in overlay {
                    if v.is_null() {
                        continue;
                    }
                    Self::merge(base.entry(k).or_insert(Value::Null), v);
                }
            }
            (base, overlay) => *base = overlay,
        }
    }

    pub fn init(&mut self) -> FsResult<()> {
        self.basedir = Self::expand_home(&self.basedir)
            .to_string_lossy()
            .to_string();
        self.request_timeout = DurationUnit::from_str(&self.request_timeout_str)?.as_duration();
        self.attr_ttl = DurationUnit::from_str(&self.attr_ttl_str)?.as_duration();

        if self.log.log_dir.is_empty() {
            self.log.log_dir = self.basedir_path().join(Self::LOG_DIR).to_string_lossy().to_string();
        }

        Ok(())
    }

    pub fn basedir_path(&self) -> PathBuf {
        PathBuf::from(&self.basedir)
    }

    pub fn request_deadline(&self) -> Option<Duration> {
        if self.request_timeout.is_zero() {
            None
        } else {
            Some(self.request_timeout)
        }
    }

    fn expand_home(path: &str) -> PathBuf {
        match path.strip_prefix('~') {
            Some(rest) => match dirs::home_dir() {
                Some(home) => home.join(rest.trim_start_matches('/')),
                None => PathBuf::from(path),
            },
            None => PathBuf::from(path),
        }
    }
}

impl Default for FuseConf {
    fn default() -> Self {
        Self {
            basedir: Self::DEFAULT_BASEDIR.to_string(),
            mnt_path: String::new(),
            fs_name: "tahoe".to_string(),
            allow_other: false,
            auto_unmount: false,

            request_timeout: Default::default(),
            request_timeout_str: "60s".to_string(),

            attr_ttl: Default::default(),
            attr_ttl_str: "1s".to_string(),

            log: LogConf::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::FuseConf;
    use std::fs;
    use std::time::Duration;

    #[test]
    fn default_init() {
        let mut conf = FuseConf {
            basedir: "/var/lib/tahoe".to_string(),
            ..Default::default()
        };
        conf.init().unwrap();

        assert_eq!(conf.request_timeout, Duration::from_secs(60));
        assert_eq!(conf.attr_ttl, Duration::from_secs(1));
        assert_eq!(conf.log.log_dir, "/var/lib/tahoe/logs");
        assert_eq!(conf.request_deadline(), Some(Duration::from_secs(60)));
        assert!(!conf.allow_other);
        assert!(!conf.auto_unmount);
    }

    #[test]
    fn expand_home() {
        let mut conf = FuseConf::default();
        conf.init().unwrap();
        assert!(!conf.basedir.starts_with('~') || dirs::home_dir().is_none());
    }

    #[test]
    fn file_and_args() {
        let path = std::env::temp_dir().join(format!("tahoe-fuse-{}.toml", uuid::Uuid::new_v4()));
        fs::write(
            &path,
            r#"
basedir = "/srv/tahoe"
mnt_path = "/mnt/from-file"
request_timeout = "0s"

[log]
level = "debug"
"#,
        )
        .unwrap();

        let args = r#"{"mnt_path": "/mnt/from-args", "allow_other": null}"#;
        let conf = FuseConf::from(Some(path.to_str().unwrap()), Some(args)).unwrap();

        assert_eq!(conf.basedir, "/srv/tahoe");
        assert_eq!(conf.mnt_path, "/mnt/from-args");
        assert!(!conf.allow_other);
        assert_eq!(conf.request_deadline(), None);
        assert_eq!(conf.log.level, "debug");
        assert_eq!(conf.log.file_name, "tahoe_fuse.log");
        let _ = fs::remove_file(&path);
    }
}
