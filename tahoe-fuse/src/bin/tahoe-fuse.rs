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

use clap::Parser;
use log::{error, info};
use serde::Serialize;
use tahoe_common::conf::{FuseConf, LogConf, NodeConf};
use tahoe_common::logger::Logger;
use tahoe_common::{FsError, FsResult};
use tahoe_fuse::fs::TahoeFileSystem;
use tahoe_fuse::session::FuseSession;

// Mount the grid directory named by <basedir>/private/root_dir.cap, read-only.
// tahoe-fuse --basedir ~/.tahoe /mnt/tahoe; fusermount -u /mnt/tahoe
fn main() -> FsResult<()> {
    let args = FuseArgs::parse();
    let conf = args.get_conf()?;
    Logger::init(conf.log.clone())?;
    info!("Commandline: {:?}", std::env::args().collect::<Vec<_>>());

    if conf.mnt_path.is_empty() {
        return Err(FsError::conf("a mount point is required"));
    }

    let node_conf = match NodeConf::load(conf.basedir_path()) {
        Ok(v) => v,
        Err(e) => {
            error!("{}", e);
            eprintln!("tahoe-fuse: {}", e);
            std::process::exit(1);
        }
    };

    let fs = TahoeFileSystem::with_node_conf(conf, node_conf)?;
    FuseSession::new(fs).mount()
}

#[derive(Debug, Parser, Clone, Serialize)]
#[command(version, about = "Mount a storage grid directory as a read-only file system")]
pub struct FuseArgs {
    // Mount point, given either positionally or with --mnt-path.
    #[serde(skip)]
    #[arg(value_name = "MOUNTPOINT")]
    mountpoint: Option<String>,

    #[arg(long, help = "Mount point path")]
    mnt_path: Option<String>,

    #[arg(long, help = "Node base directory (default: ~/.tahoe)")]
    basedir: Option<String>,

    #[serde(skip)]
    #[arg(short, long, help = "Configuration file path (optional)")]
    conf: Option<String>,

    #[arg(long, help = "File system name shown in the mount table (optional)")]
    fs_name: Option<String>,

    #[arg(
        long,
        num_args = 0..=1,
        default_missing_value = "true",
        help = "Allow other users to access the mount (optional)"
    )]
    allow_other: Option<bool>,

    #[arg(
        long,
        num_args = 0..=1,
        default_missing_value = "true",
        help = "Unmount when the process exits (optional)"
    )]
    auto_unmount: Option<bool>,

    #[arg(long, help = "Web API request timeout, e.g. '60s', 0 disables (optional)")]
    request_timeout: Option<String>,

    #[serde(skip)]
    #[arg(short, long, action = clap::ArgAction::SetTrue, help = "Log to stdout at debug level")]
    debug: bool,
}

impl FuseArgs {
    pub fn get_conf(&self) -> FsResult<FuseConf> {
        let mut args = self.clone();
        if args.mountpoint.is_some() {
            args.mnt_path = args.mountpoint.take();
        }

        let args_json = serde_json::to_string(&args)?;
        let mut conf = FuseConf::from(self.conf.as_deref(), Some(&args_json))?;

        if self.debug {
            conf.log = LogConf {
                level: "debug".to_string(),
                log_dir: LogConf::STDOUT.to_string(),
                ..conf.log
            };
        }

        Ok(conf)
    }
}
