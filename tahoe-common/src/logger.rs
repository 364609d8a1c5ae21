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
use crate::{FsError, FsResult};
use log::info;
use std::fs;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

/// Process wide logging: a `tracing` fmt subscriber writing to the configured log file
/// (appending) or stdout, with `log` records forwarded into it.
pub struct Logger;

impl Logger {
    pub fn init(conf: LogConf) -> FsResult<()> {
        // RUST_LOG, when set, wins over the configured level.
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&conf.level));

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_target(conf.display_target);

        let res = if conf.is_stdout() {
            tracing::subscriber::set_global_default(builder.with_writer(std::io::stdout).finish())
        } else {
            fs::create_dir_all(&conf.log_dir)?;
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::NEVER)
                .filename_prefix(&conf.file_name)
                .build(&conf.log_dir)
                .map_err(|e| FsError::conf(format!("log file {}: {}", conf.log_dir, e)))?;
            tracing::subscriber::set_global_default(builder.with_writer(appender).finish())
        };
        res.map_err(|e| FsError::conf(format!("logger already initialized: {}", e)))?;

        tracing_log::LogTracer::init()
            .map_err(|e| FsError::conf(format!("log bridge already initialized: {}", e)))?;

        info!(
            "Log opened at: {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        Ok(())
    }
}
