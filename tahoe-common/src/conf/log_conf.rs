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

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConf {
    // Log level: trace, debug, info, warn, error.
    pub level: String,

    // Directory the log file is written to, or "stdout" to log to the console.
    // Empty means "<basedir>/logs".
    pub log_dir: String,

    pub file_name: String,

    // Print the module path of each event.
    pub display_target: bool,
}

impl LogConf {
    pub const STDOUT: &'static str = "stdout";

    pub fn is_stdout(&self) -> bool {
        self.log_dir.eq_ignore_ascii_case(Self::STDOUT)
    }
}

impl Default for LogConf {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: String::new(),
            file_name: "tahoe_fuse.log".to_string(),
            display_target: false,
        }
    }
}
