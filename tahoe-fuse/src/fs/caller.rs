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

use std::fmt;
use std::fs;

/// The process on whose behalf a filesystem call runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub pid: u32,
}

impl Caller {
    pub fn new(pid: u32) -> Self {
        Self { pid }
    }

    pub fn current() -> Self {
        Self::new(std::process::id())
    }

    /// Arguments from `/proc/<pid>/cmdline`, empty when the file is unreadable.
    pub fn cmdline(&self) -> Vec<String> {
        let raw = match fs::read(format!("/proc/{}/cmdline", self.pid)) {
            Ok(v) => v,
            Err(_) => return vec![],
        };

        Self::parse_cmdline(&raw)
    }

    /// NUL separated arguments; only the terminating NUL is dropped.
    fn parse_cmdline(raw: &[u8]) -> Vec<String> {
        let mut args: Vec<String> = raw
            .split(|b| *b == 0)
            .map(|arg| String::from_utf8_lossy(arg).into_owned())
            .collect();
        if args.last().is_some_and(|arg| arg.is_empty()) {
            args.pop();
        }
        args
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.pid, self.cmdline())
    }
}
