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

use log::{LevelFilter, Log, Metadata, Record};
use std::sync::{Mutex, Once};
use tahoe_fuse::fs::Caller;
use tahoe_fuse::FuseResult;
use tahoe_tests::Testing;

struct CaptureLogger {
    lines: Mutex<Vec<String>>,
}

impl Log for CaptureLogger {
    fn enabled(&self, _: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(record.args().to_string());
        }
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger {
    lines: Mutex::new(Vec::new()),
};
static INIT: Once = Once::new();

fn captured() -> Vec<String> {
    INIT.call_once(|| {
        log::set_logger(&LOGGER).unwrap();
        log::set_max_level(LevelFilter::Trace);
    });
    LOGGER.lines.lock().unwrap().drain(..).collect()
}

#[test]
fn calls_are_traced() -> FuseResult<()> {
    captured();
    let testing = Testing::new();
    let mut fs = testing.fs()?;
    let caller = Caller::current();
    let pid = format!("[{} ", std::process::id());

    fs.getattr(&caller, "/a.txt")?;
    let lines = captured();
    let call = lines.iter().position(|l| l.contains("getattr(\"/a.txt\",)")).unwrap();
    assert!(lines[call].starts_with(&pid), "{}", lines[call]);
    assert!(lines[call].contains("trace_test"), "{}", lines[call]);
    assert!(lines[call + 1].starts_with("-> NodeAttr {"), "{}", lines[call + 1]);

    assert!(fs.getattr(&caller, "/nope").is_err());
    let lines = captured();
    let call = lines.iter().position(|l| l.contains("getattr(\"/nope\",)")).unwrap();
    assert!(lines[call].starts_with(&pid), "{}", lines[call]);
    assert!(lines[call + 1].starts_with("-> ENOENT NotFound ("), "{}", lines[call + 1]);

    assert!(fs.mkdir(&caller, "/new", 0o755).is_err());
    let lines = captured();
    let call = lines.iter().position(|l| l.contains("mkdir(\"/new\", 493)")).unwrap();
    assert!(lines[call + 1].starts_with("-> ENOSYS Unsupported ("), "{}", lines[call + 1]);
    Ok(())
}
