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

pub mod fs;
pub mod handle;
pub mod node;
pub mod resolver;
pub mod session;

mod fuse_error;
pub use self::fuse_error::FuseError;

pub type FuseResult<T> = Result<T, FuseError>;

pub const FUSE_ROOT_ID: u64 = 1;

#[macro_export]
macro_rules! err_fuse {
    ($errno:expr) => {{
        let error = std::io::Error::from_raw_os_error($errno);
        Err($crate::FuseError::new($errno, error.into()))
    }};

    ($errno:expr, $($arg:tt)*) => {{
        let error = std::io::Error::new(std::io::ErrorKind::Other, format!($($arg)*));
        Err($crate::FuseError::new($errno, error.into()))
    }};
}
