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

use nix::errno::Errno;
use std::fmt;
use std::fmt::Debug;
use std::io;
use tahoe_common::FsError;

/// An [`FsError`] paired with the errno the kernel receives for it.
#[derive(Debug)]
pub struct FuseError {
    pub(crate) errno: i32,
    pub(crate) error: FsError,
}

impl FuseError {
    pub fn new(errno: i32, error: FsError) -> Self {
        Self { errno, error }
    }

    pub fn errno(&self) -> i32 {
        self.errno
    }

    pub fn error(&self) -> &FsError {
        &self.error
    }

    /// Symbolic errno name, e.g. `ENOENT`.
    pub fn errno_name(&self) -> String {
        format!("{:?}", Errno::from_raw(self.errno))
    }
}

impl std::error::Error for FuseError {}

impl fmt::Display for FuseError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "errno {}: {}", self.errno, self.error)
    }
}

impl From<io::Error> for FuseError {
    fn from(value: io::Error) -> Self {
        let errno = value.raw_os_error().unwrap_or(libc::EIO);
        Self::new(errno, FsError::Io(value))
    }
}

impl From<FsError> for FuseError {
    fn from(value: FsError) -> Self {
        match &value {
            FsError::NotFound(_) => Self::new(libc::ENOENT, value),
            FsError::NotADirectory(_) | FsError::NotADirectoryMetadata(_) => {
                Self::new(libc::ENOTDIR, value)
            }
            FsError::IsADirectory(_) => Self::new(libc::EISDIR, value),
            FsError::NotOpen(_) => Self::new(libc::EBADF, value),
            FsError::Unsupported(_) => Self::new(libc::ENOSYS, value),
            FsError::InvalidCapability(_) => Self::new(libc::EINVAL, value),
            FsError::RemoteUnavailable(_) => Self::new(libc::EIO, value),
            FsError::MalformedResponse(_) => Self::new(libc::EPROTO, value),
            FsError::Conf(_) | FsError::Io(_) => Self::new(libc::EIO, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::FuseError;
    use tahoe_common::FsError;

    #[test]
    fn errno_mapping() {
        let cases = [
            (FsError::not_found("/a"), libc::ENOENT, "ENOENT"),
            (FsError::NotADirectory("/a/b".into()), libc::ENOTDIR, "ENOTDIR"),
            (FsError::NotADirectoryMetadata("/a".into()), libc::ENOTDIR, "ENOTDIR"),
            (FsError::NotOpen("/a".into()), libc::EBADF, "EBADF"),
            (FsError::unsupported("mkdir"), libc::ENOSYS, "ENOSYS"),
            (FsError::remote("down"), libc::EIO, "EIO"),
            (FsError::malformed("bad json"), libc::EPROTO, "EPROTO"),
        ];

        for (error, errno, name) in cases {
            let e = FuseError::from(error);
            assert_eq!(e.errno(), errno);
            assert_eq!(e.errno_name(), name);
        }
    }
}
