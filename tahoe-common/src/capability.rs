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

use crate::{FsError, FsResult};
use std::fmt;

/// Type tag prefix shared by every directory capability (`URI:DIR2:`, `URI:DIR2-RO:`,
/// `URI:DIR2-CHK:`, ...).
const DIR_TAG_PREFIX: &str = "DIR2";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapKind {
    Directory,
    File,
}

impl CapKind {
    pub fn is_dir(&self) -> bool {
        matches!(self, CapKind::Directory)
    }
}

/// An opaque, canonical capability string.
///
/// Two capabilities are equal iff their canonical strings are equal. A capability
/// always starts with [`Capability::SCHEME`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Capability(String);

impl Capability {
    pub const SCHEME: &'static str = "URI:";

    /// Percent-decode `raw` until nothing decodes any more, then keep everything from
    /// the first scheme marker on, without surrounding whitespace.
    ///
    /// Idempotent: canonicalizing an already canonical capability returns it unchanged.
    pub fn canonicalize(raw: impl AsRef<str>) -> FsResult<Self> {
        let raw = raw.as_ref();
        let mut decoded = raw.to_string();
        loop {
            let next = urlencoding::decode(&decoded)
                .map_err(|e| FsError::invalid_capability(format!("{}: {}", raw.trim(), e)))?;
            if next == decoded {
                break;
            }
            decoded = next.into_owned();
        }

        match decoded.find(Self::SCHEME) {
            Some(i) => Ok(Self(decoded[i..].trim().to_string())),
            None => Err(FsError::invalid_capability(format!(
                "a capability must contain \"{}...\", but this does not: {}",
                Self::SCHEME,
                raw.trim()
            ))),
        }
    }

    /// Wrap a capability taken from remote metadata, which is already canonical.
    pub fn from_canonical(cap: impl Into<String>) -> Self {
        Self(cap.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The type tag, i.e. the text between the scheme marker and the next `:`.
    pub fn type_tag(&self) -> &str {
        let rest = self.0.strip_prefix(Self::SCHEME).unwrap_or(&self.0);
        rest.split(':').next().unwrap_or_default()
    }

    pub fn kind(&self) -> CapKind {
        if self.type_tag().starts_with(DIR_TAG_PREFIX) {
            CapKind::Directory
        } else {
            CapKind::File
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Capability {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalize_plain() {
        let cap = Capability::canonicalize("URI:DIR2:abc:def").unwrap();
        assert_eq!(cap.as_str(), "URI:DIR2:abc:def");
    }

    #[test]
    fn canonicalize_strips_encoding_and_prefix() {
        let cap = Capability::canonicalize("http%3A//localhost/uri/URI%3ACHK%3Axyz%3A3%3A10%3A5")
            .unwrap();
        assert_eq!(cap.as_str(), "URI:CHK:xyz:3:10:5");

        let cap = Capability::canonicalize("  junk URI:LIT:abcd\n").unwrap();
        assert_eq!(cap.as_str(), "URI:LIT:abcd");
    }

    #[test]
    fn canonicalize_idempotent() {
        for raw in [
            "URI:DIR2:aa:bb",
            "URI%3ADIR2-RO%3Aaa%3Abb",
            "prefix/URI:CHK:k:u:3:10:99",
            "URI:LIT:",
            "URI:CHK:abc%0A",
            "URI:CHK:abc%20",
            "URI:CHK:a%2541",
        ] {
            let once = Capability::canonicalize(raw).unwrap();
            let twice = Capability::canonicalize(once.as_str()).unwrap();
            assert_eq!(once, twice, "{}", raw);
        }
    }

    #[test]
    fn canonicalize_encoded_whitespace_and_nesting() {
        let cap = Capability::canonicalize("URI:CHK:abc%0A").unwrap();
        assert_eq!(cap.as_str(), "URI:CHK:abc");

        let cap = Capability::canonicalize("URI:CHK:abc%20").unwrap();
        assert_eq!(cap.as_str(), "URI:CHK:abc");

        let cap = Capability::canonicalize("URI:CHK:a%2541").unwrap();
        assert_eq!(cap.as_str(), "URI:CHK:aA");
    }

    #[test]
    fn canonicalize_missing_marker() {
        let err = Capability::canonicalize("DIR2:abc").unwrap_err();
        assert!(matches!(err, FsError::InvalidCapability(_)));

        let err = Capability::canonicalize("").unwrap_err();
        assert!(matches!(err, FsError::InvalidCapability(_)));
    }

    #[test]
    fn kind_from_type_tag() {
        let dir = Capability::from_canonical("URI:DIR2:aa:bb");
        assert_eq!(dir.type_tag(), "DIR2");
        assert_eq!(dir.kind(), CapKind::Directory);

        let ro_dir = Capability::from_canonical("URI:DIR2-RO:aa:bb");
        assert!(ro_dir.kind().is_dir());

        let file = Capability::from_canonical("URI:CHK:aa:bb:3:10:5");
        assert_eq!(file.type_tag(), "CHK");
        assert_eq!(file.kind(), CapKind::File);

        let lit = Capability::from_canonical("URI:LIT:nbswy3dp");
        assert_eq!(lit.kind(), CapKind::File);
    }
}
