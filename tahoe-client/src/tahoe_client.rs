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

use crate::NodeMetadata;
use std::io::Read;
use tahoe_common::capability::Capability;
use tahoe_common::FsResult;

pub type ContentReader = Box<dyn Read + Send>;

/// Read-only access to the storage node's web API.
///
/// Every call goes to the remote side; nothing is cached at this layer.
pub trait TahoeClient: Send + Sync {
    /// Base address of the web API, always ending in `/`.
    fn base(&self) -> &str;

    /// `GET <base>uri/<cap>?t=json`
    fn fetch_metadata(&self, cap: &Capability) -> FsResult<NodeMetadata>;

    /// `GET <base>uri/<cap>`
    fn fetch_content(&self, cap: &Capability) -> FsResult<ContentReader>;

    /// `:` separates capability fields and stays as is; other reserved characters
    /// are percent-encoded.
    fn node_url(&self, cap: &Capability) -> String {
        let path = urlencoding::encode(cap.as_str()).replace("%3A", ":");
        format!("{}uri/{}", self.base(), path)
    }
}
