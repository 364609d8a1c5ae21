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

use crate::{ContentReader, NodeMetadata, TahoeClient};
use log::debug;
use reqwest::blocking::{Client, Response};
use std::time::Duration;
use tahoe_common::capability::Capability;
use tahoe_common::{FsError, FsResult};
use url::Url;

/// [`TahoeClient`] over HTTP. Blocking: each call holds the caller until the
/// response arrives or the optional deadline passes.
pub struct WebClient {
    base: String,
    http: Client,
}

impl WebClient {
    pub const METADATA_QUERY: &'static str = "?t=json";

    pub fn new(base_url: &str, timeout: Option<Duration>) -> FsResult<Self> {
        let url = Url::parse(base_url)
            .map_err(|e| FsError::conf(format!("invalid node url {:?}: {}", base_url, e)))?;

        let mut base = url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FsError::remote)?;

        Ok(Self { base, http })
    }

    fn get(&self, url: &str) -> FsResult<Response> {
        debug!("*** Fetching: {}", url);
        let resp = self
            .http
            .get(url)
            .send()
            .map_err(|e| FsError::remote(format!("GET {}: {}", url, e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FsError::remote(format!("GET {} returned {}", url, status)));
        }
        Ok(resp)
    }
}

impl TahoeClient for WebClient {
    fn base(&self) -> &str {
        &self.base
    }

    fn fetch_metadata(&self, cap: &Capability) -> FsResult<NodeMetadata> {
        let url = format!("{}{}", self.node_url(cap), Self::METADATA_QUERY);
        let body = self
            .get(&url)?
            .bytes()
            .map_err(|e| FsError::remote(format!("GET {}: {}", url, e)))?;
        NodeMetadata::from_slice(&body)
    }

    fn fetch_content(&self, cap: &Capability) -> FsResult<ContentReader> {
        let url = self.node_url(cap);
        let resp = self.get(&url)?;
        Ok(Box::new(resp))
    }
}
