//  Copyright 2024 MeshCache Project Authors
//
//  Licensed under the Apache License, Version 2.0 (the "License");
//  you may not use this file except in compliance with the License.
//  You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.

use std::collections::HashMap;

use meshcache::{Peer, PeerPicker};
use meshcache_ring::PeerSet;

use crate::client::HttpPeer;
use crate::normalize_base_path;

/// An HTTP-backed [`PeerPicker`]: a consistent-hash ring (via
/// [`PeerSet`]) over a set of peer addresses, each reached with an
/// [`HttpPeer`]. The ring and the address-to-handle map are replaced
/// together under one lock on every [`set`](Self::set) call.
pub struct HttpPool {
    self_name: String,
    base_path: String,
    peers: PeerSet<HttpPeer>,
}

impl HttpPool {
    /// `self_name` is this node's own peer identifier (must match the name
    /// this node is later added under via [`set`](Self::set) / [`Self::add_peer`],
    /// so self-loopback detection in [`PeerPicker::pick`] works).
    pub fn new(self_name: impl Into<String>, base_path: impl Into<String>) -> Self {
        Self {
            self_name: self_name.into(),
            base_path: normalize_base_path(&base_path.into()),
            peers: PeerSet::new(""),
        }
    }

    pub fn with_default_base_path(self_name: impl Into<String>) -> Self {
        Self::new(self_name, crate::DEFAULT_BASE_PATH)
    }

    /// Replaces the whole peer membership atomically: `addrs` maps peer name
    /// to its base HTTP address (e.g. `"http://10.0.0.2:8080"`, no trailing
    /// base path — this method appends it).
    pub fn set(&self, addrs: HashMap<String, String>) {
        let handles = addrs
            .into_iter()
            .map(|(name, addr)| {
                let base_url = format!("{}{}", addr.trim_end_matches('/'), self.base_path);
                (name, HttpPeer::new(base_url))
            })
            .collect();
        self.peers.set(handles);
    }

    pub fn add_peer(&self, name: impl Into<String>, addr: impl AsRef<str>) {
        let name = name.into();
        let base_url = format!("{}{}", addr.as_ref().trim_end_matches('/'), self.base_path);
        self.peers.add_peer(name, HttpPeer::new(base_url));
    }

    pub fn remove_peer(&self, name: &str) {
        self.peers.remove_peer(name);
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }
}

impl PeerPicker for HttpPool {
    fn pick(&self, key: &str) -> Option<Box<dyn Peer>> {
        let (name, peer) = self.peers.pick(key.as_bytes(), &self.self_name)?;
        tracing::debug!(peer = %name, key, "picked peer");
        Some(Box::new(peer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pick_excludes_self_after_set() {
        let pool = HttpPool::with_default_base_path("self");
        let mut addrs = HashMap::new();
        addrs.insert("self".to_string(), "http://127.0.0.1:9000".to_string());
        pool.set(addrs);

        assert!(pool.pick("any-key").is_none());
    }

    #[test]
    fn pick_resolves_to_configured_peer() {
        let pool = HttpPool::with_default_base_path("self");
        let mut addrs = HashMap::new();
        addrs.insert("A".to_string(), "http://127.0.0.1:9001".to_string());
        addrs.insert("B".to_string(), "http://127.0.0.1:9002".to_string());
        pool.set(addrs);

        assert!(pool.pick("Tom").is_some());
    }
}
