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

//! The abstract indirection between a [`Group`](crate::Group) and a remote
//! peer: resolving a key to the peer responsible for it, and fetching a
//! value from that peer once resolved. The concrete HTTP binding lives in
//! `meshcache-transport-http`.

use async_trait::async_trait;
use meshcache_common::Result;

/// A remote peer this process can fetch a group's key from.
#[async_trait]
pub trait Peer: Send + Sync + 'static {
    async fn peer_get(&self, group: &str, key: &str) -> Result<Vec<u8>>;
}

/// Resolves a key to the peer responsible for it.
///
/// `pick` returns `None` both when there is no ring configured and when the
/// chosen peer is the local node (self-loopback): either way the caller
/// should fall back to a local load.
pub trait PeerPicker: Send + Sync + 'static {
    fn pick(&self, key: &str) -> Option<Box<dyn Peer>>;
}
