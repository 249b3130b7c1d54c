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

use parking_lot::RwLock;

use crate::hash::{Crc32Hasher, RingHasher};
use crate::ring::{HashRing, DEFAULT_REPLICAS};

/// Bundles a [`HashRing`] with the handle each node name resolves to, so the
/// routing table and the peer handles it addresses are replaced together.
///
/// `Set` replaces the whole membership atomically: a reader never observes a
/// ring position pointing at a name that isn't yet (or is no longer) in the
/// handle map. This holds because every method that touches the ring does so
/// only while holding the `peers` lock (read for [`pick`](Self::pick), write
/// for [`set`](Self::set)/[`add_peer`](Self::add_peer)/[`remove_peer`](Self::remove_peer)):
/// the ring has its own internal lock too, but `peers` is the one a caller
/// actually contends on, so holding it across a ring update serializes
/// readers out for the update's whole duration instead of letting one land
/// mid-rebuild.
pub struct PeerSet<P, H = Crc32Hasher>
where
    P: Clone + Send + Sync + 'static,
    H: RingHasher,
{
    ring: HashRing<H>,
    peers: RwLock<HashMap<String, P>>,
}

impl<P> PeerSet<P, Crc32Hasher>
where
    P: Clone + Send + Sync + 'static,
{
    pub fn new(salt: impl Into<String>) -> Self {
        Self::with_hasher(DEFAULT_REPLICAS, salt, Crc32Hasher)
    }
}

impl<P, H> PeerSet<P, H>
where
    P: Clone + Send + Sync + 'static,
    H: RingHasher,
{
    pub fn with_hasher(replicas: usize, salt: impl Into<String>, hasher: H) -> Self {
        Self {
            ring: HashRing::with_hasher(replicas, salt, hasher),
            peers: RwLock::new(HashMap::new()),
        }
    }

    /// Replaces the entire peer membership: the previous ring and handle map
    /// are both discarded and rebuilt from `peers`, with the `peers` lock
    /// held write-exclusive for the whole rebuild so a concurrent `pick`
    /// never observes the new ring with the old handle map or vice versa.
    pub fn set(&self, peers: HashMap<String, P>) {
        let names: Vec<String> = peers.keys().cloned().collect();
        let mut guard = self.peers.write();
        // A fresh ring for a full membership swap; individual joins/leaves
        // should use `add_peer`/`remove_peer` instead to avoid the O(N)
        // rebuild this incurs.
        for existing in self.ring.nodes() {
            self.ring.remove(&existing);
        }
        self.ring.add(names);
        *guard = peers;
    }

    pub fn add_peer(&self, name: impl Into<String>, peer: P) {
        let name = name.into();
        let mut guard = self.peers.write();
        self.ring.add([name.clone()]);
        guard.insert(name, peer);
    }

    pub fn remove_peer(&self, name: &str) {
        let mut guard = self.peers.write();
        self.ring.remove(name);
        guard.remove(name);
    }

    /// Resolves `key` to a peer, excluding `self_name` so a node never routes
    /// a remote fetch back to itself. Holds the `peers` read lock across both
    /// the ring lookup and the handle lookup so it can never straddle a
    /// concurrent [`set`](Self::set)/[`add_peer`](Self::add_peer)/[`remove_peer`](Self::remove_peer).
    pub fn pick(&self, key: &[u8], self_name: &str) -> Option<(String, P)> {
        let guard = self.peers.read();
        let name = self.ring.get(key)?;
        if name == self_name {
            return None;
        }
        let peer = guard.get(&name).cloned()?;
        Some((name, peer))
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }
}
