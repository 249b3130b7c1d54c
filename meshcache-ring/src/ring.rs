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

use parking_lot::RwLock;

use crate::hash::{Crc32Hasher, RingHasher};

/// Default virtual-node replica count.
pub const DEFAULT_REPLICAS: usize = 50;

struct RingState {
    /// Sorted by position. Position and owning node travel together so that
    /// `remove` can never conflate a hash collision between two distinct
    /// nodes.
    positions: Vec<(u32, String)>,
}

/// A consistent-hash ring with `R` virtual nodes (replicas) per real peer.
///
/// Reads (`get`) may proceed in parallel; writes (`add`/`remove`) are
/// exclusive and always observe/produce a mutually consistent position list.
pub struct HashRing<H = Crc32Hasher>
where
    H: RingHasher,
{
    replicas: usize,
    salt: String,
    hasher: H,
    state: RwLock<RingState>,
}

impl HashRing<Crc32Hasher> {
    pub fn new(replicas: usize, salt: impl Into<String>) -> Self {
        Self::with_hasher(replicas, salt, Crc32Hasher)
    }
}

impl<H> HashRing<H>
where
    H: RingHasher,
{
    pub fn with_hasher(replicas: usize, salt: impl Into<String>, hasher: H) -> Self {
        Self {
            replicas,
            salt: salt.into(),
            hasher,
            state: RwLock::new(RingState { positions: Vec::new() }),
        }
    }

    /// Adds one or more real nodes, each contributing `R` virtual positions.
    /// All positions for all nodes in this call are computed first and the
    /// list is re-sorted once at the end.
    pub fn add<I, S>(&self, nodes: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut new_positions = Vec::new();
        for node in nodes {
            let node = node.as_ref();
            for i in 0..self.replicas {
                new_positions.push((self.position_for(i, node), node.to_string()));
            }
        }

        let mut state = self.state.write();
        state.positions.extend(new_positions);
        state.positions.sort_unstable_by_key(|&(pos, _)| pos);
    }

    /// Removes all `R` positions belonging to `node`, atomically from the
    /// caller's perspective.
    pub fn remove(&self, node: &str) {
        let mut state = self.state.write();
        for i in 0..self.replicas {
            let pos = self.position_for(i, node);
            remove_one(&mut state.positions, pos, node);
        }
    }

    /// `Get(key)`: smallest position `>= H(key)`, wrapping to the first
    /// position if `H(key)` is past the last one. Empty ring returns `None`.
    pub fn get(&self, key: &[u8]) -> Option<String> {
        let state = self.state.read();
        if state.positions.is_empty() {
            return None;
        }
        let hash = self.hasher.hash(key);
        let idx = state.positions.partition_point(|&(pos, _)| pos < hash);
        let idx = if idx == state.positions.len() { 0 } else { idx };
        Some(state.positions[idx].1.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().positions.is_empty()
    }

    /// Distinct real node names currently on the ring.
    pub fn nodes(&self) -> Vec<String> {
        let state = self.state.read();
        let mut nodes: Vec<String> = state
            .positions
            .iter()
            .map(|(_, node)| node.clone())
            .collect();
        nodes.sort_unstable();
        nodes.dedup();
        nodes
    }

    fn position_for(&self, replica: usize, node: &str) -> u32 {
        let composed = format!("{replica}{}{node}", self.salt);
        self.hasher.hash(composed.as_bytes())
    }
}

fn remove_one(positions: &mut Vec<(u32, String)>, pos: u32, node: &str) {
    let Ok(found) = positions.binary_search_by_key(&pos, |&(p, _)| p) else {
        return;
    };
    let mut idx = found;
    while idx > 0 && positions[idx - 1].0 == pos {
        idx -= 1;
    }
    while idx < positions.len() && positions[idx].0 == pos {
        if positions[idx].1 == node {
            positions.remove(idx);
            return;
        }
        idx += 1;
    }
}
