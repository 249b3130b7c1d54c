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

//! The namespace orchestrator: binds a [`Loader`], the local synchronized
//! LRU, the single-flight coordinator and an optional [`PeerPicker`], and
//! implements `Get`.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use meshcache_common::{ByteView, Error, Result};
use meshcache_memory::SyncStore;
use meshcache_singleflight::SingleFlight;
use parking_lot::RwLock;

use crate::loader::Loader;
use crate::peer::PeerPicker;

/// Construction parameters for a [`Group`].
///
/// `capacity_bytes == 0` means unbounded, matching [`meshcache_memory::Lru`].
/// `shards` splits the local cache's capacity across that many independently
/// mutex-guarded `SyncStore`s, so concurrent `Get`s for keys in different
/// shards never contend on the same lock. `shards` of `1` (the default) is a
/// single unsharded store.
#[derive(Debug, Clone, Copy)]
pub struct GroupConfig {
    pub capacity_bytes: usize,
    pub shards: usize,
}

impl GroupConfig {
    pub fn new(capacity_bytes: usize) -> Self {
        Self { capacity_bytes, shards: 1 }
    }

    pub fn with_shards(mut self, shards: usize) -> Self {
        self.shards = shards.max(1);
        self
    }
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self::new(0)
    }
}

/// A named cache namespace: a loader, a sharded local cache, a single-flight
/// coordinator, and (optionally) a peer picker for cross-node routing.
pub struct Group {
    name: String,
    loader: Arc<dyn Loader>,
    shards: Vec<SyncStore<String, ByteView>>,
    singleflight: SingleFlight<String, ByteView>,
    peer_picker: RwLock<Option<Arc<dyn PeerPicker>>>,
}

impl Group {
    pub(crate) fn new(name: impl Into<String>, config: GroupConfig, loader: Arc<dyn Loader>) -> Arc<Self> {
        let shards_count = config.shards.max(1);
        let per_shard_bytes = if config.capacity_bytes == 0 {
            0
        } else {
            (config.capacity_bytes / shards_count).max(1)
        };
        let shards = (0..shards_count).map(|_| SyncStore::new(per_shard_bytes)).collect();

        Arc::new(Self {
            name: name.into(),
            loader,
            shards,
            singleflight: SingleFlight::new(),
            peer_picker: RwLock::new(None),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total bytes currently held across all local shards.
    pub fn usage(&self) -> usize {
        self.shards.iter().map(SyncStore::usage).sum()
    }

    /// Binds a peer picker for cross-node routing. May be called at most
    /// once per group; a second call is `Error::AlreadyRegistered`.
    pub fn register_peer_picker(&self, picker: Arc<dyn PeerPicker>) -> Result<()> {
        let mut slot = self.peer_picker.write();
        if slot.is_some() {
            return Err(Error::AlreadyRegistered);
        }
        *slot = Some(picker);
        Ok(())
    }

    /// Empty key is rejected outright. A hit on the local shard returns
    /// immediately. A miss is routed through the single-flight coordinator
    /// unconditionally — the coordinator always gates the load, never
    /// bypassed — so that concurrent misses for the same key collapse into
    /// one remote fetch or one loader invocation.
    pub async fn get(self: &Arc<Self>, key: &str) -> Result<ByteView> {
        if key.is_empty() {
            return Err(Error::InvalidKey);
        }

        let shard = self.shard_for(key);
        if let Some(value) = shard.get(&key.to_string()) {
            tracing::debug!(group = %self.name, key, "cache hit");
            metrics::counter!("meshcache_group_hits_total", "group" => self.name.clone()).increment(1);
            return Ok(value);
        }

        tracing::debug!(group = %self.name, key, "cache miss");
        metrics::counter!("meshcache_group_misses_total", "group" => self.name.clone()).increment(1);

        let this = Arc::clone(self);
        let load_key = key.to_string();
        self.singleflight
            .do_call(load_key.clone(), move || async move { this.load(&load_key).await })
            .await
    }

    /// The single-flight-gated load body: try the peer picker first (unless
    /// it resolves to self or there isn't one), then fall back to the local
    /// loader. A remote hit is *not* written into the local shard: sharded
    /// ownership, no read-through replication — the owning peer is the
    /// cache for that shard.
    async fn load(&self, key: &str) -> Result<ByteView> {
        if let Some(picker) = self.peer_picker.read().clone() {
            if let Some(peer) = picker.pick(key) {
                match peer.peer_get(&self.name, key).await {
                    Ok(bytes) => {
                        tracing::debug!(group = %self.name, key, "served from peer");
                        return Ok(ByteView::copy_from(&bytes));
                    }
                    Err(err) => {
                        tracing::warn!(group = %self.name, key, error = %err, "peer fetch failed, falling back to local loader");
                        metrics::counter!("meshcache_group_peer_errors_total", "group" => self.name.clone()).increment(1);
                    }
                }
            }
        }

        self.load_locally(key).await
    }

    async fn load_locally(&self, key: &str) -> Result<ByteView> {
        let bytes = self.loader.load(key).await.map_err(|err| {
            metrics::counter!("meshcache_group_loader_errors_total", "group" => self.name.clone()).increment(1);
            err
        })?;
        // Defensive copy: the loader's `Vec<u8>` may alias memory the caller
        // still owns and could mutate; `ByteView` never observes that.
        let value = ByteView::copy_from(&bytes);
        let shard = self.shard_for(key);
        shard.add(key.to_string(), value.clone());
        Ok(value)
    }

    fn shard_for(&self, key: &str) -> &SyncStore<String, ByteView> {
        if self.shards.len() == 1 {
            return &self.shards[0];
        }
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let idx = (hasher.finish() as usize) % self.shards.len();
        &self.shards[idx]
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc as StdArc;

    use async_trait::async_trait;

    use super::*;
    use crate::loader::LoaderFn;
    use crate::peer::Peer;

    fn scores_loader(calls: StdArc<AtomicUsize>) -> Arc<dyn Loader> {
        Arc::new(LoaderFn::new(move |key: String| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                match key.as_str() {
                    "Tom" => Ok(b"630".to_vec()),
                    "Jack" => Ok(b"589".to_vec()),
                    "Sam" => Ok(b"567".to_vec()),
                    other => Err(Error::loader_failed(std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        format!("{other} not found"),
                    ))),
                }
            }
        }))
    }

    #[tokio::test]
    async fn basic_hit_then_cached_hit() {
        let calls = StdArc::new(AtomicUsize::new(0));
        let group = Group::new("scores", GroupConfig::new(2048), scores_loader(calls.clone()));

        let v1 = group.get("Tom").await.unwrap();
        assert_eq!(v1.as_bytes(), b"630");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let v2 = group.get("Tom").await.unwrap();
        assert_eq!(v2.as_bytes(), b"630");
        assert_eq!(calls.load(Ordering::SeqCst), 1, "second get must hit the local cache");
    }

    #[tokio::test]
    async fn unknown_key_surfaces_loader_error_and_does_not_cache() {
        let calls = StdArc::new(AtomicUsize::new(0));
        let group = Group::new("scores", GroupConfig::new(2048), scores_loader(calls));

        let err = group.get("Nobody").await.unwrap_err();
        assert!(matches!(err, Error::LoaderFailed(_)));
        assert_eq!(group.usage(), 0);
    }

    #[tokio::test]
    async fn empty_key_is_rejected() {
        let calls = StdArc::new(AtomicUsize::new(0));
        let group = Group::new("scores", GroupConfig::new(2048), scores_loader(calls));
        assert!(matches!(group.get("").await.unwrap_err(), Error::InvalidKey));
    }

    #[tokio::test]
    async fn eviction_under_a_tight_budget() {
        let calls = StdArc::new(AtomicUsize::new(0));
        let loader = Arc::new(LoaderFn::new(move |key: String| async move {
            match key.as_str() {
                "a" => Ok(b"xxxxxxxx".to_vec()),
                "b" => Ok(b"yyyyyyyy".to_vec()),
                _ => unreachable!(),
            }
        }));
        // budget = len("a") + len("xxxxxxxx") = 9
        let group = Group::new("tight", GroupConfig::new(9), loader);

        group.get("a").await.unwrap();
        group.get("b").await.unwrap();

        assert!(group.shards[0].get(&"a".to_string()).is_none());
        assert!(group.shards[0].get(&"b".to_string()).is_some());
    }

    #[tokio::test]
    async fn register_peer_picker_twice_fails() {
        struct NullPicker;
        impl PeerPicker for NullPicker {
            fn pick(&self, _key: &str) -> Option<Box<dyn Peer>> {
                None
            }
        }

        let calls = StdArc::new(AtomicUsize::new(0));
        let group = Group::new("scores", GroupConfig::new(2048), scores_loader(calls));
        group.register_peer_picker(Arc::new(NullPicker)).unwrap();
        assert!(matches!(
            group.register_peer_picker(Arc::new(NullPicker)).unwrap_err(),
            Error::AlreadyRegistered
        ));
    }

    #[tokio::test]
    async fn peer_fetch_failure_falls_back_to_local_loader_and_populates_cache() {
        struct FailingPeer;
        #[async_trait]
        impl Peer for FailingPeer {
            async fn peer_get(&self, _group: &str, _key: &str) -> Result<Vec<u8>> {
                Err(Error::peer_fetch_failed(std::io::Error::new(std::io::ErrorKind::Other, "down")))
            }
        }
        struct AlwaysA;
        impl PeerPicker for AlwaysA {
            fn pick(&self, _key: &str) -> Option<Box<dyn Peer>> {
                Some(Box::new(FailingPeer))
            }
        }

        let calls = StdArc::new(AtomicUsize::new(0));
        let group = Group::new("scores", GroupConfig::new(2048), scores_loader(calls.clone()));
        group.register_peer_picker(Arc::new(AlwaysA)).unwrap();

        let value = group.get("Tom").await.unwrap();
        assert_eq!(value.as_bytes(), b"630");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(group.shards[0].get(&"Tom".to_string()).is_some());
    }

    #[tokio::test]
    async fn remote_hit_is_not_populated_locally() {
        struct RemotePeer;
        #[async_trait]
        impl Peer for RemotePeer {
            async fn peer_get(&self, _group: &str, _key: &str) -> Result<Vec<u8>> {
                Ok(b"remote-value".to_vec())
            }
        }
        struct AlwaysRemote;
        impl PeerPicker for AlwaysRemote {
            fn pick(&self, _key: &str) -> Option<Box<dyn Peer>> {
                Some(Box::new(RemotePeer))
            }
        }

        let calls = StdArc::new(AtomicUsize::new(0));
        let group = Group::new("scores", GroupConfig::new(2048), scores_loader(calls.clone()));
        group.register_peer_picker(Arc::new(AlwaysRemote)).unwrap();

        let value = group.get("Tom").await.unwrap();
        assert_eq!(value.as_bytes(), b"remote-value");
        assert_eq!(calls.load(Ordering::SeqCst), 0, "local loader must not run on a remote hit");
        assert!(group.shards[0].get(&"Tom".to_string()).is_none(), "remote hits must not populate the local shard");
    }

    #[tokio::test]
    async fn concurrent_gets_collapse_into_one_loader_invocation() {
        let calls = StdArc::new(AtomicUsize::new(0));
        let calls2 = calls.clone();
        let loader = Arc::new(LoaderFn::new(move |_key: String| {
            let calls = calls2.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                Ok(b"shared".to_vec())
            }
        }));
        let group = Group::new("burst", GroupConfig::new(0), loader);

        // All 50 callers race to reach `get` at roughly the same time so the
        // single-flight coordinator actually has overlapping windows to
        // collapse, rather than each call returning serially before the next
        // one starts.
        let barrier = StdArc::new(tokio::sync::Barrier::new(50));
        let mut handles = Vec::new();
        for _ in 0..50 {
            let group = group.clone();
            let barrier = barrier.clone();
            handles.push(tokio::spawn(async move {
                barrier.wait().await;
                group.get("k").await.unwrap()
            }));
        }
        let mut results = Vec::new();
        for h in handles {
            results.push(h.await.unwrap());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|v| v.as_bytes() == b"shared"));
    }
}
