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

use std::sync::Arc;

use parking_lot::Mutex;

use crate::{KeyLen, Lru, Value};

/// Eviction listener invoked for every entry an `Add` evicts to make room.
///
/// `SyncStore` collects the entries evicted by one `add` call under the
/// lock, then drops the lock before invoking the listener, so a listener
/// that re-enters the cache cannot deadlock against its own critical
/// section.
pub type EvictionListener<K, V> = Arc<dyn Fn(&K, &V) + Send + Sync>;

/// Mutex-wrapped `Lru` that lazily constructs the inner store on first write
/// and owns the byte budget.
pub struct SyncStore<K, V>
where
    K: KeyLen,
    V: Value,
{
    inner: Mutex<Option<Lru<K, V>>>,
    capacity_bytes: usize,
    on_evicted: Option<EvictionListener<K, V>>,
}

impl<K, V> SyncStore<K, V>
where
    K: KeyLen,
    V: Value,
{
    pub fn new(capacity_bytes: usize) -> Self {
        Self {
            inner: Mutex::new(None),
            capacity_bytes,
            on_evicted: None,
        }
    }

    pub fn with_eviction_listener(mut self, listener: EvictionListener<K, V>) -> Self {
        self.on_evicted = Some(listener);
        self
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let mut guard = self.inner.lock();
        let lru = guard.as_mut()?;
        let hit = lru.get(key).cloned();
        if hit.is_some() {
            metrics::counter!("meshcache_store_hits_total").increment(1);
        } else {
            metrics::counter!("meshcache_store_misses_total").increment(1);
        }
        hit
    }

    pub fn add(&self, key: K, value: V) {
        let evicted = {
            let mut guard = self.inner.lock();
            let lru = guard.get_or_insert_with(|| Lru::new(self.capacity_bytes));
            let evicted = lru.add(key, value);
            metrics::gauge!("meshcache_store_bytes").set(lru.nbytes() as f64);
            evicted
        };

        // Notify past the critical section: see `EvictionListener` docs.
        if let Some(listener) = &self.on_evicted {
            for (k, v) in &evicted {
                listener(k, v);
            }
        }
    }

    pub fn remove(&self, key: &K) {
        let evicted = {
            let mut guard = self.inner.lock();
            guard.as_mut().and_then(|lru| lru.remove(key))
        };
        if let (Some(listener), Some((k, v))) = (&self.on_evicted, &evicted) {
            listener(k, v);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().as_ref().map_or(0, Lru::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn usage(&self) -> usize {
        self.inner.lock().as_ref().map_or(0, Lru::nbytes)
    }

    pub fn capacity(&self) -> usize {
        self.capacity_bytes
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use meshcache_common::ByteView;

    use super::*;

    #[test]
    fn lazy_construction_on_first_write() {
        let store: SyncStore<String, ByteView> = SyncStore::new(0);
        assert_eq!(store.len(), 0);
        store.add("k".to_string(), ByteView::from("v"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn eviction_listener_runs_after_unlock() {
        let count = Arc::new(AtomicUsize::new(0));
        let count2 = count.clone();
        let store: SyncStore<String, ByteView> = SyncStore::new(2)
            .with_eviction_listener(Arc::new(move |_k: &String, _v: &ByteView| {
                count2.fetch_add(1, Ordering::SeqCst);
            }));

        store.add("a".to_string(), ByteView::from("1"));
        store.add("b".to_string(), ByteView::from("2"));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn concurrent_get_add_is_consistent() {
        use std::thread;

        let store = Arc::new(SyncStore::<String, ByteView>::new(0));
        let mut handles = vec![];
        for i in 0..8 {
            let store = store.clone();
            handles.push(thread::spawn(move || {
                let key = format!("key-{i}");
                store.add(key.clone(), ByteView::from(format!("v{i}").as_str()));
                assert!(store.get(&key).is_some());
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.len(), 8);
    }
}
