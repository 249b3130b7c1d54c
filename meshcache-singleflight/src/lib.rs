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

//! A coordinator that guarantees at-most-one in-flight load per key across
//! concurrent callers: the classic "singleflight" pattern, implemented here
//! with a `waiters: HashMap<K, Vec<oneshot::Sender<_>>>` table rather than a
//! condition variable.

use std::future::Future;

use hashbrown::hash_map::{Entry as MapEntry, HashMap};
use meshcache_common::Error;
use parking_lot::Mutex;
use tokio::sync::oneshot;

/// Coalesces concurrent `do_call`s for the same key into one execution of
/// the supplied future.
///
/// Two `do_call`s for the same key whose windows do not overlap invoke the
/// closure twice: this is collapsing, not caching.
pub struct SingleFlight<K, V>
where
    K: meshcache_common::Key,
    V: Clone + Send + Sync + 'static,
{
    calls: Mutex<HashMap<K, Vec<oneshot::Sender<Result<V, Error>>>>>,
}

impl<K, V> Default for SingleFlight<K, V>
where
    K: meshcache_common::Key,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> SingleFlight<K, V>
where
    K: meshcache_common::Key,
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
        }
    }

    /// `Do(key, fn) -> (value, error)`.
    ///
    /// If a call for `key` is already in flight, waits for its result instead
    /// of invoking `fn`. Otherwise runs `fn` on the current task's runtime via
    /// `tokio::spawn`, so a panic inside `fn` surfaces as a `JoinError`
    /// instead of poisoning the coordinator's mutex; every waiter (including
    /// this caller) observes `Error::LoaderPanicked` in that case.
    pub async fn do_call<F, Fut>(&self, key: K, f: F) -> Result<V, Error>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, Error>> + Send + 'static,
    {
        let mut rx = None;
        {
            let mut calls = self.calls.lock();
            match calls.entry(key.clone()) {
                MapEntry::Occupied(mut o) => {
                    let (tx, waiter_rx) = oneshot::channel();
                    o.get_mut().push(tx);
                    rx = Some(waiter_rx);
                }
                MapEntry::Vacant(v) => {
                    v.insert(Vec::new());
                }
            }
        }

        if let Some(rx) = rx {
            tracing::debug!(?key, "single-flight: joining in-flight call");
            return rx.await.unwrap_or(Err(Error::LoaderPanicked));
        }

        tracing::debug!(?key, "single-flight: leading a new call");
        let result = match tokio::spawn(f()).await {
            Ok(result) => result,
            Err(_join_err) => Err(Error::LoaderPanicked),
        };

        let waiters = {
            let mut calls = self.calls.lock();
            calls.remove(&key).unwrap_or_default()
        };
        for waiter in waiters {
            let _ = waiter.send(result.clone());
        }

        result
    }
}
