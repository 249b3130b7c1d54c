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

//! Process-wide name→group lookup. `Registry` is a plain value so it
//! stays testable in isolation; [`global`] is a thin singleton wrapper over
//! one, for callers that want a single process-wide instance.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use meshcache_common::Error;
use parking_lot::RwLock;

use crate::group::{Group, GroupConfig};
use crate::loader::Loader;

/// Many-readers/exclusive-writer name→group map.
#[derive(Default)]
pub struct Registry {
    groups: RwLock<HashMap<String, Arc<Group>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates and inserts a new group under `name`, replacing any group
    /// previously registered under it.
    pub fn register(&self, name: impl Into<String>, config: GroupConfig, loader: Arc<dyn Loader>) -> Arc<Group> {
        let name = name.into();
        let group = Group::new(name.clone(), config, loader);
        self.groups.write().insert(name, group.clone());
        group
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<Group>> {
        self.groups.read().get(name).cloned()
    }

    pub fn lookup_or_not_found(&self, name: &str) -> Result<Arc<Group>, Error> {
        self.lookup(name).ok_or_else(|| Error::NotFound(name.to_string()))
    }
}

static GLOBAL: OnceLock<Registry> = OnceLock::new();

/// The process-wide registry singleton. Ambient global state is legitimate
/// here — caches are inherently ambient — but prefer a private [`Registry`]
/// value in tests so cases don't leak state across each other.
pub fn global() -> &'static Registry {
    GLOBAL.get_or_init(Registry::new)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::loader::LoaderFn;

    fn counting_loader(calls: Arc<AtomicUsize>) -> Arc<dyn Loader> {
        Arc::new(LoaderFn::new(move |key: String| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(key.into_bytes())
            }
        }))
    }

    #[test]
    fn lookup_of_unknown_name_is_none() {
        let registry = Registry::new();
        assert!(registry.lookup("nope").is_none());
    }

    #[tokio::test]
    async fn register_then_lookup_round_trips() {
        let registry = Registry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        registry.register("scores", GroupConfig::new(1024), counting_loader(calls));

        let group = registry.lookup("scores").unwrap();
        assert_eq!(group.get("Tom").await.unwrap().as_bytes(), b"Tom");
    }

    #[test]
    fn lookup_or_not_found_surfaces_the_name() {
        let registry = Registry::new();
        match registry.lookup_or_not_found("ghost") {
            Err(Error::NotFound(name)) => assert_eq!(name, "ghost"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }
}
