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

//! A single-process walkthrough of the `scores` example group: register,
//! miss, hit, eviction under a tight budget. No peers, no HTTP — just the
//! registry, the loader, and the local LRU.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use meshcache::{GroupConfig, Loader, LoaderFn, Registry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let rows: HashMap<&'static str, &'static str> =
        HashMap::from([("Tom", "630"), ("Jack", "589"), ("Sam", "567")]);
    let loads = Arc::new(AtomicUsize::new(0));
    let loads_for_loader = loads.clone();
    let loader: Arc<dyn Loader> = Arc::new(LoaderFn::new(move |key: String| {
        let rows = rows.clone();
        let loads = loads_for_loader.clone();
        async move {
            loads.fetch_add(1, Ordering::SeqCst);
            rows.get(key.as_str()).map(|v| v.as_bytes().to_vec()).ok_or_else(|| {
                meshcache_common::Error::loader_failed(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("{key} not found"),
                ))
            })
        }
    }));

    let registry = Registry::new();
    let group = registry.register("scores", GroupConfig::new(2048), loader);

    let tom = group.get("Tom").await?;
    println!("Tom -> {:?} (loader invocations so far: {})", String::from_utf8_lossy(&tom), loads.load(Ordering::SeqCst));

    let tom_again = group.get("Tom").await?;
    println!("Tom -> {:?} (loader invocations so far: {}, unchanged)", String::from_utf8_lossy(&tom_again), loads.load(Ordering::SeqCst));

    match group.get("Nobody").await {
        Ok(_) => unreachable!("Nobody is not in the demo dataset"),
        Err(err) => println!("Nobody -> error: {err}"),
    }

    // A tight-budget group to show eviction in action.
    let tight_loads = Arc::new(AtomicUsize::new(0));
    let tight_loads_for_loader = tight_loads.clone();
    let tight_loader: Arc<dyn Loader> = Arc::new(LoaderFn::new(move |key: String| {
        let tight_loads = tight_loads_for_loader.clone();
        async move {
            tight_loads.fetch_add(1, Ordering::SeqCst);
            match key.as_str() {
                "a" => Ok(b"xxxxxxxx".to_vec()),
                "b" => Ok(b"yyyyyyyy".to_vec()),
                other => Err(meshcache_common::Error::loader_failed(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("{other} not found"),
                ))),
            }
        }
    }));
    // budget = len("a") + len("xxxxxxxx") = 9: just enough for one entry.
    let tight = registry.register("tight", GroupConfig::new(9), tight_loader);
    tight.get("a").await?;
    tight.get("b").await?;
    let before = tight_loads.load(Ordering::SeqCst);
    tight.get("a").await?;
    let after = tight_loads.load(Ordering::SeqCst);
    println!(
        "after filling the tight budget: re-fetching \"a\" re-invoked the loader ({before} -> {after}), confirming it was evicted to make room for \"b\""
    );

    Ok(())
}
