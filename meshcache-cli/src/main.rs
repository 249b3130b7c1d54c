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

//! A small binary wiring a demo loader, the registry, the HTTP peer pool and
//! the HTTP peer server into one runnable node: start a cache node that also
//! serves peer requests.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use meshcache::{GroupConfig, Loader, LoaderFn};
use meshcache_transport_http::{serve, HttpPool, DEFAULT_BASE_PATH};

/// Run a meshcache node that serves one demo group over HTTP, routing
/// cross-node loads through a consistent-hash ring.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// This node's own peer identifier, used for self-loopback detection.
    #[arg(long)]
    name: String,

    /// Address to bind the HTTP peer server to.
    #[arg(long, default_value = "127.0.0.1:8001")]
    addr: SocketAddr,

    /// Base path for the peer transport's wire contract.
    #[arg(long, default_value = DEFAULT_BASE_PATH)]
    base_path: String,

    /// Byte budget for the demo group's local shard of the cache.
    #[arg(long, default_value = "1MiB", value_parser = parse_bytesize)]
    capacity: u64,

    /// Number of local cache shards (see `GroupConfig::shards`).
    #[arg(long, default_value_t = 4)]
    shards: usize,

    /// Other peers in the cluster, as repeated `name=http://host:port`.
    #[arg(long = "peer", value_parser = parse_peer)]
    peers: Vec<(String, String)>,
}

fn parse_bytesize(s: &str) -> Result<u64, String> {
    s.parse::<bytesize::ByteSize>().map(|b| b.as_u64()).map_err(|e| e.to_string())
}

fn parse_peer(s: &str) -> Result<(String, String), String> {
    let (name, addr) = s.split_once('=').ok_or_else(|| format!("expected name=addr, got {s:?}"))?;
    Ok((name.to_string(), addr.to_string()))
}

/// The demo loader: a tiny in-memory "database" standing in for an
/// expensive backing fetch (a database query, a remote-service call). A
/// real deployment supplies its own [`Loader`].
fn demo_loader() -> Arc<dyn Loader> {
    let rows: HashMap<&'static str, &'static str> =
        HashMap::from([("Tom", "630"), ("Jack", "589"), ("Sam", "567")]);

    Arc::new(LoaderFn::new(move |key: String| {
        let row = rows.get(key.as_str()).copied();
        async move {
            match row {
                Some(value) => Ok(value.as_bytes().to_vec()),
                None => Err(meshcache_common::Error::loader_failed(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("{key} not found"),
                ))),
            }
        }
    }))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    // A per-process `Registry` value: a standalone node has no need for the
    // process-wide `meshcache::global()` singleton and stays testable
    // without it.
    let registry = Arc::new(meshcache::Registry::new());
    let group = registry.register(
        "scores",
        GroupConfig::new(args.capacity as usize).with_shards(args.shards),
        demo_loader(),
    );

    let pool = Arc::new(HttpPool::new(args.name.clone(), args.base_path.clone()));
    let mut peers: HashMap<String, String> = args.peers.into_iter().collect();
    peers.insert(args.name.clone(), format!("http://{}", args.addr));
    pool.set(peers);
    group
        .register_peer_picker(pool)
        .context("peer picker already registered")?;

    serve(registry, &args.base_path, args.addr).await.context("HTTP peer server failed")
}
