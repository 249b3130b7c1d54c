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

//! Prints the routing table produced by a three-peer ring, then shows that
//! removing one peer only reroutes the keys it used to own.

use std::collections::HashMap;

use meshcache_ring::{HashRing, DEFAULT_REPLICAS};

fn main() {
    let ring = HashRing::new(DEFAULT_REPLICAS, "");
    ring.add(["A", "B", "C"]);

    let keys = ["Tom", "Jack", "Sam"];
    println!("routing table with peers {{A, B, C}}:");
    let before: HashMap<&str, String> = keys
        .iter()
        .map(|&k| {
            let owner = ring.get(k.as_bytes()).unwrap();
            println!("  {k} -> {owner}");
            (k, owner)
        })
        .collect();

    ring.remove("B");
    println!("\nafter removing B:");
    for &k in &keys {
        let owner = ring.get(k.as_bytes()).unwrap();
        let moved = if &owner != before.get(k).unwrap() { " (moved)" } else { "" };
        println!("  {k} -> {owner}{moved}");
    }
}
