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

//! The facade crate: a namespaced `Group` binding a loader, the local
//! synchronized LRU, the single-flight coordinator and an optional peer
//! picker, plus the process-wide `Registry`.
//!
//! The concrete peer transport is intentionally not part of this crate: see
//! `meshcache-transport-http` for the bundled reference implementation.

pub mod group;
pub mod loader;
pub mod peer;
pub mod registry;

pub use group::{Group, GroupConfig};
pub use loader::{Loader, LoaderFn};
pub use meshcache_common::{ByteView, Error, Result};
pub use peer::{Peer, PeerPicker};
pub use registry::{global, Registry};
