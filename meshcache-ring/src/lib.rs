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

//! A consistent-hash ring with virtual nodes for peer selection: sorted
//! positions and binary search with wrap-around, `crc32fast` as the default
//! hasher.

pub mod hash;
pub mod peerset;
pub mod ring;

pub use hash::{Crc32Hasher, RingHasher};
pub use peerset::PeerSet;
pub use ring::{HashRing, DEFAULT_REPLICAS};
