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

/// Pluggable hash function for the ring: maps arbitrary bytes to a `u32`
/// ring position.
pub trait RingHasher: Send + Sync + 'static {
    fn hash(&self, data: &[u8]) -> u32;
}

/// Default hasher: CRC32-IEEE.
#[derive(Debug, Clone, Copy, Default)]
pub struct Crc32Hasher;

impl RingHasher for Crc32Hasher {
    fn hash(&self, data: &[u8]) -> u32 {
        crc32fast::hash(data)
    }
}
