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

use std::fmt::Debug;
use std::hash::Hash;

/// Bound required of a type to act as a cache key.
///
/// Blanket-implemented for every type that already satisfies the bound.
pub trait Key: Clone + Eq + Hash + Debug + Send + Sync + 'static {}
impl<T> Key for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

/// A `Key` with a well-defined byte length, used for LRU budget accounting:
/// entry cost is `len(key) + value.length`. Not blanket-implemented because
/// "byte length" is meaningless for an arbitrary `Key`; the system only ever
/// keys its caches by `String`.
pub trait KeyLen: Key {
    fn key_len(&self) -> usize;
}

impl KeyLen for String {
    fn key_len(&self) -> usize {
        self.len()
    }
}

/// Bound required of a type to act as a cache value with a byte cost.
pub trait Value: Clone + Debug + Send + Sync + 'static {
    /// Byte cost of this value, used for LRU budget accounting.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
