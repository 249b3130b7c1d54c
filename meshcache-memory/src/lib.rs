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

//! A size-bounded LRU store and a mutex-synchronized wrapper around it that
//! lazily constructs the store and owns the byte budget.

pub mod lru;
pub mod sync_store;

pub use lru::Lru;
pub use sync_store::SyncStore;

pub use meshcache_common::code::{Key, KeyLen, Value};
