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

use std::ops::Deref;

use bytes::Bytes;

use crate::code::Value;

/// An immutable, cheaply-cloneable view over a cache value's bytes.
///
/// `ByteView` is the cache's own copy: constructing one from a borrowed
/// buffer (`ByteView::copy_from`) performs the one defensive copy the cache
/// needs so that later mutation of the caller's buffer can never be observed
/// through the cache. Once built, a `ByteView` is read-only; cloning it only
/// bumps a refcount (`Bytes` is backed by an `Arc`-like shared buffer), it
/// never duplicates the underlying bytes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ByteView(Bytes);

impl ByteView {
    /// Defensive copy from a borrowed buffer. Use this for bytes that may be
    /// owned or later mutated by the caller (e.g. a loader's return value).
    pub fn copy_from(bytes: &[u8]) -> Self {
        Self(Bytes::copy_from_slice(bytes))
    }

    /// Take ownership of an already-exclusive buffer without copying.
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self(Bytes::from(bytes))
    }

    /// Wrap an already-shared, already-immutable `Bytes` without copying.
    pub fn from_bytes(bytes: Bytes) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl Value for ByteView {
    fn len(&self) -> usize {
        self.0.len()
    }
}

impl Deref for ByteView {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<&str> for ByteView {
    fn from(s: &str) -> Self {
        Self::copy_from(s.as_bytes())
    }
}

impl From<String> for ByteView {
    fn from(s: String) -> Self {
        Self::from_vec(s.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_from_is_isolated_from_source_mutation() {
        let mut source = vec![1u8, 2, 3];
        let view = ByteView::copy_from(&source);
        source[0] = 9;
        assert_eq!(view.as_bytes(), &[1, 2, 3]);
    }

    #[test]
    fn len_matches_byte_count() {
        let view = ByteView::from("630");
        assert_eq!(Value::len(&view), 3);
    }

    #[test]
    fn clone_is_cheap_and_equal() {
        let view = ByteView::copy_from(b"hello");
        let clone = view.clone();
        assert_eq!(view, clone);
    }
}
