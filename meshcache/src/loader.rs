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

use std::future::Future;
use std::pin::Pin;

use meshcache_common::Result;

/// Materializes the value for a key on a cache miss.
///
/// Async because the underlying fetch is typically I/O (a database query
/// or a remote-service call). Must be safe to invoke concurrently for
/// distinct keys; identical-key concurrency is collapsed upstream by the
/// single-flight coordinator, not by the loader itself.
pub trait Loader: Send + Sync + 'static {
    fn load<'a>(&'a self, key: &'a str) -> Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + 'a>>;
}

/// Adapts a bare async function into a [`Loader`]: a newtype around the
/// closure, so a caller without a dedicated type can still implement the
/// trait.
pub struct LoaderFn<F>(F);

impl<F, Fut> LoaderFn<F>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<u8>>> + Send + 'static,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F, Fut> Loader for LoaderFn<F>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<u8>>> + Send + 'static,
{
    fn load<'a>(&'a self, key: &'a str) -> Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + 'a>> {
        Box::pin((self.0)(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn loader_fn_adapts_a_closure() {
        let loader = LoaderFn::new(|key: String| async move { Ok(format!("v-{key}").into_bytes()) });
        let bytes = loader.load("Tom").await.unwrap();
        assert_eq!(bytes, b"v-Tom");
    }
}
