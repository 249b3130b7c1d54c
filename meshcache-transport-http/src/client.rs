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

use std::sync::Arc;

use async_trait::async_trait;
use http_body_util::{BodyExt, Empty};
use hyper::body::Bytes;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use meshcache::Peer;
use meshcache_common::Error;

use crate::urlencode;

/// A handle to one remote peer, reached over HTTP.
///
/// Cheaply cloneable: the underlying `hyper_util` client keeps its own
/// connection pool behind an `Arc`, so every clone shares one pool instead
/// of opening new connections per call.
#[derive(Clone)]
pub struct HttpPeer {
    base_url: Arc<str>,
    client: Client<HttpConnector, Empty<Bytes>>,
}

impl HttpPeer {
    /// `base_url` is this peer's own address plus base path, e.g.
    /// `http://10.0.0.2:8080/_meshcache/`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Arc::from(base_url.into().into_boxed_str()),
            client: Client::builder(TokioExecutor::new()).build(HttpConnector::new()),
        }
    }
}

#[async_trait]
impl Peer for HttpPeer {
    async fn peer_get(&self, group: &str, key: &str) -> Result<Vec<u8>, Error> {
        let url = format!(
            "{}{}/{}",
            self.base_url,
            urlencode(group),
            urlencode(key)
        );
        let uri: hyper::Uri = url.parse().map_err(Error::peer_fetch_failed)?;
        let request = hyper::Request::builder()
            .method(hyper::Method::GET)
            .uri(uri)
            .body(Empty::<Bytes>::new())
            .map_err(Error::peer_fetch_failed)?;

        let response = self
            .client
            .request(request)
            .await
            .map_err(Error::peer_fetch_failed)?;

        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(Error::peer_fetch_failed)?
            .to_bytes();

        if !status.is_success() {
            let message = String::from_utf8_lossy(&body).into_owned();
            return Err(Error::peer_fetch_failed(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("peer returned {status}: {message}"),
            )));
        }

        Ok(body.to_vec())
    }
}
