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

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use meshcache::Registry;
use tokio::net::TcpListener;

use crate::{normalize_base_path, split_path, urldecode};

/// Serves every registered group over HTTP at `addr`: `GET
/// /{base_path}/{group}/{key}` → raw bytes with `Content-Type:
/// application/octet-stream`; `404` for an unknown group; `500` with the
/// error text for a loader failure; `400` for a malformed path. Runs until
/// the process exits or the returned future is dropped.
pub async fn serve(registry: Arc<Registry>, base_path: &str, addr: SocketAddr) -> std::io::Result<()> {
    let base_path = Arc::new(normalize_base_path(base_path));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, base_path = %base_path, "meshcache HTTP peer server listening");

    loop {
        let (stream, peer_addr) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let registry = registry.clone();
        let base_path = base_path.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req| {
                let registry = registry.clone();
                let base_path = base_path.clone();
                async move { Ok::<_, Infallible>(handle(req, &registry, &base_path).await) }
            });

            if let Err(err) = ConnBuilder::new(TokioExecutor::new()).serve_connection(io, service).await {
                tracing::warn!(%peer_addr, error = %err, "connection error");
            }
        });
    }
}

async fn handle(req: Request<hyper::body::Incoming>, registry: &Registry, base_path: &str) -> Response<Full<Bytes>> {
    let path = req.uri().path().to_string();
    tracing::debug!(method = %req.method(), %path, "request");

    let Some((group_name, raw_key)) = split_path(&path, base_path) else {
        let err = meshcache_common::Error::MalformedPath(path.clone());
        return text_response(StatusCode::BAD_REQUEST, err.to_string());
    };
    let key = urldecode(raw_key);

    let group = match registry.lookup(group_name) {
        Some(group) => group,
        None => return text_response(StatusCode::NOT_FOUND, format!("no such group: {group_name}")),
    };

    match group.get(&key).await {
        Ok(value) => Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "application/octet-stream")
            .body(Full::new(Bytes::copy_from_slice(value.as_bytes())))
            .expect("well-formed response"),
        Err(err) => text_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

fn text_response(status: StatusCode, body: impl Into<String>) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .body(Full::new(Bytes::from(body.into())))
        .expect("well-formed response")
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use meshcache::{GroupConfig, Loader, LoaderFn, Peer, Registry};

    use super::*;
    use crate::client::HttpPeer;
    use crate::DEFAULT_BASE_PATH;

    async fn spawn_server() -> (Arc<Registry>, SocketAddr) {
        let registry = Arc::new(Registry::new());
        let loader: Arc<dyn Loader> = Arc::new(LoaderFn::new(|key: String| async move {
            match key.as_str() {
                "Tom" => Ok(b"630".to_vec()),
                other => Err(meshcache_common::Error::loader_failed(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("{other} not found"),
                ))),
            }
        }));
        registry.register("scores", GroupConfig::new(2048), loader);

        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let listener = TcpListener::bind(addr).await.unwrap();
        let bound = listener.local_addr().unwrap();
        drop(listener);

        let registry_clone = registry.clone();
        tokio::spawn(async move {
            let _ = serve(registry_clone, DEFAULT_BASE_PATH, bound).await;
        });
        // give the listener a moment to bind before the first request races it
        tokio::time::sleep(Duration::from_millis(50)).await;

        (registry, bound)
    }

    #[tokio::test]
    async fn serves_a_known_key_as_raw_bytes() {
        let (_registry, addr) = spawn_server().await;
        let peer = HttpPeer::new(format!("http://{addr}{DEFAULT_BASE_PATH}"));

        let bytes = peer.peer_get("scores", "Tom").await.unwrap();
        assert_eq!(bytes, b"630");
    }

    #[tokio::test]
    async fn unknown_group_is_a_peer_fetch_error() {
        let (_registry, addr) = spawn_server().await;
        let peer = HttpPeer::new(format!("http://{addr}{DEFAULT_BASE_PATH}"));

        let err = peer.peer_get("ghost-group", "Tom").await.unwrap_err();
        assert!(matches!(err, meshcache_common::Error::PeerFetchFailed(_)));
    }

    #[tokio::test]
    async fn loader_failure_surfaces_as_a_peer_fetch_error() {
        let (_registry, addr) = spawn_server().await;
        let peer = HttpPeer::new(format!("http://{addr}{DEFAULT_BASE_PATH}"));

        let err = peer.peer_get("scores", "Nobody").await.unwrap_err();
        assert!(matches!(err, meshcache_common::Error::PeerFetchFailed(_)));
    }

    #[test]
    fn split_path_rejects_a_request_with_no_key() {
        assert_eq!(split_path("/_meshcache/scores/", DEFAULT_BASE_PATH), None);
    }

    #[tokio::test]
    async fn malformed_path_gets_a_400_carrying_the_bad_path() {
        let (_registry, addr) = spawn_server().await;

        let client = hyper_util::client::legacy::Client::builder(hyper_util::rt::TokioExecutor::new())
            .build(hyper_util::client::legacy::connect::HttpConnector::new());
        let uri: hyper::Uri = format!("http://{addr}{DEFAULT_BASE_PATH}scores").parse().unwrap();
        let request = hyper::Request::builder()
            .method(hyper::Method::GET)
            .uri(uri)
            .body(http_body_util::Empty::<Bytes>::new())
            .unwrap();

        let response = client.request(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = http_body_util::BodyExt::collect(response.into_body()).await.unwrap().to_bytes();
        let text = String::from_utf8_lossy(&body);
        assert!(text.contains("malformed request path"));
        assert!(text.contains("scores"));
    }
}
