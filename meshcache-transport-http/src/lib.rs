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

//! A reference HTTP binding for the peer transport: a concrete `PeerPicker`
//! over a consistent-hash ring of HTTP addresses, plus the server that
//! answers peer-fetch requests on the wire.
//!
//! Wire contract: `GET /{base_path}/{group}/{key}`, response body is raw
//! bytes with `Content-Type: application/octet-stream`, `404` for an unknown
//! group, `500` carrying the loader's error text, `400` for a malformed
//! path.

pub mod client;
pub mod pool;
pub mod server;

pub use client::HttpPeer;
pub use pool::HttpPool;
pub use server::serve;

pub const DEFAULT_BASE_PATH: &str = "/_meshcache/";

/// Splits `{base_path}/{group}/{key}` into `(group, key)`. Shared by the
/// client (to build a request path) and the server (to parse one), so the
/// two sides of the wire agree on escaping by construction.
pub(crate) fn split_path<'a>(path: &'a str, base_path: &str) -> Option<(&'a str, &'a str)> {
    let rest = path.strip_prefix(base_path)?;
    let mut parts = rest.splitn(2, '/');
    let group = parts.next()?;
    let key = parts.next()?;
    if group.is_empty() || key.is_empty() {
        return None;
    }
    Some((group, key))
}

/// Escapes `%` and `/` in a path segment so the wire contract's `/`-split
/// between group and key stays unambiguous even when a key itself contains a
/// slash.
pub(crate) fn urlencode(segment: &str) -> String {
    segment.replace('%', "%25").replace('/', "%2F")
}

/// Inverse of [`urlencode`]. Malformed escapes are passed through verbatim
/// rather than rejected — the server still round-trips a best-effort key
/// instead of bouncing an otherwise-valid request.
pub(crate) fn urldecode(segment: &str) -> String {
    segment.replace("%2F", "/").replace("%25", "%")
}

pub(crate) fn normalize_base_path(base_path: &str) -> String {
    let mut p = base_path.to_string();
    if !p.starts_with('/') {
        p.insert(0, '/');
    }
    if !p.ends_with('/') {
        p.push('/');
    }
    p
}
