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

/// Errors shared across the meshcache workspace.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// `Group::get` was called with an empty key.
    #[error("key is required")]
    InvalidKey,

    /// The registry has no group with this name.
    #[error("no such group: {0}")]
    NotFound(String),

    /// The user-supplied loader failed.
    #[error("loader failed: {0}")]
    LoaderFailed(Arc<dyn std::error::Error + Send + Sync>),

    /// The loader panicked; every co-waiting caller observes this sentinel.
    #[error("loader panicked")]
    LoaderPanicked,

    /// A peer-fetch attempt failed. Non-fatal: the group falls back to the
    /// local loader when this is returned from a peer.
    #[error("peer fetch failed: {0}")]
    PeerFetchFailed(Arc<dyn std::error::Error + Send + Sync>),

    /// `RegisterPeerPicker` was called twice on the same group.
    #[error("peer picker already registered")]
    AlreadyRegistered,

    /// The HTTP peer transport received a malformed request path.
    #[error("malformed request path: {0}")]
    MalformedPath(String),
}

impl Error {
    pub fn loader_failed<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::LoaderFailed(Arc::new(err))
    }

    pub fn peer_fetch_failed<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::PeerFetchFailed(Arc::new(err))
    }
}

impl From<tokio::sync::oneshot::error::RecvError> for Error {
    fn from(_: tokio::sync::oneshot::error::RecvError) -> Self {
        Self::LoaderPanicked
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
