//! Seam for remote sample search.
//!
//! The network client, its credentials and token refresh live outside this
//! crate. A provider hands back a complete result set that replaces the
//! current database snapshot.

use thiserror::Error;

use crate::library::MediaRecord;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("remote search failed: {0}")]
    Search(String),
    #[error("remote search returned a local record: {0}")]
    NotRemote(String),
}

pub trait RemoteSearch {
    /// Every record must be built with [`MediaRecord::remote`].
    fn search(&self, query: &str) -> Result<Vec<MediaRecord>, RemoteError>;
}
