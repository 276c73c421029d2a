//! Capability resolver: which directories may file tools operate against.
//!
//! Resolution happens at most once per session, in strict priority order:
//! a cached value, then live negotiation with a roots-capable client, then
//! the static `--root-directory` fallback. A capable client returning zero
//! roots is a failure, not an empty permission set.

use crate::error::{Error, Result};
use mcp::{Peer, Root};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// The client-side capability surface the resolver negotiates against.
///
/// [`Peer`] implements this for live sessions; tests substitute scripted
/// sources.
pub trait RootsSource: Send + Sync {
    fn supports_roots(&self) -> impl Future<Output = bool> + Send;
    fn list_roots(&self) -> impl Future<Output = mcp::Result<Vec<Root>>> + Send;
}

impl RootsSource for Peer {
    async fn supports_roots(&self) -> bool {
        Peer::supports_roots(self).await
    }

    async fn list_roots(&self) -> mcp::Result<Vec<Root>> {
        Peer::list_roots(self).await
    }
}

/// Permitted root directories for one session.
///
/// The first successful resolution is cached for the session's lifetime and
/// every later call returns the same set without re-negotiating. The cell
/// serializes concurrent resolution attempts, so two racing tool calls can
/// never install divergent sets.
pub struct RootDirs {
    fallback: Option<PathBuf>,
    resolved: OnceCell<Arc<Vec<PathBuf>>>,
}

impl RootDirs {
    pub fn new(fallback: Option<PathBuf>) -> Self {
        Self {
            fallback,
            resolved: OnceCell::new(),
        }
    }

    /// Resolve the permitted directories for this session.
    ///
    /// A resolution failure leaves the cell unset, so a later invocation
    /// negotiates again. The resolved set is non-empty by construction.
    pub async fn resolve<S: RootsSource>(&self, peer: &S) -> Result<Arc<Vec<PathBuf>>> {
        self.resolved
            .get_or_try_init(|| self.negotiate(peer))
            .await
            .cloned()
    }

    async fn negotiate<S: RootsSource>(&self, peer: &S) -> Result<Arc<Vec<PathBuf>>> {
        if peer.supports_roots().await {
            let roots = peer.list_roots().await?;
            let dirs: Vec<PathBuf> = roots.iter().filter_map(Root::to_path).collect();
            if dirs.is_empty() {
                return Err(Error::EmptyRoots);
            }
            tracing::info!(count = dirs.len(), "resolved roots from client");
            return Ok(Arc::new(dirs));
        }

        match &self.fallback {
            Some(dir) => {
                tracing::info!(dir = %dir.display(), "using --root-directory fallback");
                Ok(Arc::new(vec![dir.clone()]))
            }
            None => Err(Error::NoRoots),
        }
    }
}
