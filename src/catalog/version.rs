use std::future::Future;

use tokio::sync::Mutex;
use tracing::debug;

use crate::error::CatalogError;

/// Version resolution policy for one client instance.
///
/// The applicable catalog version for a request is decided in order:
///
/// 1. a version carried by the request itself is used as-is; it never
///    triggers a latest-version call and never touches the lock;
/// 2. a version already locked on this client (at construction or by a
///    prior call) is reused;
/// 3. otherwise the latest version is resolved once, locked for the rest of
///    the client's lifetime, and used.
///
/// This guarantees at most one latest-version network call per client
/// instance across any number of sequential unversioned requests.
pub struct VersionLock {
    locked: Mutex<Option<u64>>,
}

impl VersionLock {
    /// A lock with no version resolved yet.
    pub fn new() -> Self {
        Self {
            locked: Mutex::new(None),
        }
    }

    /// A lock pre-seeded at construction, as for a client pinned to a
    /// specific catalog version.
    pub fn with_version(version: u64) -> Self {
        Self {
            locked: Mutex::new(Some(version)),
        }
    }

    /// The currently locked version, if any.
    pub async fn locked(&self) -> Option<u64> {
        *self.locked.lock().await
    }

    /// Apply the policy. `fetch_latest` runs only when neither an explicit
    /// nor a locked version is available; its result is locked before being
    /// returned.
    ///
    /// The lock is held across `fetch_latest`, so concurrent unversioned
    /// calls on one client serialize instead of racing the resolution.
    pub async fn resolve<F, Fut>(
        &self,
        explicit: Option<u64>,
        fetch_latest: F,
    ) -> Result<u64, CatalogError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<u64, CatalogError>>,
    {
        if let Some(version) = explicit {
            return Ok(version);
        }

        let mut locked = self.locked.lock().await;
        if let Some(version) = *locked {
            return Ok(version);
        }

        let version = fetch_latest().await?;
        debug!(version, "locked latest catalog version");
        *locked = Some(version);
        Ok(version)
    }
}

impl Default for VersionLock {
    fn default() -> Self {
        Self::new()
    }
}
