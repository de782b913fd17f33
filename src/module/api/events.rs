//! Resolution-failure notification channel
//!
//! The host broadcasts on this channel when its default search cannot find a
//! module. Subscribers are tried in subscription order and the first one that
//! returns a module satisfies the request.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use tracing::{debug, trace, warn};

use crate::module::traits::{LoadedModule, ResolverError};

/// Callback invoked on a failed module lookup
///
/// Must return `None` for requests it does not own. May be called from any
/// thread and concurrently with itself.
pub trait ResolveHandler: Send + Sync {
    fn on_resolve(&self, request: &str) -> Option<Arc<LoadedModule>>;
}

impl<F> ResolveHandler for F
where
    F: Fn(&str) -> Option<Arc<LoadedModule>> + Send + Sync,
{
    fn on_resolve(&self, request: &str) -> Option<Arc<LoadedModule>> {
        self(request)
    }
}

/// Identifies one subscription on a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

type Subscriber = (SubscriptionId, Arc<dyn ResolveHandler>);

/// Subscription list for resolution-failure notifications
pub struct ResolveEvents {
    next_id: AtomicU64,
    subscribers: RwLock<Vec<Subscriber>>,
}

impl ResolveEvents {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Process-wide channel shared by every add-in in this process
    pub fn global() -> &'static Arc<ResolveEvents> {
        static GLOBAL: OnceLock<Arc<ResolveEvents>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(ResolveEvents::new()))
    }

    /// Register a handler
    pub fn subscribe(&self, handler: Arc<dyn ResolveHandler>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, handler));
        debug!("Resolve handler {} subscribed", id.0);
        id
    }

    /// Remove a handler
    ///
    /// Fails with `NotSubscribed` if `id` is not currently registered; the list
    /// is left untouched in that case.
    pub fn unsubscribe(&self, id: SubscriptionId) -> Result<(), ResolverError> {
        let mut subscribers = self
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let position = subscribers
            .iter()
            .position(|(sub_id, _)| *sub_id == id)
            .ok_or(ResolverError::NotSubscribed(id.0))?;
        subscribers.remove(position);
        debug!("Resolve handler {} unsubscribed", id.0);
        Ok(())
    }

    pub fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|(sub_id, _)| *sub_id == id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Broadcast a failed lookup
    ///
    /// Handlers run without the list lock held so they may load modules that
    /// themselves trigger nested notifications. A panicking handler is logged
    /// and treated as having declined.
    pub fn dispatch(&self, request: &str) -> Option<Arc<LoadedModule>> {
        let snapshot: Vec<Subscriber> = self
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for (id, handler) in snapshot {
            match panic::catch_unwind(AssertUnwindSafe(|| handler.on_resolve(request))) {
                Ok(Some(module)) => {
                    trace!("Handler {} resolved {}", id.0, request);
                    return Some(module);
                }
                Ok(None) => {}
                Err(_) => warn!("Resolve handler {} panicked on {:?}", id.0, request),
            }
        }
        None
    }
}

impl Default for ResolveEvents {
    fn default() -> Self {
        Self::new()
    }
}
