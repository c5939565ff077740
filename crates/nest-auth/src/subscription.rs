use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, RwLock, Weak};

use nest_types::{AuthEvent, Session};
use tracing::debug;

use crate::error::{AuthError, AuthResult};

/// Callback invoked on every identity change.
pub type AuthCallback = Arc<dyn Fn(AuthEvent, Option<&Session>) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    callbacks: BTreeMap<u64, AuthCallback>,
}

/// Fan-out list of auth subscribers, delivered in registration order.
#[derive(Clone, Default)]
pub(crate) struct Listeners {
    registry: Arc<RwLock<Registry>>,
}

impl Listeners {
    pub(crate) fn add(&self, callback: AuthCallback) -> AuthResult<Subscription> {
        let mut registry = self
            .registry
            .write()
            .map_err(|e| AuthError::LockPoisoned(e.to_string()))?;
        let id = registry.next_id;
        registry.next_id += 1;
        registry.callbacks.insert(id, callback);
        debug!(subscriber = id, "auth subscriber added");
        Ok(Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        })
    }

    /// Deliver `event` to every subscriber.
    ///
    /// Callbacks run after the registry lock is released, so a callback may
    /// subscribe or unsubscribe.
    pub(crate) fn notify(&self, event: AuthEvent, session: Option<&Session>) -> AuthResult<()> {
        let callbacks: Vec<AuthCallback> = self
            .registry
            .read()
            .map_err(|e| AuthError::LockPoisoned(e.to_string()))?
            .callbacks
            .values()
            .cloned()
            .collect();
        debug!(%event, subscribers = callbacks.len(), "notifying auth subscribers");
        for callback in callbacks {
            callback(event, session);
        }
        Ok(())
    }

    pub(crate) fn len(&self) -> usize {
        self.registry
            .read()
            .map(|r| r.callbacks.len())
            .unwrap_or_default()
    }
}

/// Handle returned by a subscription.
///
/// Dropping the handle keeps the callback registered; call
/// [`unsubscribe`](Subscription::unsubscribe) to remove it.
pub struct Subscription {
    id: u64,
    registry: Weak<RwLock<Registry>>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Remove the callback. Returns `false` if it was already gone or the
    /// emulator has been dropped.
    pub fn unsubscribe(self) -> bool {
        let Some(registry) = self.registry.upgrade() else {
            return false;
        };
        let removed = match registry.write() {
            Ok(mut registry) => registry.callbacks.remove(&self.id).is_some(),
            Err(_) => false,
        };
        debug!(subscriber = self.id, removed, "auth subscriber removed");
        removed
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recorder() -> (Arc<Mutex<Vec<AuthEvent>>>, AuthCallback) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback: AuthCallback = Arc::new(move |event, _| sink.lock().unwrap().push(event));
        (seen, callback)
    }

    #[test]
    fn notify_reaches_every_subscriber() {
        let listeners = Listeners::default();
        let (a, cb_a) = recorder();
        let (b, cb_b) = recorder();
        listeners.add(cb_a).unwrap();
        listeners.add(cb_b).unwrap();
        listeners.notify(AuthEvent::SignedOut, None).unwrap();
        assert_eq!(*a.lock().unwrap(), vec![AuthEvent::SignedOut]);
        assert_eq!(*b.lock().unwrap(), vec![AuthEvent::SignedOut]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let listeners = Listeners::default();
        let (seen, callback) = recorder();
        let sub = listeners.add(callback).unwrap();
        assert!(sub.unsubscribe());
        listeners.notify(AuthEvent::SignedIn, None).unwrap();
        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(listeners.len(), 0);
    }

    #[test]
    fn unsubscribe_after_registry_dropped() {
        let listeners = Listeners::default();
        let (_, callback) = recorder();
        let sub = listeners.add(callback).unwrap();
        drop(listeners);
        assert!(!sub.unsubscribe());
    }

    #[test]
    fn callback_may_unsubscribe_itself() {
        let listeners = Listeners::default();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let inner = Arc::clone(&slot);
        let sub = listeners
            .add(Arc::new(move |_, _| {
                if let Some(sub) = inner.lock().unwrap().take() {
                    sub.unsubscribe();
                }
            }))
            .unwrap();
        *slot.lock().unwrap() = Some(sub);
        listeners.notify(AuthEvent::SignedIn, None).unwrap();
        assert_eq!(listeners.len(), 0);
    }

    #[test]
    fn ids_are_unique() {
        let listeners = Listeners::default();
        let (_, cb) = recorder();
        let a = listeners.add(Arc::clone(&cb)).unwrap();
        let b = listeners.add(cb).unwrap();
        assert_ne!(a.id(), b.id());
    }
}
