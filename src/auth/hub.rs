//! Session Hub
//!
//! Registry of live [`SessionStore`]s keyed by credential fingerprint.
//! Requests resolve through the hub so that concurrent checks of the same
//! credential share one generation counter, and so that logout or rejection
//! reaches every subscriber of that credential (other open tabs).

use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};

use dashmap::DashMap;
use futures::Stream;
use ring::digest::{SHA256, digest};
use tokio_stream::wrappers::WatchStream;

use crate::auth::authority::SessionAuthority;
use crate::auth::store::{SessionSnapshot, SessionStore};

type Stores = Arc<DashMap<String, Arc<SessionStore>>>;

pub struct SessionHub {
    authority: Arc<SessionAuthority>,
    stores: Stores,
}

/// Hex SHA-256 of a credential, so raw tokens never key the registry
fn fingerprint(token: &str) -> String {
    digest(&SHA256, token.as_bytes())
        .as_ref()
        .iter()
        .map(|byte| format!("{:02x}", byte))
        .collect()
}

impl SessionHub {
    pub fn new(authority: Arc<SessionAuthority>) -> Self {
        Self {
            authority,
            stores: Arc::new(DashMap::new()),
        }
    }

    fn fresh_store(&self, token: &str) -> Arc<SessionStore> {
        Arc::new(SessionStore::new(
            self.authority.clone(),
            Some(token.to_string()),
        ))
    }

    /// Live store for a credential, with `attach` run while the registry
    /// entry is still locked. A store whose credential was already refused
    /// is replaced, so the credential gets verified again.
    fn with_store<R>(
        &self,
        token: &str,
        attach: impl FnOnce(&Arc<SessionStore>) -> R,
    ) -> (Arc<SessionStore>, R) {
        let mut entry = self
            .stores
            .entry(fingerprint(token))
            .or_insert_with(|| self.fresh_store(token));
        if entry.credential().is_none() {
            *entry = self.fresh_store(token);
        }
        let attached = attach(entry.value());
        (entry.clone(), attached)
    }

    fn store_for(&self, token: &str) -> Arc<SessionStore> {
        self.with_store(token, |_| ()).0
    }

    /// Resolve the credential sent with a request.
    ///
    /// Absent credentials resolve to an anonymous session without touching
    /// the registry or the network.
    pub async fn resolve(&self, credential: Option<&str>) -> SessionSnapshot {
        let Some(token) = credential.filter(|t| !t.is_empty()) else {
            let resolution = self.authority.resolve(None).await;
            return SessionSnapshot {
                generation: 0,
                state: resolution.state,
                claims: resolution.claims,
                rejected: resolution.rejected,
            };
        };

        let key = fingerprint(token);
        let store = self.store_for(token);
        let snapshot = store.refresh().await;
        self.release_if_idle(&key, &store, snapshot.rejected);
        snapshot
    }

    /// Resolve a credential that was just issued by the login flow.
    pub async fn login(&self, token: &str) -> SessionSnapshot {
        let key = fingerprint(token);
        let store = self.store_for(token);
        let snapshot = store.login(token.to_string()).await;
        self.release_if_idle(&key, &store, snapshot.rejected);
        snapshot
    }

    /// End the session for a credential and notify its subscribers.
    pub fn logout(&self, token: &str) {
        if let Some((_, store)) = self.stores.remove(&fingerprint(token)) {
            store.logout();
            tracing::info!(
                "[SessionHub] Logged out session with {} subscriber(s)",
                store.subscriber_count()
            );
        }
    }

    /// Subscribe to state changes of a credential, resolving it first if
    /// nobody is watching it yet.
    ///
    /// The store stays registered while at least one subscription is alive.
    pub async fn subscribe(&self, token: &str) -> SessionSubscription {
        let key = fingerprint(token);
        let (store, rx) = self.with_store(token, |store| store.subscribe());

        let mut initial = store.current();
        if initial.state.is_loading() {
            initial = store.refresh().await;
            if initial.rejected {
                self.release_if_idle(&key, &store, true);
            }
        }

        SessionSubscription {
            events: Some(WatchStream::new(rx)),
            stores: self.stores.clone(),
            key,
            store: Arc::downgrade(&store),
            initial,
        }
    }

    pub fn live_sessions(&self) -> usize {
        self.stores.len()
    }

    fn release_if_idle(&self, key: &str, store: &Arc<SessionStore>, rejected: bool) {
        self.stores.remove_if(key, |_, held| {
            Arc::ptr_eq(held, store) && (rejected || held.subscriber_count() == 0)
        });
    }
}

/// Stream of session snapshots for one credential.
///
/// Yields the current snapshot first, then every change. It ends once the
/// store is gone (logout or rejection). Dropping the last subscription of
/// a credential removes its store from the hub.
pub struct SessionSubscription {
    events: Option<WatchStream<SessionSnapshot>>,
    stores: Stores,
    key: String,
    store: Weak<SessionStore>,
    initial: SessionSnapshot,
}

impl SessionSubscription {
    /// Snapshot the subscription started from
    pub fn initial(&self) -> &SessionSnapshot {
        &self.initial
    }
}

impl Stream for SessionSubscription {
    type Item = SessionSnapshot;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.events.as_mut() {
            Some(events) => Pin::new(events).poll_next(cx),
            None => Poll::Ready(None),
        }
    }
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        // release our receiver before counting the remaining ones
        drop(self.events.take());
        let released = self.stores.remove_if(&self.key, |_, held| {
            std::ptr::eq(Arc::as_ptr(held), self.store.as_ptr()) && held.subscriber_count() == 0
        });
        if released.is_some() {
            tracing::debug!("[SessionHub] Released session after its last subscriber left");
        }
    }
}
