//! Session Store
//!
//! Subscribable session state for one credential. Every change is pushed to
//! subscribers through a `watch` channel, and every operation carries a
//! generation number so that a slow, superseded resolution can never
//! overwrite the outcome of a newer one.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tokio::sync::watch;

use crate::auth::authority::SessionAuthority;
use crate::auth::jwt::SessionClaims;
use crate::auth::models::{Resolution, SessionState, Transition};

/// Published session state, tagged with the operation that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub generation: u64,
    pub state: SessionState,
    pub claims: Option<SessionClaims>,
    /// Set when the last verification refused the credential
    pub rejected: bool,
}

pub struct SessionStore {
    authority: Arc<SessionAuthority>,
    credential: RwLock<Option<String>>,
    generation: AtomicU64,
    tx: watch::Sender<SessionSnapshot>,
}

enum Applied {
    Published(SessionSnapshot),
    Superseded,
    Refused(SessionSnapshot),
}

impl SessionStore {
    pub fn new(authority: Arc<SessionAuthority>, credential: Option<String>) -> Self {
        let (tx, _) = watch::channel(SessionSnapshot {
            generation: 0,
            state: SessionState::LOADING,
            claims: None,
            rejected: false,
        });
        Self {
            authority,
            credential: RwLock::new(credential),
            generation: AtomicU64::new(0),
            tx,
        }
    }

    pub fn current(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn credential(&self) -> Option<String> {
        self.credential.read().clone()
    }

    /// Re-resolve the held credential.
    pub async fn refresh(&self) -> SessionSnapshot {
        let generation = self.next_generation();
        let credential = self.credential();
        let resolution = self.authority.resolve(credential.as_deref()).await;
        self.settle(generation, credential, resolution, Transition::Verification)
            .await
    }

    /// Adopt a freshly issued credential and resolve it.
    pub async fn login(&self, token: String) -> SessionSnapshot {
        let generation = self.next_generation();
        *self.credential.write() = Some(token.clone());
        let resolution = self.authority.resolve(Some(&token)).await;
        self.settle(generation, Some(token), resolution, Transition::Login)
            .await
    }

    /// Drop the credential. Calling it again leaves the same end state.
    pub fn logout(&self) -> SessionSnapshot {
        let generation = self.next_generation();
        *self.credential.write() = None;
        match self.apply(generation, None, Resolution::anonymous(), Transition::Logout) {
            Applied::Published(snapshot) | Applied::Refused(snapshot) => snapshot,
            Applied::Superseded => self.current(),
        }
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Publish a resolution, or wait for the newer operation that superseded it
    async fn settle(
        &self,
        generation: u64,
        credential: Option<String>,
        resolution: Resolution,
        cause: Transition,
    ) -> SessionSnapshot {
        let mut rx = self.tx.subscribe();
        match self.apply(generation, credential, resolution, cause) {
            Applied::Published(snapshot) | Applied::Refused(snapshot) => snapshot,
            Applied::Superseded => {
                tracing::debug!("[SessionStore] Discarding stale resolution #{}", generation);
                let newer = match rx.wait_for(|s| s.generation > generation).await {
                    Ok(snapshot) => snapshot.clone(),
                    Err(_) => self.current(),
                };
                newer
            }
        }
    }

    fn apply(
        &self,
        generation: u64,
        credential: Option<String>,
        resolution: Resolution,
        cause: Transition,
    ) -> Applied {
        let mut outcome = Applied::Superseded;

        self.tx.send_if_modified(|published| {
            if generation != self.generation.load(Ordering::SeqCst)
                || generation <= published.generation
            {
                return false;
            }

            let from = published.state.phase();
            let to = resolution.state.phase();
            if !from.permits(to, cause) {
                tracing::warn!(
                    "[SessionStore] Refusing {:?} -> {:?} on {:?}",
                    from,
                    to,
                    cause
                );
                // keep the state, but advance the generation so waiters wake
                published.generation = generation;
                outcome = Applied::Refused(published.clone());
                return true;
            }

            if resolution.rejected {
                let mut held = self.credential.write();
                if *held == credential {
                    *held = None;
                }
            }

            *published = SessionSnapshot {
                generation,
                state: resolution.state,
                claims: resolution.claims.clone(),
                rejected: resolution.rejected,
            };
            outcome = Applied::Published(published.clone());
            true
        });

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::authority::tests::{FixedVerifier, admin_token, user_token};
    use crate::auth::authority::{SessionVerifier, Verdict, VerificationMode};
    use crate::auth::models::Role;
    use crate::backend::BackendError;
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::Notify;

    fn store_with(verifier: Arc<dyn SessionVerifier>, credential: Option<String>) -> SessionStore {
        let authority = Arc::new(SessionAuthority::new(VerificationMode::Remote, verifier));
        SessionStore::new(authority, credential)
    }

    #[tokio::test]
    async fn starts_loading_then_resolves() {
        let store = store_with(FixedVerifier::accepting(), Some(admin_token()));
        assert!(store.current().state.is_loading());

        let snapshot = store.refresh().await;
        assert_eq!(snapshot.state, SessionState::authenticated(Role::Admin));
        assert_eq!(snapshot.generation, 1);
    }

    #[tokio::test]
    async fn rejection_clears_credential_idempotently() {
        let store = store_with(FixedVerifier::rejecting(), Some(user_token()));

        let first = store.refresh().await;
        assert!(first.rejected);
        assert_eq!(store.credential(), None);

        let second = store.refresh().await;
        assert_eq!(second.state, first.state);
        assert_eq!(store.credential(), None);
    }

    #[tokio::test]
    async fn logout_notifies_subscribers() {
        let store = store_with(FixedVerifier::accepting(), Some(user_token()));
        store.refresh().await;

        let mut rx = store.subscribe();

        store.logout();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().state, SessionState::UNAUTHENTICATED);

        let again = store.logout();
        assert_eq!(again.state, SessionState::UNAUTHENTICATED);
    }

    #[tokio::test]
    async fn only_login_reauthenticates() {
        let store = store_with(FixedVerifier::accepting(), None);
        assert_eq!(store.refresh().await.state, SessionState::UNAUTHENTICATED);

        let snapshot = store.login(user_token()).await;
        assert_eq!(snapshot.state, SessionState::authenticated(Role::User));
        assert_eq!(store.credential(), Some(user_token()));
    }

    /// Rejects the token `stale` only once released; accepts anything else at once
    struct GatedVerifier {
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl SessionVerifier for GatedVerifier {
        async fn verify(&self, token: &str) -> Result<Verdict, BackendError> {
            if token != "stale" {
                return Ok(Verdict::Accepted);
            }
            self.entered.notify_one();
            self.release.notified().await;
            Ok(Verdict::Rejected)
        }
    }

    #[tokio::test]
    async fn stale_rejection_cannot_undo_newer_login() {
        let gated = Arc::new(GatedVerifier {
            entered: Notify::new(),
            release: Notify::new(),
        });
        let store = Arc::new(store_with(gated.clone(), Some("stale".to_string())));

        let slow = {
            let store = store.clone();
            tokio::spawn(async move { store.refresh().await })
        };
        gated.entered.notified().await;

        let fresh = store.login(user_token()).await;
        assert_eq!(fresh.state, SessionState::authenticated(Role::User));
        gated.release.notify_one();

        let settled = slow.await.unwrap();
        assert_eq!(settled, fresh);
        assert_eq!(store.current().state, SessionState::authenticated(Role::User));
        assert_eq!(store.credential(), Some(user_token()));
    }

    #[tokio::test]
    async fn refused_transition_releases_superseded_waiter() {
        let store = Arc::new(store_with(FixedVerifier::accepting(), None));
        assert_eq!(store.refresh().await.state, SessionState::UNAUTHENTICATED);

        let stale = store.next_generation();
        let newer = store.next_generation();
        let waiter = {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .settle(stale, None, Resolution::anonymous(), Transition::Verification)
                    .await
            })
        };

        // a verification may not authenticate an unauthenticated session
        let refused = Resolution {
            state: SessionState::authenticated(Role::User),
            claims: None,
            rejected: false,
        };
        assert!(matches!(
            store.apply(newer, Some(user_token()), refused, Transition::Verification),
            Applied::Refused(_)
        ));

        let settled = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("superseded waiter never woke")
            .unwrap();
        assert_eq!(settled.generation, newer);
        assert_eq!(settled.state, SessionState::UNAUTHENTICATED);
    }
}
