//! Session Authority
//!
//! Decides from a raw credential whether the visitor is authenticated and
//! whether they hold admin privileges.

use std::sync::Arc;

use async_trait::async_trait;

use crate::auth::jwt::decode_unverified;
use crate::auth::models::{Resolution, Role, SessionState};
use crate::backend::BackendError;

/// How far a credential is trusted before a session is granted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationMode {
    /// Decode only. Admin privileges are never granted from local claims.
    LocalOnly,
    /// Confirm every credential against the backend's `/protected` endpoint
    Remote,
}

/// Backend answer to a verification request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected,
}

/// Remote session confirmation
#[async_trait]
pub trait SessionVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Verdict, BackendError>;
}

pub struct SessionAuthority {
    mode: VerificationMode,
    verifier: Arc<dyn SessionVerifier>,
}

impl SessionAuthority {
    pub fn new(mode: VerificationMode, verifier: Arc<dyn SessionVerifier>) -> Self {
        Self { mode, verifier }
    }

    /// Resolve a credential into a session.
    ///
    /// An absent credential never reaches the network. In remote mode any
    /// failure, transport errors included, rejects the credential; there is
    /// no retry.
    pub async fn resolve(&self, credential: Option<&str>) -> Resolution {
        let Some(token) = credential.filter(|t| !t.is_empty()) else {
            return Resolution::anonymous();
        };

        match self.mode {
            VerificationMode::LocalOnly => {
                let claims = match decode_unverified(token) {
                    Ok(claims) => Some(claims),
                    Err(e) => {
                        tracing::warn!("[SessionAuthority] {}", e);
                        None
                    }
                };
                Resolution {
                    state: SessionState::authenticated(Role::User),
                    claims,
                    rejected: false,
                }
            }
            VerificationMode::Remote => match self.verifier.verify(token).await {
                Ok(Verdict::Accepted) => {
                    let claims = match decode_unverified(token) {
                        Ok(claims) => Some(claims),
                        Err(e) => {
                            tracing::warn!("[SessionAuthority] Verified token failed to decode: {}", e);
                            None
                        }
                    };
                    let role = match &claims {
                        Some(claims) if claims.admin => Role::Admin,
                        _ => Role::User,
                    };
                    tracing::debug!("[SessionAuthority] Session confirmed as {:?}", role);
                    Resolution {
                        state: SessionState::authenticated(role),
                        claims,
                        rejected: false,
                    }
                }
                Ok(Verdict::Rejected) => {
                    tracing::info!("[SessionAuthority] Backend rejected session token");
                    Resolution::rejected()
                }
                Err(e) => {
                    tracing::warn!("[SessionAuthority] Session verification failed: {}", e);
                    Resolution::rejected()
                }
            },
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::auth::jwt::tests::issue;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Verifier with a fixed answer that counts its calls
    pub(crate) struct FixedVerifier {
        answer: Option<Verdict>,
        pub(crate) calls: AtomicUsize,
    }

    impl FixedVerifier {
        pub(crate) fn accepting() -> Arc<Self> {
            Arc::new(Self { answer: Some(Verdict::Accepted), calls: AtomicUsize::new(0) })
        }

        pub(crate) fn rejecting() -> Arc<Self> {
            Arc::new(Self { answer: Some(Verdict::Rejected), calls: AtomicUsize::new(0) })
        }

        pub(crate) fn unreachable() -> Arc<Self> {
            Arc::new(Self { answer: None, calls: AtomicUsize::new(0) })
        }
    }

    #[async_trait]
    impl SessionVerifier for FixedVerifier {
        async fn verify(&self, _token: &str) -> Result<Verdict, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer
                .ok_or_else(|| BackendError::Reported("connection refused".to_string()))
        }
    }

    pub(crate) fn admin_token() -> String {
        issue(json!({ "user_id": 1, "username": "root", "admin": true, "exp": 1_900_000_000i64 }))
    }

    pub(crate) fn user_token() -> String {
        issue(json!({ "user_id": 2, "username": "clerk", "exp": 1_900_000_000i64 }))
    }

    #[tokio::test]
    async fn absent_credential_skips_network() {
        let verifier = FixedVerifier::accepting();
        let authority = SessionAuthority::new(VerificationMode::Remote, verifier.clone());

        for credential in [None, Some("")] {
            let resolution = authority.resolve(credential).await;
            assert_eq!(resolution.state, SessionState::UNAUTHENTICATED);
            assert!(!resolution.rejected);
        }
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn confirmed_admin_is_admin() {
        let authority = SessionAuthority::new(VerificationMode::Remote, FixedVerifier::accepting());
        let resolution = authority.resolve(Some(&admin_token())).await;
        assert!(resolution.state.is_admin());
        assert_eq!(resolution.claims.unwrap().username, "root");
    }

    #[tokio::test]
    async fn confirmed_user_is_not_admin() {
        let authority = SessionAuthority::new(VerificationMode::Remote, FixedVerifier::accepting());
        let resolution = authority.resolve(Some(&user_token())).await;
        assert!(resolution.state.is_authenticated());
        assert!(!resolution.state.is_admin());
    }

    #[tokio::test]
    async fn confirmed_but_undecodable_token_is_plain_user() {
        let authority = SessionAuthority::new(VerificationMode::Remote, FixedVerifier::accepting());
        let resolution = authority.resolve(Some("opaque-token")).await;
        assert_eq!(resolution.state, SessionState::authenticated(Role::User));
        assert!(resolution.claims.is_none());
    }

    #[tokio::test]
    async fn rejection_and_outage_both_fail_closed() {
        for verifier in [FixedVerifier::rejecting(), FixedVerifier::unreachable()] {
            let authority = SessionAuthority::new(VerificationMode::Remote, verifier.clone());
            let resolution = authority.resolve(Some(&admin_token())).await;
            assert_eq!(resolution.state, SessionState::UNAUTHENTICATED);
            assert!(resolution.rejected);
            assert_eq!(verifier.calls.load(Ordering::SeqCst), 1);
        }
    }

    #[tokio::test]
    async fn local_mode_never_grants_admin() {
        let verifier = FixedVerifier::rejecting();
        let authority = SessionAuthority::new(VerificationMode::LocalOnly, verifier.clone());

        let resolution = authority.resolve(Some(&admin_token())).await;
        assert!(resolution.state.is_authenticated());
        assert!(!resolution.state.is_admin());
        assert!(resolution.claims.unwrap().admin);

        let garbled = authority.resolve(Some("garbled")).await;
        assert!(garbled.state.is_authenticated());
        assert!(garbled.claims.is_none());
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
    }
}
