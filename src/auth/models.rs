//! Session Models
//!
//! Derived session state and the phase machine it is built from.

use serde::{Deserialize, Serialize};

use crate::auth::jwt::SessionClaims;

/// Privilege level of an authenticated visitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

/// Lifecycle phase of a visitor's session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Loading,
    Authenticated(Role),
    Unauthenticated,
}

/// What caused a phase change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Fresh credential supplied through the login flow
    Login,
    /// Credential dropped on operator request
    Logout,
    /// Credential re-checked (locally or against the backend)
    Verification,
}

impl SessionPhase {
    /// Whether moving from `self` to `next` is allowed for the given cause.
    ///
    /// Only a login may authenticate an unauthenticated visitor, and an
    /// authenticated visitor only loses the session through logout or a
    /// failed re-verification. Nothing returns to `Loading`.
    pub fn permits(self, next: SessionPhase, cause: Transition) -> bool {
        use SessionPhase::*;
        match (self, next) {
            (_, Loading) => false,
            (Loading, _) => true,
            (Unauthenticated, Unauthenticated) => true,
            (Unauthenticated, Authenticated(_)) => cause == Transition::Login,
            (Authenticated(_), Authenticated(_)) => cause != Transition::Logout,
            (Authenticated(_), Unauthenticated) => true,
        }
    }
}

/// Flag view of a session phase, as rendered to the dashboard.
///
/// Only constructible from a [`SessionPhase`], so `is_admin` implies
/// `is_authenticated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    is_authenticated: bool,
    is_admin: bool,
    is_loading: bool,
}

impl SessionState {
    pub const LOADING: Self = Self::from_phase(SessionPhase::Loading);
    pub const UNAUTHENTICATED: Self = Self::from_phase(SessionPhase::Unauthenticated);

    pub const fn authenticated(role: Role) -> Self {
        Self::from_phase(SessionPhase::Authenticated(role))
    }

    pub const fn from_phase(phase: SessionPhase) -> Self {
        match phase {
            SessionPhase::Loading => Self {
                is_authenticated: false,
                is_admin: false,
                is_loading: true,
            },
            SessionPhase::Authenticated(role) => Self {
                is_authenticated: true,
                is_admin: matches!(role, Role::Admin),
                is_loading: false,
            },
            SessionPhase::Unauthenticated => Self {
                is_authenticated: false,
                is_admin: false,
                is_loading: false,
            },
        }
    }

    pub const fn phase(&self) -> SessionPhase {
        if self.is_loading {
            SessionPhase::Loading
        } else if !self.is_authenticated {
            SessionPhase::Unauthenticated
        } else if self.is_admin {
            SessionPhase::Authenticated(Role::Admin)
        } else {
            SessionPhase::Authenticated(Role::User)
        }
    }

    pub const fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    pub const fn is_admin(&self) -> bool {
        self.is_admin
    }

    pub const fn is_loading(&self) -> bool {
        self.is_loading
    }
}

/// Outcome of resolving one credential
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub state: SessionState,
    /// Decoded claims, for display only
    pub claims: Option<SessionClaims>,
    /// The credential was refused and must be dropped by its holder
    pub rejected: bool,
}

impl Resolution {
    pub fn anonymous() -> Self {
        Self {
            state: SessionState::UNAUTHENTICATED,
            claims: None,
            rejected: false,
        }
    }

    pub fn rejected() -> Self {
        Self {
            state: SessionState::UNAUTHENTICATED,
            claims: None,
            rejected: true,
        }
    }
}

/// Login request payload
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}
